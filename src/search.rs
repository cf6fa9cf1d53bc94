use std::collections::HashSet;

use crate::contact::{Contact, Section};
use crate::phone;

/// Search text split into its name and phone keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Upper-cased text without "+" signs.
    pub name_key: String,
    /// Digits of the text.
    pub digits: String,
}

impl Query {
    /// An empty key never matches, so "xyz" does not match every phone.
    pub fn matches(&self, contact: &Contact) -> bool {
        contains_key(&contact.name.to_uppercase(), &self.name_key)
            || contains_key(&phone::digits_only(&contact.phone), &self.digits)
    }
}

fn contains_key(haystack: &str, key: &str) -> bool {
    !key.is_empty() && haystack.contains(key)
}

/// Returns `None` for empty search text.
pub fn normalize_query(query: &str) -> Option<Query> {
    if query.is_empty() {
        return None;
    }
    let name_key = query.replace('+', "").to_uppercase();
    let digits = phone::digits_only(&name_key);
    Some(Query { name_key, digits })
}

/// Filter aggregated sections against the search text.
///
/// With empty text every contact is kept once, in the earliest section that
/// lists it. Otherwise each section keeps the contacts matching the query.
/// Sections left without rows are dropped.
pub fn filter(sections: &[Section], query: &str) -> Vec<Section> {
    match normalize_query(query) {
        Some(query) => retain_sections(sections, |contact| query.matches(contact)),
        None => {
            let mut seen: HashSet<&Contact> = HashSet::new();
            retain_sections(sections, |contact| seen.insert(contact))
        }
    }
}

fn retain_sections<'a>(
    sections: &'a [Section],
    mut keep: impl FnMut(&'a Contact) -> bool,
) -> Vec<Section> {
    sections
        .iter()
        .filter_map(|section| {
            let rows: Vec<Contact> = section
                .rows
                .iter()
                .filter(|contact| keep(*contact))
                .cloned()
                .collect();
            (!rows.is_empty()).then(|| Section::new(section.kind, rows))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::SourceKind;

    fn sample() -> Vec<Section> {
        let alice = Contact::new("Alice", "+1 650-253-0000");
        let bob = Contact::new("Bob", "+44 20 7946 0958");
        let carl = Contact::new("Carl", "+1 (555) 000-1111");
        vec![
            Section::new(SourceKind::Own, vec![alice.clone()]),
            Section::new(SourceKind::Recent, vec![bob.clone(), carl.clone()]),
            Section::new(SourceKind::Directory, vec![alice, carl, bob]),
        ]
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query(""), None);
        assert_eq!(
            normalize_query("+1 ali"),
            Some(Query {
                name_key: "1 ALI".to_string(),
                digits: "1".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_query_deduplicates_across_sections() {
        let filtered = filter(&sample(), "");

        // Directory only repeated earlier contacts, so it disappears
        assert_eq!(filtered.len(), 2);
        let mut seen = HashSet::new();
        for section in &filtered {
            for contact in &section.rows {
                assert!(seen.insert(contact.clone()), "{:?} listed twice", contact);
            }
        }
    }

    #[test]
    fn test_query_matches_name_or_digits() {
        let filtered = filter(&sample(), "555");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].kind, SourceKind::Recent);
        assert_eq!(filtered[0].rows[0].name, "Carl");
        assert_eq!(filtered[1].kind, SourceKind::Directory);
        assert_eq!(filtered[1].rows[0].name, "Carl");

        let filtered = filter(&sample(), "bo");
        let names: Vec<_> = filtered
            .iter()
            .flat_map(|s| s.rows.iter().map(|c| c.name.as_str()))
            .collect();
        assert_eq!(names, vec!["Bob", "Bob"]);
    }

    #[test]
    fn test_query_without_match_drops_everything() {
        assert!(filter(&sample(), "xyz").is_empty());
    }

    #[test]
    fn test_plus_is_ignored_for_matching() {
        let filtered = filter(&sample(), "+44");
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|s| s.rows.iter().all(|c| c.name == "Bob")));
    }

    #[test]
    fn test_substring_property_holds_for_every_contact() {
        let sections = sample();
        for query in ["a", "AL", "0", "+1", "7946", "zz", "l 6"] {
            let filtered = filter(&sections, query);
            let upper = query.replace('+', "").to_uppercase();
            let digits = phone::digits_only(query);
            for (index, section) in sections.iter().enumerate() {
                for contact in &section.rows {
                    let expected = (!upper.is_empty() && contact.name.to_uppercase().contains(&upper))
                        || (!digits.is_empty()
                            && phone::digits_only(&contact.phone).contains(&digits));
                    let kept = filtered
                        .iter()
                        .filter(|s| s.kind == sections[index].kind)
                        .any(|s| s.rows.contains(contact));
                    assert_eq!(kept, expected, "query {:?} contact {:?}", query, contact);
                }
            }
        }
    }
}
