//! Merging of the self entry, recent recipients and the directory into
//! ordered sections.

use std::collections::HashSet;

use crate::contact::{Contact, DirectoryState, HistoryEntry, Section, SourceKind};
use crate::phone;

/// Raw inputs of one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub show_self: bool,
    pub self_contact: Option<&'a Contact>,
    pub history: &'a [Contact],
    pub directory: &'a DirectoryState,
}

/// Build the ordered self → recent → directory sections. Empty sections are
/// never emitted.
pub fn aggregate(sources: Sources<'_>) -> Vec<Section> {
    let mut sections = Vec::with_capacity(3);

    if sources.show_self {
        if let Some(own) = sources.self_contact {
            sections.push(Section::new(SourceKind::Own, vec![own.clone()]));
        }
    }

    if !sources.history.is_empty() {
        sections.push(Section::new(SourceKind::Recent, sources.history.to_vec()));
    }

    let directory = sources.directory.contacts();
    if !directory.is_empty() {
        sections.push(Section::new(SourceKind::Directory, directory.to_vec()));
    }

    sections
}

/// Resolve history entries against the directory and drop repeats.
///
/// An entry whose phone digits equal a directory contact's becomes that
/// contact; otherwise it stays a synthetic contact without avatar. Only the
/// first occurrence of each contact is kept.
pub fn merge_history(entries: &[HistoryEntry], directory: &[Contact]) -> Vec<Contact> {
    let mut seen: HashSet<Contact> = HashSet::new();
    let mut merged = Vec::with_capacity(entries.len());

    for entry in entries {
        let contact = resolve_entry(entry, directory);
        if seen.insert(contact.clone()) {
            merged.push(contact);
        }
    }

    merged
}

fn resolve_entry(entry: &HistoryEntry, directory: &[Contact]) -> Contact {
    directory
        .iter()
        .find(|contact| phone::phones_match(&contact.phone, &entry.phone))
        .cloned()
        .unwrap_or_else(|| Contact::new(entry.name.clone().unwrap_or_default(), entry.phone.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sections: &[Section]) -> Vec<SourceKind> {
        sections.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_sections_are_ordered_and_empty_ones_dropped() {
        let own = Contact::new("Alice", "+1 650-253-0000");
        let history = vec![Contact::new("Bob", "+44 20 7946 0958")];
        let directory = DirectoryState::Available(vec![Contact::new("Carl", "+1 (555) 000-1111")]);

        let sections = aggregate(Sources {
            show_self: true,
            self_contact: Some(&own),
            history: &history,
            directory: &directory,
        });
        assert_eq!(
            kinds(&sections),
            vec![SourceKind::Own, SourceKind::Recent, SourceKind::Directory]
        );
        assert_eq!(sections[0].rows, vec![own.clone()]);

        let sections = aggregate(Sources {
            show_self: false,
            self_contact: Some(&own),
            history: &[],
            directory: &DirectoryState::Available(Vec::new()),
        });
        assert!(sections.is_empty());
    }

    #[test]
    fn test_unresolved_directory_has_no_section() {
        let own = Contact::new("Alice", "+1 650-253-0000");
        let history = vec![Contact::new("Bob", "+44 20 7946 0958")];

        for state in [DirectoryState::Unknown, DirectoryState::Unavailable] {
            let sections = aggregate(Sources {
                show_self: true,
                self_contact: Some(&own),
                history: &history,
                directory: &state,
            });
            assert_eq!(kinds(&sections), vec![SourceKind::Own, SourceKind::Recent]);
        }
    }

    #[test]
    fn test_history_keeps_first_occurrence_in_order() {
        let entries = vec![
            HistoryEntry::new(Some("A"), "+1 111"),
            HistoryEntry::new(Some("B"), "+1 222"),
            HistoryEntry::new(Some("A"), "+1 111"),
            HistoryEntry::new(Some("C"), "+1 333"),
        ];

        let merged = merge_history(&entries, &[]);
        let names: Vec<_> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_history_resolves_to_directory_contact_by_digits() {
        let carl = Contact::new("Carl", "+1 (555) 000-1111");
        let entries = vec![
            HistoryEntry::new(None, "15550001111"),
            HistoryEntry::new(Some("Carl L."), "+1 555 000 1111"),
            HistoryEntry::new(None, "+7 916 123-45-67"),
        ];

        let merged = merge_history(&entries, &[carl.clone()]);
        // Both spellings of Carl's number collapse onto the directory entry
        assert_eq!(merged, vec![carl, Contact::new("", "+7 916 123-45-67")]);
        assert!(merged[1].avatar.is_none());
    }
}
