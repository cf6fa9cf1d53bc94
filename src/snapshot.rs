//! Immutable view model handed to renderers.

use crate::contact::{Contact, Section, SourceKind};
use crate::fold::FoldState;
use crate::selection::{Position, SelectionRef};

/// Badge shown next to a contact row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// The chosen row while the picker is folded.
    Collapsed,
    /// Row of the recent recipients section.
    Recent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub contact: Contact,
    pub is_self: bool,
    pub status: Option<RowStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSection {
    Contacts {
        kind: SourceKind,
        rows: Vec<Row>,
    },
    /// Nothing matched the search text. Selecting it picks the typed number.
    NotFound {
        /// Directory access is granted, so the miss is meaningful.
        detailed: bool,
        query: String,
        country_name: Option<String>,
    },
    /// Directory access is missing; selecting it asks for permission.
    Access,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Style {
    #[default]
    Usual,
    /// No search field and no row actions.
    Fixed,
}

/// Everything a renderer needs to draw the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub selection: Option<SelectionRef>,
    pub sections: Vec<RenderedSection>,
    pub search_text: String,
    pub country_name: Option<String>,
    pub fold: FoldState,
    /// Transition the renderer should perform and then confirm.
    pub notify_state: Option<FoldState>,
    pub style: Style,
}

impl Snapshot {
    pub fn contact_at(&self, position: Position) -> Option<&Contact> {
        match self.sections.get(position.section)? {
            RenderedSection::Contacts { rows, .. } => rows.get(position.row).map(|row| &row.contact),
            RenderedSection::NotFound { .. } | RenderedSection::Access => None,
        }
    }

    pub fn contact_kinds(&self) -> Vec<SourceKind> {
        self.sections
            .iter()
            .filter_map(|section| match section {
                RenderedSection::Contacts { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn has_not_found(&self) -> bool {
        self.sections
            .iter()
            .any(|section| matches!(section, RenderedSection::NotFound { .. }))
    }

    pub fn has_access_request(&self) -> bool {
        self.sections
            .iter()
            .any(|section| matches!(section, RenderedSection::Access))
    }
}

pub(crate) struct RenderContext<'a> {
    pub self_contact: Option<&'a Contact>,
    pub selected: Option<Position>,
    pub fold: FoldState,
    pub read_only: bool,
    pub directory_available: bool,
    pub search_text: &'a str,
    pub country_name: Option<&'a str>,
}

/// Turn filtered sections into rendered ones, appending the "not found"
/// and "grant access" entries when they apply.
pub(crate) fn render_sections(filtered: &[Section], ctx: &RenderContext<'_>) -> Vec<RenderedSection> {
    let mut sections: Vec<RenderedSection> = filtered
        .iter()
        .enumerate()
        .map(|(section_index, section)| RenderedSection::Contacts {
            kind: section.kind,
            rows: section
                .rows
                .iter()
                .enumerate()
                .map(|(row_index, contact)| {
                    render_row(contact, section.kind, Position::new(section_index, row_index), ctx)
                })
                .collect(),
        })
        .collect();

    if filtered.is_empty() {
        sections.push(RenderedSection::NotFound {
            detailed: ctx.directory_available,
            query: ctx.search_text.to_string(),
            country_name: ctx.country_name.map(str::to_string),
        });
    }
    if !ctx.directory_available {
        sections.push(RenderedSection::Access);
    }
    sections
}

fn render_row(contact: &Contact, kind: SourceKind, position: Position, ctx: &RenderContext<'_>) -> Row {
    let status = if ctx.read_only {
        None
    } else if ctx.fold == FoldState::Collapsed && ctx.selected == Some(position) {
        Some(RowStatus::Collapsed)
    } else if kind == SourceKind::Recent {
        Some(RowStatus::Recent)
    } else {
        None
    };

    Row {
        contact: contact.clone(),
        is_self: ctx.self_contact == Some(contact),
        status,
    }
}

/// Fixed presentation of one already chosen contact.
pub fn single_contact(contact: &Contact, self_contact: Option<&Contact>) -> Snapshot {
    let is_self = self_contact == Some(contact);
    let kind = if is_self {
        SourceKind::Own
    } else {
        SourceKind::Directory
    };

    Snapshot {
        selection: Some(SelectionRef {
            contact: contact.clone(),
            position: Some(Position::new(0, 0)),
        }),
        sections: vec![RenderedSection::Contacts {
            kind,
            rows: vec![Row {
                contact: contact.clone(),
                is_self,
                status: None,
            }],
        }],
        search_text: String::new(),
        country_name: None,
        fold: FoldState::Collapsed,
        notify_state: None,
        style: Style::Fixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(own: Option<&'a Contact>) -> RenderContext<'a> {
        RenderContext {
            self_contact: own,
            selected: None,
            fold: FoldState::Collapsed,
            read_only: false,
            directory_available: true,
            search_text: "",
            country_name: None,
        }
    }

    #[test]
    fn test_row_status() {
        let own = Contact::new("Alice", "+1 650-253-0000");
        let bob = Contact::new("Bob", "+44 20 7946 0958");
        let filtered = vec![
            Section::new(SourceKind::Own, vec![own.clone()]),
            Section::new(SourceKind::Recent, vec![bob.clone()]),
        ];

        let mut ctx = context(Some(&own));
        ctx.selected = Some(Position::new(1, 0));
        let sections = render_sections(&filtered, &ctx);
        let RenderedSection::Contacts { rows, .. } = &sections[0] else {
            panic!("expected contacts");
        };
        assert!(rows[0].is_self);
        assert_eq!(rows[0].status, None);
        let RenderedSection::Contacts { rows, .. } = &sections[1] else {
            panic!("expected contacts");
        };
        assert_eq!(rows[0].status, Some(RowStatus::Collapsed));

        ctx.fold = FoldState::Expanded;
        let sections = render_sections(&filtered, &ctx);
        let RenderedSection::Contacts { rows, .. } = &sections[1] else {
            panic!("expected contacts");
        };
        assert_eq!(rows[0].status, Some(RowStatus::Recent));

        ctx.read_only = true;
        let sections = render_sections(&filtered, &ctx);
        let RenderedSection::Contacts { rows, .. } = &sections[1] else {
            panic!("expected contacts");
        };
        assert_eq!(rows[0].status, None);
    }

    #[test]
    fn test_pseudo_sections() {
        let mut ctx = context(None);
        ctx.search_text = "xyz";
        let sections = render_sections(&[], &ctx);
        assert_eq!(
            sections,
            vec![RenderedSection::NotFound {
                detailed: true,
                query: "xyz".to_string(),
                country_name: None,
            }]
        );

        ctx.directory_available = false;
        let sections = render_sections(&[], &ctx);
        assert_eq!(sections.len(), 2);
        assert!(matches!(sections[0], RenderedSection::NotFound { detailed: false, .. }));
        assert_eq!(sections[1], RenderedSection::Access);
    }

    #[test]
    fn test_single_contact_is_fixed() {
        let own = Contact::new("Alice", "+1 650-253-0000");
        let snapshot = single_contact(&own, Some(&own));
        assert_eq!(snapshot.style, Style::Fixed);
        assert_eq!(snapshot.contact_kinds(), vec![SourceKind::Own]);
        assert_eq!(snapshot.contact_at(Position::new(0, 0)), Some(&own));
        assert_eq!(snapshot.selection.and_then(|s| s.position), Some(Position::new(0, 0)));
    }
}
