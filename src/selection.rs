//! Currently selected recipient.

use crate::contact::Contact;
use crate::phone::NormalizedPhone;

/// Section and row index within the rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub section: usize,
    pub row: usize,
}

impl Position {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRef {
    pub contact: Contact,
    /// `None` for a number typed into the search field.
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    current: Option<SelectionRef>,
}

impl SelectionState {
    pub fn current(&self) -> Option<&SelectionRef> {
        self.current.as_ref()
    }

    pub fn position(&self) -> Option<Position> {
        self.current.as_ref().and_then(|selection| selection.position)
    }

    pub fn select_row(&mut self, contact: Contact, position: Position) {
        self.current = Some(SelectionRef {
            contact,
            position: Some(position),
        });
    }

    /// Select a contact that has no row, e.g. the "not found" entry.
    pub fn select_unlisted(&mut self, contact: Contact) {
        self.current = Some(SelectionRef {
            contact,
            position: None,
        });
    }

    /// Track a new search text. Any previous row highlight is dropped; a
    /// typed number with digits becomes a synthetic selection.
    pub fn text_changed(&mut self, phone: &NormalizedPhone) {
        self.current = synthetic_contact(phone).map(|contact| SelectionRef {
            contact,
            position: None,
        });
    }
}

/// Contact for a number typed into the search field: named after the
/// detected country, without avatar. `None` when the text has no digits.
pub fn synthetic_contact(phone: &NormalizedPhone) -> Option<Contact> {
    if phone.digits_only.is_empty() {
        return None;
    }
    Some(Contact::new(
        phone.country_name.clone().unwrap_or_default(),
        phone.display_text.clone(),
    ))
}
