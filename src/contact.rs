//! Contact data model shared by every stage of the picker.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Encoded avatar image. Contacts hold it behind a shared handle and compare
/// it by identity, never by content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// A transfer recipient.
#[derive(Clone)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub avatar: Option<Arc<Avatar>>,
}

impl Contact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: Arc<Avatar>) -> Self {
        self.avatar = Some(avatar);
        self
    }

    fn avatar_ptr(&self) -> Option<*const Avatar> {
        self.avatar.as_ref().map(Arc::as_ptr)
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.phone == other.phone
            && self.avatar_ptr() == other.avatar_ptr()
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.phone.hash(state);
        self.avatar_ptr().map(|ptr| ptr as usize).hash(state);
    }
}

impl fmt::Debug for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contact")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("avatar", &self.avatar_ptr())
            .finish()
    }
}

/// Where the rows of a section came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The account owner.
    Own,
    /// Recently used recipients.
    Recent,
    /// The device directory.
    Directory,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Own => "self",
            SourceKind::Recent => "recent",
            SourceKind::Directory => "directory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub rows: Vec<Contact>,
    pub kind: SourceKind,
}

impl Section {
    pub fn new(kind: SourceKind, rows: Vec<Contact>) -> Self {
        Self { rows, kind }
    }
}

/// Resolution state of the device directory.
///
/// `Unknown` (never fetched, or a fetch is outstanding) and
/// `Available(vec![])` (fetched, nothing there) are different states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DirectoryState {
    #[default]
    Unknown,
    Unavailable,
    Available(Vec<Contact>),
}

impl DirectoryState {
    pub fn contacts(&self) -> &[Contact] {
        match self {
            DirectoryState::Available(rows) => rows,
            DirectoryState::Unknown | DirectoryState::Unavailable => &[],
        }
    }
}

/// A recent transfer as reported by the history provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub name: Option<String>,
    pub phone: String,
}

impl HistoryEntry {
    pub fn new(name: Option<&str>, phone: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            phone: phone.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avatar() -> Arc<Avatar> {
        Arc::new(Avatar {
            mime: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        })
    }

    #[test]
    fn test_equality_uses_avatar_identity() {
        let shared = avatar();
        let a = Contact::new("Alice", "+1 650-253-0000").with_avatar(shared.clone());
        let b = Contact::new("Alice", "+1 650-253-0000").with_avatar(shared);
        let c = Contact::new("Alice", "+1 650-253-0000").with_avatar(avatar());

        assert_eq!(a, b);
        // Same bytes, different handle
        assert_ne!(a, c);
        assert_ne!(a, Contact::new("Alice", "+1 650-253-0000"));
    }

    #[test]
    fn test_directory_state_distinguishes_unknown_from_empty() {
        assert_ne!(DirectoryState::Unknown, DirectoryState::Available(Vec::new()));
        assert!(DirectoryState::Unavailable.contacts().is_empty());
    }
}
