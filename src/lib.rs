//! Recipient picker core.
//!
//! Merges the account owner, recent recipients and the device directory
//! into one searchable list, normalizes typed phone numbers, and publishes
//! immutable [`Snapshot`]s to renderers as the state changes.

pub mod aggregate;
pub mod config;
pub mod contact;
pub mod engine;
pub mod error;
pub mod fold;
pub mod phone;
pub mod providers;
pub mod runtime;
pub mod search;
pub mod selection;
pub mod snapshot;

pub use contact::{Avatar, Contact, DirectoryState, HistoryEntry, Section, SourceKind};
pub use engine::{Command, EngineOptions, SelectorEngine, SelectorObserver, SubscriptionId};
pub use error::SelectorError;
pub use fold::FoldState;
pub use phone::NormalizedPhone;
pub use runtime::{Collaborators, Input, SelectorRuntime};
pub use selection::{Position, SelectionRef};
pub use snapshot::{RenderedSection, Row, RowStatus, Snapshot, Style};
