use thiserror::Error;

/// Misuse of the picker engine by its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("no row at section {section}, row {row}")]
    NoSuchRow { section: usize, row: usize },
    #[error("picker is read-only")]
    ReadOnly,
    #[error("unknown subscription {0}")]
    UnknownSubscription(u64),
}
