//! Collaborators the picker engine depends on.
//!
//! This module provides:
//! - `PermissionGate` for directory access status and requests
//! - `DirectoryProvider` and `HistoryProvider` for the two async sources
//! - `AlertRouter` for the access-denied prompt
//! - File-backed implementations in [`file`]

pub mod file;

use anyhow::Result;

use crate::contact::{Contact, HistoryEntry};

/// Directory access status as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Authorized,
    NotDetermined,
    Denied,
    Restricted,
}

impl PermissionStatus {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "authorized" => Some(PermissionStatus::Authorized),
            "notdetermined" => Some(PermissionStatus::NotDetermined),
            "denied" => Some(PermissionStatus::Denied),
            "restricted" => Some(PermissionStatus::Restricted),
            _ => None,
        }
    }

    pub fn is_authorized(self) -> bool {
        self == PermissionStatus::Authorized
    }
}

/// Access to the device directory
#[allow(async_fn_in_trait)]
pub trait PermissionGate {
    fn check_status(&self) -> PermissionStatus;

    /// Ask the user for access. Resolves to whether access was granted.
    async fn request_access(&self) -> bool;
}

/// Source of all directory contacts
#[allow(async_fn_in_trait)]
pub trait DirectoryProvider {
    async fn fetch_all(&self) -> Result<Vec<Contact>>;
}

/// Source of recently used recipients
#[allow(async_fn_in_trait)]
pub trait HistoryProvider {
    /// Most recent transfers of `operation`, newest first, at most `limit`.
    async fn fetch_recent(&self, operation: &str, limit: usize) -> Result<Vec<HistoryEntry>>;
}

pub trait AlertRouter {
    /// Tell the user that access was denied and has to be granted elsewhere.
    fn show_access_denied_prompt(&self);
}
