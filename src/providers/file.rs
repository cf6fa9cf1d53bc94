//! Collaborators backed by local JSON files and configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::contact::{Avatar, Contact, HistoryEntry};
use crate::providers::{AlertRouter, DirectoryProvider, HistoryProvider, PermissionGate, PermissionStatus};

#[derive(Debug, Deserialize)]
struct ContactRecord {
    name: String,
    phone: String,
    #[serde(default)]
    avatar: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    #[serde(default)]
    name: Option<String>,
    phone: String,
    operation: String,
}

/// Directory read from a JSON array of `{name, phone, avatar?}` objects.
///
/// Without a path the directory is simply empty.
#[derive(Debug, Clone)]
pub struct FileDirectory {
    path: Option<PathBuf>,
}

impl FileDirectory {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl DirectoryProvider for FileDirectory {
    async fn fetch_all(&self) -> Result<Vec<Contact>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        let records: Vec<ContactRecord> = read_json(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut contacts = Vec::with_capacity(records.len());
        for record in records {
            let mut contact = Contact::new(record.name, record.phone);
            if let Some(avatar_path) = record.avatar {
                let avatar_path = base.join(avatar_path);
                match load_avatar(&avatar_path) {
                    Ok(avatar) => contact = contact.with_avatar(Arc::new(avatar)),
                    Err(err) => warn!("skipping avatar for {}: {:#}", contact.name, err),
                }
            }
            contacts.push(contact);
        }

        debug!(count = contacts.len(), path = %path.display(), "read directory");
        Ok(contacts)
    }
}

/// Transfer history read from a JSON array of `{name?, phone, operation}`
/// objects, newest first.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: Option<PathBuf>,
}

impl FileHistory {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl HistoryProvider for FileHistory {
    async fn fetch_recent(&self, operation: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        let records: Vec<HistoryRecord> = read_json(path)?;
        Ok(records
            .into_iter()
            .filter(|record| record.operation == operation)
            .take(limit)
            .map(|record| HistoryEntry {
                name: record.name,
                phone: record.phone,
            })
            .collect())
    }
}

/// Permission gate answering from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissionGate {
    status: PermissionStatus,
    grant_on_request: bool,
}

impl StaticPermissionGate {
    pub fn new(status: PermissionStatus, grant_on_request: bool) -> Self {
        Self {
            status,
            grant_on_request,
        }
    }
}

impl PermissionGate for StaticPermissionGate {
    fn check_status(&self) -> PermissionStatus {
        self.status
    }

    async fn request_access(&self) -> bool {
        // Only an undecided status can still be granted.
        self.grant_on_request && self.status == PermissionStatus::NotDetermined
    }
}

/// Reports the access-denied prompt on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrAlerts;

impl AlertRouter for StderrAlerts {
    fn show_access_denied_prompt(&self) {
        warn!("directory access denied");
        eprintln!("Contacts access is denied. Grant access in the system settings to search the directory.");
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {} as JSON", path.display()))
}

fn load_avatar(path: &Path) -> Result<Avatar> {
    let bytes = fs::read(path).with_context(|| format!("failed to read avatar {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    };
    Ok(Avatar {
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_directory_reads_contacts_and_avatars() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("carl.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let path = dir.path().join("contacts.json");
        fs::write(
            &path,
            r#"[
                {"name": "Carl", "phone": "+1 (555) 000-1111", "avatar": "carl.png"},
                {"name": "Dana", "phone": "+44 20 7946 0958", "avatar": "missing.png"}
            ]"#,
        )
        .unwrap();

        let contacts = FileDirectory::new(Some(path)).fetch_all().await.unwrap();
        assert_eq!(contacts.len(), 2);
        let avatar = contacts[0].avatar.as_ref().expect("avatar loaded");
        assert_eq!(avatar.mime, "image/png");
        // Unreadable avatars are skipped, not fatal
        assert!(contacts[1].avatar.is_none());
    }

    #[tokio::test]
    async fn test_directory_without_path_is_empty() {
        assert!(FileDirectory::new(None).fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_reports_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.json");
        fs::write(&path, "not json").unwrap();
        let err = FileDirectory::new(Some(path)).fetch_all().await.unwrap_err();
        assert!(format!("{:#}", err).contains("as JSON"));
    }

    #[tokio::test]
    async fn test_history_filters_by_operation_and_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[
                {"name": "Bob", "phone": "+44 20 7946 0958", "operation": "transfer"},
                {"phone": "+7 916 123-45-67", "operation": "topup"},
                {"phone": "15550001111", "operation": "transfer"},
                {"name": "Eve", "phone": "+1 650-253-0000", "operation": "transfer"}
            ]"#,
        )
        .unwrap();

        let entries = FileHistory::new(Some(path)).fetch_recent("transfer", 2).await.unwrap();
        assert_eq!(
            entries,
            vec![
                HistoryEntry::new(Some("Bob"), "+44 20 7946 0958"),
                HistoryEntry::new(None, "15550001111"),
            ]
        );
    }

    #[tokio::test]
    async fn test_static_gate_only_grants_undecided() {
        let gate = StaticPermissionGate::new(PermissionStatus::NotDetermined, true);
        assert!(gate.request_access().await);
        let gate = StaticPermissionGate::new(PermissionStatus::Denied, true);
        assert!(!gate.request_access().await);
    }
}
