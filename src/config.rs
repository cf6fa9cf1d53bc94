use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use tracing::warn;

use crate::contact::Contact;
use crate::engine::{EngineOptions, DEFAULT_HISTORY_LIMIT};
use crate::providers::PermissionStatus;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "recipient-picker";

#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from, `None` when running on defaults.
    pub config_path: Option<PathBuf>,
    pub show_self: bool,
    pub read_only: bool,
    pub alert_on_startup_denial: bool,
    /// Status reported by the file-backed permission gate.
    pub permission: PermissionStatus,
    /// Whether an access request from an undecided status is granted.
    pub grant_on_request: bool,
    pub self_contact: Option<Contact>,
    pub history: HistoryConfig,
    pub directory: DirectoryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Operation kind to request history for; no history without it.
    pub operation: Option<String>,
    pub limit: usize,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            show_self: self.show_self,
            self_contact: self.self_contact.clone(),
            read_only: self.read_only,
            operation: self.history.operation.clone(),
            history_limit: self.history.limit,
            alert_on_startup_denial: self.alert_on_startup_denial,
        }
    }
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConfigFile {
    show_self: bool,
    read_only: bool,
    alert_on_startup_denial: bool,
    permission: String,
    grant_on_request: bool,
    self_contact: Option<SelfContactFile>,
    history: HistoryFile,
    directory: DirectoryFile,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            show_self: true,
            read_only: false,
            alert_on_startup_denial: false,
            permission: "not_determined".to_string(),
            grant_on_request: true,
            self_contact: None,
            history: HistoryFile::default(),
            directory: DirectoryFile::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SelfContactFile {
    name: String,
    phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HistoryFile {
    operation: Option<String>,
    limit: usize,
    path: Option<PathBuf>,
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self {
            operation: None,
            limit: DEFAULT_HISTORY_LIMIT,
            path: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DirectoryFile {
    path: Option<PathBuf>,
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, or from the default location.
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let default = config_path()?;
            if !default.exists() {
                return parse("", None);
            }
            default
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, Some(path))
}

/// Parse configuration text. Relative paths resolve against the directory
/// of `config_path`.
pub fn parse(raw: &str, config_path: Option<PathBuf>) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).with_context(|| match &config_path {
        Some(path) => format!("failed to parse {} as TOML", path.display()),
        None => "failed to parse configuration as TOML".to_string(),
    })?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;
    from_file(cfg_file, config_path)
}

fn from_file(cfg_file: ConfigFile, config_path: Option<PathBuf>) -> Result<Config> {
    let permission = PermissionStatus::from_str(&cfg_file.permission).ok_or_else(|| {
        anyhow!(
            "invalid permission '{}', expected one of: authorized, not_determined, denied, restricted",
            cfg_file.permission
        )
    })?;

    if cfg_file.history.limit == 0 {
        bail!("history.limit must be at least 1");
    }

    let self_contact = match cfg_file.self_contact {
        Some(file) => {
            if file.phone.trim().is_empty() {
                bail!("self_contact.phone must not be empty");
            }
            Some(Contact::new(file.name, file.phone))
        }
        None => None,
    };

    let operation = cfg_file
        .history
        .operation
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let base = config_path
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);
    let resolve = |path: PathBuf| resolve_path(&path, base.as_deref());

    Ok(Config {
        show_self: cfg_file.show_self,
        read_only: cfg_file.read_only,
        alert_on_startup_denial: cfg_file.alert_on_startup_denial,
        permission,
        grant_on_request: cfg_file.grant_on_request,
        self_contact,
        history: HistoryConfig {
            operation,
            limit: cfg_file.history.limit,
            path: cfg_file.history.path.map(resolve),
        },
        directory: DirectoryConfig {
            path: cfg_file.directory.path.map(resolve),
        },
        config_path,
    })
}

/// Expand ~ to home directory and anchor relative paths at `base`.
fn resolve_path(path: &Path, base: Option<&Path>) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from([
        "show_self",
        "read_only",
        "alert_on_startup_denial",
        "permission",
        "grant_on_request",
        "self_contact",
        "history",
        "directory",
    ]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            warn!("unknown configuration key `{}`", key);
        }
    }

    warn_unknown_section_keys(table.get("self_contact"), "self_contact", &["name", "phone"]);
    warn_unknown_section_keys(table.get("history"), "history", &["operation", "limit", "path"]);
    warn_unknown_section_keys(table.get("directory"), "directory", &["path"]);
}

fn warn_unknown_section_keys(value: Option<&toml::Value>, section: &str, known: &[&str]) {
    let Some(table) = value.and_then(|v| v.as_table()) else {
        return;
    };
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            warn!("unknown configuration key `{}.{}`", section, key);
        }
    }
}
