//! Shared runtime configuration types.
//!
//! The CLI reads and writes `leadflow.toml` using these types. Path
//! resolution lives in `leadflow-paths`; storage behaviour lives in
//! `leadflow-local-store`.

use leadflow_core::catalog::{
    self, Catalog, DEFAULT_CHANNELS, DEFAULT_COURSES, DEFAULT_GENDERS, DEFAULT_MESSAGE_STATUSES,
};
use leadflow_core::interaction::DEFAULT_MESSAGE_KIND;
use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "leadflow.toml";

/// Top-level configuration (persisted as `leadflow.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeadflowConfig {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub follow_up: FollowUpSettings,
}

impl LeadflowConfig {
    pub fn catalog(&self) -> Catalog {
        Catalog {
            courses: self.catalog.courses.clone(),
            channels: self.catalog.channels.clone(),
            genders: self.catalog.genders.clone(),
            message_statuses: self.catalog.message_statuses.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the CSV tables. Empty means the platform default.
    #[serde(default)]
    pub data_dir: String,
    /// How long a writer waits for the advisory lock before writing anyway.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    /// Prefix mixed into password hashes. Empty keeps plain SHA-256 hashes valid.
    #[serde(default)]
    pub password_salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_courses")]
    pub courses: Vec<String>,
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    #[serde(default = "default_genders")]
    pub genders: Vec<String>,
    #[serde(default = "default_message_statuses")]
    pub message_statuses: Vec<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            courses: default_courses(),
            channels: default_channels(),
            genders: default_genders(),
            message_statuses: default_message_statuses(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpSettings {
    #[serde(default = "default_follow_up_channel")]
    pub default_channel: String,
    #[serde(default = "default_message_kind")]
    pub message_kind: String,
}

impl Default for FollowUpSettings {
    fn default() -> Self {
        Self {
            default_channel: default_follow_up_channel(),
            message_kind: default_message_kind(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_lock_timeout_ms() -> u64 {
    2_000
}
fn default_courses() -> Vec<String> {
    catalog::to_owned(DEFAULT_COURSES)
}
fn default_channels() -> Vec<String> {
    catalog::to_owned(DEFAULT_CHANNELS)
}
fn default_genders() -> Vec<String> {
    catalog::to_owned(DEFAULT_GENDERS)
}
fn default_message_statuses() -> Vec<String> {
    catalog::to_owned(DEFAULT_MESSAGE_STATUSES)
}
fn default_follow_up_channel() -> String {
    "WhatsApp".to_string()
}
fn default_message_kind() -> String {
    DEFAULT_MESSAGE_KIND.to_string()
}

/// Apply compatibility fallbacks after loading raw TOML.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut LeadflowConfig) -> bool {
    let mut changed = false;

    let lists = [
        (&mut config.catalog.courses, default_courses as fn() -> Vec<String>),
        (&mut config.catalog.channels, default_channels),
        (&mut config.catalog.genders, default_genders),
        (&mut config.catalog.message_statuses, default_message_statuses),
    ];
    for (list, default) in lists {
        list.retain(|value| !value.trim().is_empty());
        if list.is_empty() {
            *list = default();
            changed = true;
        }
    }

    if config.follow_up.message_kind.trim().is_empty() {
        config.follow_up.message_kind = default_message_kind();
        changed = true;
    }

    if config.storage.lock_timeout_ms == 0 {
        config.storage.lock_timeout_ms = default_lock_timeout_ms();
        changed = true;
    }

    changed
}
