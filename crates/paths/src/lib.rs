//! Config and data locations.
//!
//! Resolution order for both the config file and the data directory is
//! environment override, then configuration, then the platform default.

use leadflow_runtime_config::{CONFIG_FILE_NAME, LeadflowConfig};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "LEADFLOW_CONFIG";
pub const DATA_DIR_ENV: &str = "LEADFLOW_DATA_DIR";

pub const LEADS_FILE: &str = "leads.csv";
pub const INTERACTIONS_FILE: &str = "seguimientos.csv";
pub const STAGES_FILE: &str = "embudo_etapas.csv";
pub const USERS_FILE: &str = "users.csv";

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("could not determine a home directory for leadflow data")]
    NoHome,
}

/// File locations of every table in one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub root: PathBuf,
    pub leads: PathBuf,
    pub interactions: PathBuf,
    pub stages: PathBuf,
    pub users: PathBuf,
}

impl TablePaths {
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            leads: root.join(LEADS_FILE),
            interactions: root.join(INTERACTIONS_FILE),
            stages: root.join(STAGES_FILE),
            users: root.join(USERS_FILE),
            root,
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs, PathError> {
    directories::ProjectDirs::from("", "", "leadflow").ok_or(PathError::NoHome)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf, PathError> {
    if let Some(path) = env_path(CONFIG_ENV) {
        return Ok(path);
    }
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}

/// Directory holding the CSV tables.
pub fn data_dir(config: &LeadflowConfig) -> Result<PathBuf, PathError> {
    resolve_data_dir(env_path(DATA_DIR_ENV), config)
}

fn resolve_data_dir(
    env_override: Option<PathBuf>,
    config: &LeadflowConfig,
) -> Result<PathBuf, PathError> {
    if let Some(path) = env_override {
        return Ok(path);
    }
    let configured = config.storage.data_dir.trim();
    if !configured.is_empty() {
        return Ok(PathBuf::from(configured));
    }
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Table locations for the resolved data directory.
pub fn table_paths(config: &LeadflowConfig) -> Result<TablePaths, PathError> {
    Ok(TablePaths::in_dir(data_dir(config)?))
}

/// Advisory lock file guarding writes to `table`.
pub fn lock_path(table: &Path) -> PathBuf {
    let mut name = table
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    table.with_file_name(name)
}
