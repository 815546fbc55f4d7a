use anyhow::{Context, Result};
use leadflow_runtime_config::{LeadflowConfig, apply_compat_fallbacks};
use std::path::{Path, PathBuf};

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    leadflow_paths::config_path().context("Could not determine config location")
}

fn read_config(path: &Path) -> Result<LeadflowConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let mut config: LeadflowConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    if apply_compat_fallbacks(&mut config) {
        tracing::debug!(path = %path.display(), "filled empty config values with defaults");
    }
    Ok(config)
}

/// Load config from disk, returning defaults if not found.
pub fn load_config() -> Result<LeadflowConfig> {
    let path = config_path()?;
    if path.exists() {
        read_config(&path)
    } else {
        Ok(LeadflowConfig::default())
    }
}

pub fn save_config(config: &LeadflowConfig) -> Result<PathBuf> {
    let path = config_path()?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config dir at {}", dir.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(path)
}

/// Print the effective config.
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let path = config_path()?;
    let data_dir = leadflow_paths::data_dir(&config).context("Could not determine data dir")?;

    println!("Config file: {}", path.display());
    println!("Data dir:    {}", data_dir.display());
    println!();
    println!("[storage]");
    println!(
        "  data_dir        = {}",
        if config.storage.data_dir.is_empty() {
            "(platform default)"
        } else {
            config.storage.data_dir.as_str()
        }
    );
    println!("  lock_timeout_ms = {}", config.storage.lock_timeout_ms);
    println!();
    println!("[auth]");
    println!(
        "  password_salt = {}",
        if config.auth.password_salt.is_empty() {
            "(not set)"
        } else {
            "(set)"
        }
    );
    println!();
    println!("[catalog]");
    println!("  courses          = {}", config.catalog.courses.join(", "));
    println!("  channels         = {}", config.catalog.channels.join(", "));
    println!("  genders          = {}", config.catalog.genders.join(", "));
    println!("  message_statuses = {}", config.catalog.message_statuses.join(", "));
    println!();
    println!("[follow_up]");
    println!("  default_channel = {}", config.follow_up.default_channel);
    println!("  message_kind    = {}", config.follow_up.message_kind);
    Ok(())
}

/// Update config with provided values.
pub fn set_config(
    data_dir: Option<String>,
    salt: Option<String>,
    lock_timeout_ms: Option<u64>,
) -> Result<()> {
    let mut config = load_config()?;

    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(salt) = salt {
        config.auth.password_salt = salt;
    }
    if let Some(timeout) = lock_timeout_ms {
        config.storage.lock_timeout_ms = timeout;
    }

    save_config(&config)?;
    println!("Configuration updated.");
    show_config()
}
