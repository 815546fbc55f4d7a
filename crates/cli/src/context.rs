use crate::config::load_config;
use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use leadflow_core::{Catalog, Operator, Stage, normalize_stage};
use leadflow_local_store::{AuthError, LocalStore, SessionGuard};
use leadflow_paths::TablePaths;
use leadflow_runtime_config::LeadflowConfig;
use std::time::Duration;

pub const USER_ENV: &str = "LEADFLOW_USER";
pub const PASSWORD_ENV: &str = "LEADFLOW_PASSWORD";

/// Config and opened tables for one command invocation.
pub struct AppContext {
    pub config: LeadflowConfig,
    pub paths: TablePaths,
    pub store: LocalStore,
}

impl AppContext {
    pub fn open() -> Result<Self> {
        let config = load_config()?;
        let paths = leadflow_paths::table_paths(&config).context("Could not determine data dir")?;
        let store = LocalStore::open(&paths, Duration::from_millis(config.storage.lock_timeout_ms))
            .with_context(|| format!("Failed to open data dir {}", paths.root.display()))?;
        Ok(Self {
            config,
            paths,
            store,
        })
    }

    pub fn catalog(&self) -> Catalog {
        self.config.catalog()
    }

    pub fn session(&self) -> SessionGuard {
        SessionGuard::new(
            self.store.credentials.clone(),
            self.config.auth.password_salt.clone(),
        )
    }

    /// Authenticate the operator for this invocation.
    ///
    /// The username comes from `--user` or `LEADFLOW_USER`, the password from
    /// `LEADFLOW_PASSWORD`; either is prompted for when missing.
    pub fn login(&self, user: Option<&str>) -> Result<Operator> {
        let username = match user.map(str::to_string).or_else(|| env_value(USER_ENV)) {
            Some(name) => name,
            None => dialoguer::Input::<String>::new()
                .with_prompt("Username")
                .interact_text()
                .context("Failed to read username")?,
        };
        let password = match env_value(PASSWORD_ENV) {
            Some(password) => password,
            None => dialoguer::Password::new()
                .with_prompt("Password")
                .interact()
                .context("Failed to read password")?,
        };

        let mut session = self.session();
        match session.login(&username, &password) {
            Ok(operator) => Ok(operator.clone()),
            Err(AuthError::InvalidCredentials) => bail!("Invalid username or password"),
            Err(AuthError::Store(e)) => Err(e).context("Failed to read credentials"),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Parse a stage argument: a canonical token (any case) or a legacy label.
pub fn parse_stage(raw: &str) -> Result<Stage, String> {
    let value = raw.trim();
    if let Some(stage) = Stage::ALL
        .into_iter()
        .find(|stage| stage.as_str().eq_ignore_ascii_case(value))
    {
        return Ok(stage);
    }
    match normalize_stage(value) {
        Stage::Awareness if !value.eq_ignore_ascii_case("captado") => {
            let tokens: Vec<&str> = Stage::ALL.iter().map(Stage::as_str).collect();
            Err(format!(
                "unknown stage '{raw}' (expected one of: {})",
                tokens.join(", ")
            ))
        }
        stage => Ok(stage),
    }
}
