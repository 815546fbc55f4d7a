//! Login for one interactive session.

use crate::credentials::CredentialStore;
use crate::error::StoreError;
use leadflow_core::Operator;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Holds the authenticated operator until logout.
#[derive(Debug)]
pub struct SessionGuard {
    credentials: CredentialStore,
    salt: String,
    current: Option<Operator>,
}

impl SessionGuard {
    pub fn new(credentials: CredentialStore, salt: impl Into<String>) -> Self {
        Self {
            credentials,
            salt: salt.into(),
            current: None,
        }
    }

    /// Succeeds iff a case-insensitive username match exists and the salted
    /// hash of `password` equals the stored hash.
    pub fn login(&mut self, username: &str, password: &str) -> Result<&Operator, AuthError> {
        let credential = self
            .credentials
            .find(username)?
            .filter(|credential| credential.verify(password, &self.salt));
        let Some(credential) = credential else {
            warn!(username = %username.trim(), "rejected login");
            return Err(AuthError::InvalidCredentials);
        };

        info!(username = %credential.username, "logged in");
        Ok(&*self.current.insert(credential.operator()))
    }

    pub fn current(&self) -> Option<&Operator> {
        self.current.as_ref()
    }

    pub fn logout(&mut self) -> Option<Operator> {
        self.current.take()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }
}
