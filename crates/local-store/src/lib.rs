//! CSV persistence for leadflow.
//!
//! Each table is a CSV file in the data directory. Reads tolerate missing
//! files, short rows and unparseable cells; writes replace the whole file
//! atomically under a best-effort advisory lock.

pub mod codec;
pub mod credentials;
pub mod error;
pub mod export;
pub mod follow_up;
pub mod interactions;
pub mod leads;
pub mod schema;
pub mod session;
pub mod stages;
pub mod table;

pub use credentials::CredentialStore;
pub use error::StoreError;
pub use export::export_csv;
pub use follow_up::{RecordedFollowUp, record_follow_up};
pub use interactions::InteractionLog;
pub use leads::LeadStore;
pub use session::{AuthError, SessionGuard};
pub use stages::StageTable;

use leadflow_core::ValidationError;
use leadflow_paths::TablePaths;
use std::time::Duration;

/// Outcome of a create or update. Validation failures and missing targets
/// are ordinary outcomes the caller branches on, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    Applied(T),
    Rejected(Vec<ValidationError>),
    /// The target identifier no longer exists.
    NotFound(String),
}

impl<T> Mutation<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Mutation::Applied(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }
}

/// Every table of one data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pub leads: LeadStore,
    pub interactions: InteractionLog,
    pub credentials: CredentialStore,
    pub stages: StageTable,
}

impl LocalStore {
    /// Open (and materialize where missing) all tables under `paths`.
    pub fn open(paths: &TablePaths, lock_timeout: Duration) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&paths.root)?;
        Ok(Self {
            leads: LeadStore::open(&paths.leads, lock_timeout)?,
            interactions: InteractionLog::open(&paths.interactions, lock_timeout)?,
            credentials: CredentialStore::open(&paths.users, lock_timeout)?,
            stages: StageTable::open(&paths.stages, lock_timeout)?,
        })
    }
}
