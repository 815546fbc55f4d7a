use std::path::PathBuf;
use thiserror::Error;

/// Storage failures. Validation and not-found outcomes are reported through
/// [`crate::Mutation`] instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to replace table file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("table path has no parent directory: {}", .0.display())]
    NoParent(PathBuf),
}
