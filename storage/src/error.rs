use thiserror::Error;
use veil_types::{ErrorKind, TypesError};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Corrupt record under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Input
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
