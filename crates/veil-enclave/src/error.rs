use thiserror::Error;
use veil_attestation::AttestationError;
use veil_crypto::CryptoError;
use veil_storage::StorageError;
use veil_types::{ErrorKind, TypesError};

#[derive(Debug, Error)]
pub enum EnclaveError {
    #[error("Enclave not initialized")]
    NotInitialized,

    #[error("Enclave already initialized as {enclave_id}")]
    AlreadyInitialized { enclave_id: String },

    #[error("Proposal channel {actual} does not match enclave channel {expected}")]
    ChannelMismatch { expected: String, actual: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Program failed: {0}")]
    Program(String),

    #[error("Enclave is shutting down")]
    Closed,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Attestation(#[from] AttestationError),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EnclaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnclaveError::ChannelMismatch { .. } => ErrorKind::Consistency,
            EnclaveError::Crypto(_) => ErrorKind::Crypto,
            EnclaveError::Attestation(e) => e.kind(),
            _ => ErrorKind::Input,
        }
    }
}

pub type EnclaveResult<T> = Result<T, EnclaveError>;
