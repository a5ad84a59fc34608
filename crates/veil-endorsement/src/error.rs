use thiserror::Error;
use veil_crypto::CryptoError;
use veil_registry::RegistryError;
use veil_storage::StorageError;
use veil_types::{ErrorKind, TypesError};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Response carries no signature")]
    EmptySignature,

    #[error("Response carries no inner message")]
    EmptyResponse,

    #[error("Response carries no original proposal")]
    MissingProposal,

    #[error("Response was produced by enclave {actual}, expected {expected}")]
    EnclaveMismatch { expected: String, actual: String },

    #[error("Request hash does not match the request carried by the proposal")]
    RequestHashMismatch,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::Crypto(_) | ValidationError::RequestHashMismatch => ErrorKind::Crypto,
            ValidationError::EnclaveMismatch { .. } => ErrorKind::Consistency,
            _ => ErrorKind::Input,
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Range query replay is not supported ({0} queries)")]
    RangeQueriesUnsupported(usize),

    #[error("Read of {key} does not match the ledger")]
    ReadMismatch { key: String },

    #[error("Write to an empty key")]
    EmptyWriteKey,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl ReplayError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Replay
    }
}

pub type ReplayResult<T> = Result<T, ReplayError>;

#[derive(Debug, Error)]
pub enum EndorsementError {
    #[error("No program definition for {0}")]
    UnknownProgram(String),

    #[error("Attested program parameters do not match the definition of {program_id} on {channel_id}")]
    ProgramMismatch { program_id: String, channel_id: String },

    #[error("Enclave host {operator} is not approved to endorse {program_id}")]
    HostNotApproved { operator: String, program_id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl EndorsementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EndorsementError::UnknownProgram(_)
            | EndorsementError::ProgramMismatch { .. }
            | EndorsementError::HostNotApproved { .. } => ErrorKind::Consistency,
            EndorsementError::Validation(e) => e.kind(),
            EndorsementError::Replay(e) => e.kind(),
            EndorsementError::Registry(e) => e.kind(),
            EndorsementError::Storage(e) => e.kind(),
            EndorsementError::Types(e) => e.kind(),
        }
    }
}

pub type EndorsementResult<T> = Result<T, EndorsementError>;
