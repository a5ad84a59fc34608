use thiserror::Error;
use veil_attestation::AttestationError;
use veil_client::ClientError;
use veil_enclave::EnclaveError;
use veil_endorsement::EndorsementError;
use veil_registry::RegistryError;
use veil_storage::StorageError;
use veil_types::{ErrorKind, TypesError};

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown program {0}")]
    UnknownProgram(String),

    #[error("Unknown function {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arguments {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Proposal for channel {actual} sent to peer on channel {expected}")]
    WrongChannel { expected: String, actual: String },

    #[error("Chaincode call rejected ({kind}): {message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("Failed to encode response: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Enclave(#[from] EnclaveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Endorsement(#[from] EndorsementError),

    #[error(transparent)]
    Attestation(#[from] AttestationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl PeerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PeerError::WrongChannel { .. } => ErrorKind::Consistency,
            PeerError::Rejected { kind, .. } => *kind,
            PeerError::Enclave(e) => e.kind(),
            PeerError::Registry(e) => e.kind(),
            PeerError::Endorsement(e) => e.kind(),
            PeerError::Attestation(e) => e.kind(),
            PeerError::Client(e) => e.kind(),
            PeerError::Storage(e) => e.kind(),
            PeerError::Types(e) => e.kind(),
            _ => ErrorKind::Input,
        }
    }
}

pub type PeerResult<T> = Result<T, PeerError>;
