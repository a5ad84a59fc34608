use thiserror::Error;
use veil_crypto::CryptoError;
use veil_types::{ErrorKind, TypesError};

/// Attestation errors
#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("Unsupported attestation scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Malformed evidence: {0}")]
    InvalidEvidence(String),

    #[error("Report signature does not verify against the pinned authority")]
    InvalidSignature,

    #[error("Signing certificate not trusted: {0}")]
    UntrustedCertificate(String),

    #[error("Quote status not acceptable: {0}")]
    QuoteStatus(String),

    #[error("Enclave measurement mismatch: expected {expected}, got {actual}")]
    MeasurementMismatch { expected: String, actual: String },

    #[error("Report data does not bind the expected enclave statement")]
    KeyBindingMismatch,

    #[error("Quote sign type {actual} does not match scheme {scheme}")]
    SignTypeMismatch { scheme: String, actual: u16 },

    #[error("Remote verification service error: {0}")]
    Transport(String),

    #[error("Remote verification service timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl AttestationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AttestationError::InvalidEvidence(_)
            | AttestationError::Config(_)
            | AttestationError::Types(_) => ErrorKind::Input,
            AttestationError::Transport(_) | AttestationError::Timeout => ErrorKind::Transport,
            AttestationError::Crypto(_) => ErrorKind::Crypto,
            _ => ErrorKind::Attestation,
        }
    }
}

pub type AttestationResult<T> = Result<T, AttestationError>;
