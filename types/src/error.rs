//! Shared error vocabulary.
//!
//! Each crate owns its own error enum; all of them classify into one
//! [`ErrorKind`] so that entry points can report failures uniformly.

use thiserror::Error;

/// Failure classes shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing fields; rejected locally.
    Input,
    /// A report failed its signature, measurement or key-binding checks.
    Attestation,
    /// Attested identity disagrees with the ledger, or host identity fails policy.
    Consistency,
    /// Decryption or signature failure.
    Crypto,
    /// Remote verification service unreachable or timed out.
    Transport,
    /// Claimed state disagrees with the ledger.
    Replay,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Input => write!(f, "input"),
            ErrorKind::Attestation => write!(f, "attestation"),
            ErrorKind::Consistency => write!(f, "consistency"),
            ErrorKind::Crypto => write!(f, "crypto"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Replay => write!(f, "replay"),
        }
    }
}

/// Decoding errors for wire messages and text encodings.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("Failed to decode {message}: {source}")]
    Decode {
        message: &'static str,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unexpected type url: expected {expected}, got {actual}")]
    TypeUrl { expected: &'static str, actual: String },

    #[error("Invalid composite key: {0}")]
    CompositeKey(String),
}

impl TypesError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Input
    }

    pub(crate) fn decode(message: &'static str, source: prost::DecodeError) -> Self {
        TypesError::Decode { message, source }
    }
}

pub type TypesResult<T> = Result<T, TypesError>;
