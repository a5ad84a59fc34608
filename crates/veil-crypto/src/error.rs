use thiserror::Error;
use veil_types::ErrorKind;

/// CSP errors. Decryption failures never say which check failed.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed")]
    Decryption,

    #[error("Malformed signature")]
    MalformedSignature,

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Entropy source failure: {0}")]
    Entropy(String),
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Crypto
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
