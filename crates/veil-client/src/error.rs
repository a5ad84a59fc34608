use thiserror::Error;
use veil_crypto::CryptoError;
use veil_registry::RegistryError;
use veil_types::{ErrorKind, TypesError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No encryption key available for program {0}")]
    NoEncryptionKey(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Registry(e) => e.kind(),
            ClientError::Crypto(_) => ErrorKind::Crypto,
            _ => ErrorKind::Input,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
