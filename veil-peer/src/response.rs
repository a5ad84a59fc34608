use veil_types::ErrorKind;

use crate::error::PeerError;

pub const STATUS_OK: u16 = 200;
pub const STATUS_ERROR: u16 = 500;

/// Outcome of a chaincode call as returned to the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeResponse {
    pub status: u16,
    pub payload: Vec<u8>,
    pub message: String,
    /// Failure class, for error responses
    pub kind: Option<ErrorKind>,
}

impl ChaincodeResponse {
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: STATUS_OK,
            payload: payload.into(),
            message: String::new(),
            kind: None,
        }
    }

    pub fn error(error: &PeerError) -> Self {
        Self {
            status: STATUS_ERROR,
            payload: Vec::new(),
            message: error.to_string(),
            kind: Some(error.kind()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Payload as text; chaincode payloads here are base64, JSON or plain strings.
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

impl From<Result<Vec<u8>, PeerError>> for ChaincodeResponse {
    fn from(result: Result<Vec<u8>, PeerError>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(e) => Self::error(&e),
        }
    }
}
