//! Text encodings used at the entry-point boundary.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use crate::error::TypesResult;

/// Standard-alphabet base64.
pub fn to_base64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(text: &str) -> TypesResult<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}

pub fn sha256(bytes: impl AsRef<[u8]>) -> [u8; 32] {
    Sha256::digest(bytes.as_ref()).into()
}

/// Enclave identifier: uppercase hex of SHA-256 over the enclave verification key.
pub fn enclave_id(enclave_vk: &[u8]) -> String {
    hex::encode_upper(sha256(enclave_vk))
}

/// Length in bytes of a program measurement.
pub const MEASUREMENT_LEN: usize = 32;

/// Parses a hex measurement, accepting either case.
pub fn parse_measurement(measurement: &str) -> Option<[u8; MEASUREMENT_LEN]> {
    let bytes = hex::decode(measurement).ok()?;
    bytes.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclave_id_is_uppercase_sha256() {
        let id = enclave_id(b"vk");
        assert_eq!(id.len(), 64);
        assert_eq!(id, id.to_uppercase());
        assert_eq!(id, hex::encode_upper(sha256(b"vk")));
    }

    #[test]
    fn test_parse_measurement() {
        let hex_lower = "ab".repeat(32);
        assert_eq!(parse_measurement(&hex_lower), Some([0xab; 32]));
        assert_eq!(parse_measurement(&hex_lower.to_uppercase()), Some([0xab; 32]));
        assert!(parse_measurement("abcd").is_none());
        assert!(parse_measurement(&"zz".repeat(32)).is_none());
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(from_base64("not base64!").is_err());
        assert_eq!(from_base64(&to_base64(b"")).unwrap(), Vec::<u8>::new());
    }
}
