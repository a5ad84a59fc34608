//! ECDSA P-256 / SHA-256 with DER-encoded signatures.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};

use crate::error::{CryptoError, CryptoResult};

pub(crate) fn sign(private_key: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>> {
    let key = SigningKey::from_slice(private_key)
        .map_err(|_| CryptoError::InvalidKey("not a P-256 signing key".to_string()))?;
    let signature: Signature = key
        .try_sign(message)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(signature.to_der().as_bytes().to_vec())
}

pub(crate) fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()> {
    let key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|_| CryptoError::InvalidKey("not a P-256 verification key".to_string()))?;
    let signature = Signature::from_der(signature).map_err(|_| CryptoError::MalformedSignature)?;
    key.verify(message, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}
