//! AES-128-GCM with the `nonce || tag || ciphertext` layout.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce, Tag};

use crate::error::{CryptoError, CryptoResult};

pub const SYMMETRIC_KEY_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

fn cipher(key: &[u8]) -> CryptoResult<Aes128Gcm> {
    if key.len() != SYMMETRIC_KEY_LEN {
        return Err(CryptoError::InvalidKey(format!(
            "symmetric key must be {} bytes, got {}",
            SYMMETRIC_KEY_LEN,
            key.len()
        )));
    }
    Aes128Gcm::new_from_slice(key).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

pub(crate) fn seal(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = cipher(key)?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), &[], &mut buffer)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + TAG_LEN + buffer.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&tag);
    out.extend_from_slice(&buffer);
    Ok(out)
}

pub(crate) fn open(key: &[u8], sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = cipher(key)?;
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decryption);
    }
    let (nonce, rest) = sealed.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), &[], &mut buffer, Tag::from_slice(tag))
        .map_err(|_| CryptoError::Decryption)?;
    Ok(buffer)
}
