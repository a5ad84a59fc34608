//! Hybrid public-key encryption: ephemeral P-256 ECDH, HKDF-SHA256, AES-128-GCM.
//!
//! Output layout: `ephemeral SEC1 point (65) || nonce || tag || ciphertext`.

use hkdf::Hkdf;
use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::aead::{self, NONCE_LEN, SYMMETRIC_KEY_LEN, TAG_LEN};
use crate::error::{CryptoError, CryptoResult};

const UNCOMPRESSED_POINT_LEN: usize = 65;
const WRAP_INFO: &[u8] = b"veil key wrap v1";

fn derive_key(secret: &SecretKey, peer: &PublicKey, salt: &[u8]) -> CryptoResult<Zeroizing<[u8; SYMMETRIC_KEY_LEN]>> {
    let shared = diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    let hk = Hkdf::<Sha256>::new(Some(salt), shared.raw_secret_bytes().as_slice());
    let mut okm = Zeroizing::new([0u8; SYMMETRIC_KEY_LEN]);
    hk.expand(WRAP_INFO, okm.as_mut())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(okm)
}

pub(crate) fn parse_public_key(bytes: &[u8]) -> CryptoResult<PublicKey> {
    PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidKey("not a P-256 SEC1 point".to_string()))
}

pub(crate) fn parse_secret_key(bytes: &[u8]) -> CryptoResult<SecretKey> {
    SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidKey("not a P-256 scalar".to_string()))
}

pub(crate) fn encode_public_key(key: &PublicKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}

pub(crate) fn wrap(
    recipient: &[u8],
    ephemeral: &SecretKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let recipient = parse_public_key(recipient)?;
    let ephemeral_point = encode_public_key(&ephemeral.public_key());
    let key = derive_key(ephemeral, &recipient, &ephemeral_point)?;

    let sealed = aead::seal(key.as_ref(), nonce, plaintext)?;
    let mut out = Vec::with_capacity(ephemeral_point.len() + sealed.len());
    out.extend_from_slice(&ephemeral_point);
    out.extend_from_slice(&sealed);
    Ok(out)
}

pub(crate) fn unwrap(private_key: &[u8], wrapped: &[u8]) -> CryptoResult<Vec<u8>> {
    let secret = parse_secret_key(private_key)?;
    if wrapped.len() < UNCOMPRESSED_POINT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decryption);
    }
    let (point, sealed) = wrapped.split_at(UNCOMPRESSED_POINT_LEN);
    let ephemeral = PublicKey::from_sec1_bytes(point).map_err(|_| CryptoError::Decryption)?;
    let key = derive_key(&secret, &ephemeral, point).map_err(|_| CryptoError::Decryption)?;
    aead::open(key.as_ref(), sealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_wrap_unwrap() {
        let recipient = SecretKey::random(&mut OsRng);
        let ephemeral = SecretKey::random(&mut OsRng);
        let recipient_pub = encode_public_key(&recipient.public_key());

        let wrapped = wrap(&recipient_pub, &ephemeral, &[3u8; 12], b"request key").unwrap();
        assert_eq!(unwrap(&recipient.to_bytes(), &wrapped).unwrap(), b"request key");
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let recipient = SecretKey::random(&mut OsRng);
        let other = SecretKey::random(&mut OsRng);
        let ephemeral = SecretKey::random(&mut OsRng);
        let wrapped = wrap(&encode_public_key(&recipient.public_key()), &ephemeral, &[0u8; 12], b"k").unwrap();

        assert!(matches!(unwrap(&other.to_bytes(), &wrapped), Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_large_payload_is_not_bounded() {
        let recipient = SecretKey::random(&mut OsRng);
        let ephemeral = SecretKey::random(&mut OsRng);
        let payload = vec![0x5a; 1 << 20];
        let wrapped = wrap(&encode_public_key(&recipient.public_key()), &ephemeral, &[0u8; 12], &payload).unwrap();
        assert_eq!(unwrap(&recipient.to_bytes(), &wrapped).unwrap(), payload);
    }
}
