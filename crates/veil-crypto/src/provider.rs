//! CSP capability traits and the entropy-parameterized provider.

use p256::SecretKey;
use tracing::trace;
use zeroize::Zeroizing;

use crate::aead::{self, NONCE_LEN, SYMMETRIC_KEY_LEN};
use crate::ecies;
use crate::entropy::{EntropySource, OsEntropy};
use crate::error::{CryptoError, CryptoResult};
use crate::signing;

const MAX_KEYGEN_ATTEMPTS: usize = 8;

/// Raw symmetric key; wiped on drop.
pub type SymmetricKey = Zeroizing<Vec<u8>>;

/// Asymmetric key pair. The private half is wiped on drop and never leaves
/// the component that generated it.
pub struct KeyPair {
    private_key: Zeroizing<Vec<u8>>,
    public_key: Vec<u8>,
}

impl KeyPair {
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// SEC1 uncompressed encoding.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Authenticated symmetric encryption.
pub trait SymmetricCipher: Send + Sync {
    fn new_symmetric_key(&self) -> CryptoResult<SymmetricKey>;

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;
}

/// Public-key encryption of arbitrary-length payloads.
pub trait KeyWrapper: Send + Sync {
    fn new_encryption_keys(&self) -> CryptoResult<KeyPair>;

    fn pk_encrypt(&self, public_key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    fn pk_decrypt(&self, private_key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;
}

/// Message signatures.
pub trait MessageSigner: Send + Sync {
    fn new_signing_keys(&self) -> CryptoResult<KeyPair>;

    fn sign(&self, private_key: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>>;

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()>;
}

/// The full provider surface.
pub trait Csp: SymmetricCipher + KeyWrapper + MessageSigner {}

impl<T> Csp for T where T: SymmetricCipher + KeyWrapper + MessageSigner {}

/// Provider whose key and nonce material comes from `E`.
#[derive(Debug, Clone, Default)]
pub struct EntropyCsp<E> {
    entropy: E,
}

/// Software-only provider backed by OS randomness.
pub type SoftwareCsp = EntropyCsp<OsEntropy>;

impl SoftwareCsp {
    pub fn new() -> Self {
        Self::with_entropy(OsEntropy)
    }
}

impl<E: EntropySource> EntropyCsp<E> {
    pub fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }

    fn nonce(&self) -> CryptoResult<[u8; NONCE_LEN]> {
        let mut nonce = [0u8; NONCE_LEN];
        self.entropy.fill(&mut nonce)?;
        Ok(nonce)
    }

    fn secret_key(&self) -> CryptoResult<SecretKey> {
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            let mut bytes = Zeroizing::new([0u8; 32]);
            self.entropy.fill(bytes.as_mut())?;
            if let Ok(secret) = SecretKey::from_slice(bytes.as_ref()) {
                return Ok(secret);
            }
        }
        Err(CryptoError::Entropy("no valid scalar after repeated draws".to_string()))
    }

    fn key_pair(&self) -> CryptoResult<KeyPair> {
        let secret = self.secret_key()?;
        let public_key = ecies::encode_public_key(&secret.public_key());
        Ok(KeyPair {
            private_key: Zeroizing::new(secret.to_bytes().to_vec()),
            public_key,
        })
    }
}

impl<E: EntropySource> SymmetricCipher for EntropyCsp<E> {
    fn new_symmetric_key(&self) -> CryptoResult<SymmetricKey> {
        let mut key = Zeroizing::new(vec![0u8; SYMMETRIC_KEY_LEN]);
        self.entropy.fill(key.as_mut_slice())?;
        Ok(key)
    }

    fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let nonce = self.nonce()?;
        trace!(len = plaintext.len(), "AEAD encrypt");
        aead::seal(key, &nonce, plaintext)
    }

    fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        aead::open(key, ciphertext)
    }
}

impl<E: EntropySource> KeyWrapper for EntropyCsp<E> {
    fn new_encryption_keys(&self) -> CryptoResult<KeyPair> {
        self.key_pair()
    }

    fn pk_encrypt(&self, public_key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let ephemeral = self.secret_key()?;
        let nonce = self.nonce()?;
        ecies::wrap(public_key, &ephemeral, &nonce, plaintext)
    }

    fn pk_decrypt(&self, private_key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        ecies::unwrap(private_key, ciphertext)
    }
}

impl<E: EntropySource> MessageSigner for EntropyCsp<E> {
    fn new_signing_keys(&self) -> CryptoResult<KeyPair> {
        self.key_pair()
    }

    fn sign(&self, private_key: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>> {
        signing::sign(private_key, message)
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        signing::verify(public_key, message, signature)
    }
}
