//! # Veil CSP
//!
//! Cryptographic service provider used by every other Veil component.
//! Callers depend only on the capability traits:
//!
//! | trait | capability |
//! |---|---|
//! | [`SymmetricCipher`] | AES-128-GCM, `nonce(12) \|\| tag(16) \|\| ciphertext` |
//! | [`KeyWrapper`] | ECDH P-256 + HKDF-SHA256 + AES-GCM hybrid encryption |
//! | [`MessageSigner`] | ECDSA P-256 / SHA-256, DER signatures |
//!
//! Two providers ship: [`SoftwareCsp`] (OS randomness) and, with the `nitro`
//! feature, `NitroCsp`, which draws every key and nonce from the Nitro
//! Security Module.

mod aead;
mod ecies;
mod signing;

pub mod entropy;
pub mod error;
#[cfg(feature = "nitro")]
pub mod nitro;
pub mod provider;

pub use aead::SYMMETRIC_KEY_LEN;
pub use entropy::{EntropySource, OsEntropy};
pub use error::{CryptoError, CryptoResult};
#[cfg(feature = "nitro")]
pub use nitro::{NitroCsp, NsmEntropy};
pub use provider::{
    Csp, EntropyCsp, KeyPair, KeyWrapper, MessageSigner, SoftwareCsp, SymmetricCipher, SymmetricKey,
};

use std::sync::Arc;

/// Provider selected at build time.
#[cfg(not(feature = "nitro"))]
pub fn create_default_csp() -> CryptoResult<Arc<dyn Csp>> {
    Ok(Arc::new(SoftwareCsp::new()))
}

/// Provider selected at build time.
#[cfg(feature = "nitro")]
pub fn create_default_csp() -> CryptoResult<Arc<dyn Csp>> {
    Ok(Arc::new(NitroCsp::open()?))
}
