//! Sources of randomness backing key and nonce generation.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()>;
}

/// Operating-system randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CryptoError::Entropy(e.to_string()))
    }
}
