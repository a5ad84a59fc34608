//! Nitro Security Module backed entropy.

use aws_nitro_enclaves_nsm_api::api::{Request, Response};
use aws_nitro_enclaves_nsm_api::driver::{nsm_exit, nsm_init, nsm_process_request};
use tracing::{debug, info};

use crate::entropy::EntropySource;
use crate::error::{CryptoError, CryptoResult};
use crate::provider::EntropyCsp;

/// CSP whose keys and nonces all come from the NSM.
pub type NitroCsp = EntropyCsp<NsmEntropy>;

impl NitroCsp {
    /// Opens the NSM device; fails outside a Nitro enclave.
    pub fn open() -> CryptoResult<Self> {
        Ok(EntropyCsp::with_entropy(NsmEntropy::open()?))
    }
}

pub struct NsmEntropy {
    fd: i32,
}

impl NsmEntropy {
    pub fn open() -> CryptoResult<Self> {
        let fd = nsm_init();
        if fd < 0 {
            return Err(CryptoError::Entropy("NSM device unavailable".to_string()));
        }
        info!(fd, "NSM entropy source opened");
        Ok(Self { fd })
    }
}

impl EntropySource for NsmEntropy {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()> {
        let mut filled = 0;
        while filled < dest.len() {
            match nsm_process_request(self.fd, Request::GetRandom) {
                Response::GetRandom { random } if !random.is_empty() => {
                    let n = random.len().min(dest.len() - filled);
                    dest[filled..filled + n].copy_from_slice(&random[..n]);
                    filled += n;
                }
                Response::Error(err) => {
                    return Err(CryptoError::Entropy(format!("NSM GetRandom failed: {:?}", err)))
                }
                _ => return Err(CryptoError::Entropy("Unexpected NSM response".to_string())),
            }
        }
        debug!(bytes = dest.len(), "Drew NSM randomness");
        Ok(())
    }
}

impl Drop for NsmEntropy {
    fn drop(&mut self) {
        nsm_exit(self.fd);
    }
}
