//! Chaincode entry points hosted by the peer.

pub mod enclave;
pub mod registry;

pub use enclave::EnclaveChaincode;
pub use registry::RegistryChaincode;

use crate::error::{PeerError, PeerResult};

/// Program id the registry chaincode is installed under.
pub const REGISTRY_PROGRAM_ID: &str = "ercc";

/// Exactly `N` arguments of `function`.
pub(crate) fn expect_args<'a, const N: usize>(function: &str, args: &'a [String]) -> PeerResult<[&'a str; N]> {
    if args.len() != N {
        return Err(PeerError::Arguments {
            function: function.to_string(),
            expected: N,
            actual: args.len(),
        });
    }
    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_str();
    }
    Ok(out)
}
