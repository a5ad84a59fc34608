//! Contract between a host peer and the enclave it drives.

use async_trait::async_trait;
use veil_attestation::AttestationParams;
use veil_storage::LedgerState;
use veil_types::{Credentials, HostParams, ProgramParams, SignedChaincodeResponseMessage, SignedProposal};

use crate::error::EnclaveResult;

/// Maximum number of invocations an enclave processes at once.
pub const MAX_CONCURRENT_INVOCATIONS: usize = 8;

#[async_trait]
pub trait EnclaveRuntime: Send + Sync {
    /// Creates the enclave identity and returns credentials without evidence.
    async fn init(
        &self,
        program_params: ProgramParams,
        host_params: HostParams,
        attestation_params: &AttestationParams,
    ) -> EnclaveResult<Credentials>;

    /// Processes one encrypted request carried by `signed_proposal`.
    ///
    /// `request` is the serialized `ChaincodeRequestMessage`. Waits when the
    /// enclave is already busy with [`MAX_CONCURRENT_INVOCATIONS`] requests.
    async fn invoke(
        &self,
        ledger: &dyn LedgerState,
        signed_proposal: &SignedProposal,
        request: &[u8],
    ) -> EnclaveResult<SignedChaincodeResponseMessage>;

    /// Id of the initialized enclave.
    async fn enclave_id(&self) -> Option<String>;
}
