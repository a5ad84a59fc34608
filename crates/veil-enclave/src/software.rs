//! Software enclave.
//!
//! Runs the full enclave protocol (key generation, attestation, request
//! decryption, response signing) in the host process. Key material stays
//! inside this value; only public keys leave through the credentials.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info};
use veil_attestation::{AttestationIssuer, AttestationParams};
use veil_crypto::{Csp, KeyPair};
use veil_storage::LedgerState;
use veil_types::{
    sha256, AttestedData, ChaincodeRequestMessage, ChaincodeResponseMessage, CleartextRequest, Credentials,
    HostParams, Message, ProgramParams, SignedChaincodeResponseMessage, SignedProposal,
};

use crate::error::{EnclaveError, EnclaveResult};
use crate::program::Program;
use crate::runtime::{EnclaveRuntime, MAX_CONCURRENT_INVOCATIONS};
use crate::rwset::RecordingStub;

struct EnclaveIdentity {
    enclave_id: String,
    signing_keys: KeyPair,
    program_keys: KeyPair,
    program_params: ProgramParams,
}

pub struct SoftwareEnclave {
    program: Arc<dyn Program>,
    csp: Arc<dyn Csp>,
    issuer: Arc<dyn AttestationIssuer>,
    identity: RwLock<Option<EnclaveIdentity>>,
    gate: Semaphore,
}

impl SoftwareEnclave {
    pub fn new(program: Arc<dyn Program>, csp: Arc<dyn Csp>, issuer: Arc<dyn AttestationIssuer>) -> Self {
        Self {
            program,
            csp,
            issuer,
            identity: RwLock::new(None),
            gate: Semaphore::new(MAX_CONCURRENT_INVOCATIONS),
        }
    }

    /// Invocation slots currently free.
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    fn open_request(&self, identity: &EnclaveIdentity, request: &[u8]) -> EnclaveResult<CleartextRequest> {
        let message = ChaincodeRequestMessage::decode(request)
            .map_err(|e| EnclaveError::InvalidRequest(format!("request message: {}", e)))?;
        if message.encrypted_request_key.is_empty() || message.encrypted_request.is_empty() {
            return Err(EnclaveError::InvalidRequest("empty request fields".to_string()));
        }
        let request_key = veil_crypto::SymmetricKey::new(
            self.csp
                .pk_decrypt(identity.program_keys.private_key(), &message.encrypted_request_key)?,
        );
        let cleartext = self.csp.decrypt(&request_key, &message.encrypted_request)?;
        Ok(CleartextRequest::decode_bytes(&cleartext)?)
    }
}

#[async_trait]
impl EnclaveRuntime for SoftwareEnclave {
    async fn init(
        &self,
        program_params: ProgramParams,
        host_params: HostParams,
        attestation_params: &AttestationParams,
    ) -> EnclaveResult<Credentials> {
        let mut identity = self.identity.write().await;
        if let Some(existing) = identity.as_ref() {
            return Err(EnclaveError::AlreadyInitialized {
                enclave_id: existing.enclave_id.clone(),
            });
        }

        let signing_keys = self.csp.new_signing_keys()?;
        let program_keys = self.csp.new_encryption_keys()?;
        let attested = AttestedData {
            enclave_vk: signing_keys.public_key().to_vec(),
            program_params: Some(program_params.clone()),
            host_params: Some(host_params),
            program_ek: program_keys.public_key().to_vec(),
        };
        let statement = attested.encode_to_vec();
        let attestation = self.issuer.issue(attestation_params, &statement)?;
        let credentials = Credentials::new(&attested, attestation.to_bytes()?);

        let enclave_id = attested.enclave_id();
        info!(
            enclave_id = %enclave_id,
            program_id = %program_params.program_id,
            scheme = %attestation.attestation_type,
            "Enclave initialized"
        );
        *identity = Some(EnclaveIdentity {
            enclave_id,
            signing_keys,
            program_keys,
            program_params,
        });
        Ok(credentials)
    }

    async fn invoke(
        &self,
        ledger: &dyn LedgerState,
        signed_proposal: &SignedProposal,
        request: &[u8],
    ) -> EnclaveResult<SignedChaincodeResponseMessage> {
        let _permit = self.gate.acquire().await.map_err(|_| EnclaveError::Closed)?;
        let guard = self.identity.read().await;
        let identity = guard.as_ref().ok_or(EnclaveError::NotInitialized)?;

        let proposal = signed_proposal.proposal()?;
        let channel = proposal.channel_id().unwrap_or_default();
        if channel != identity.program_params.channel_id {
            return Err(EnclaveError::ChannelMismatch {
                expected: identity.program_params.channel_id.clone(),
                actual: channel.to_string(),
            });
        }

        let cleartext = self.open_request(identity, request)?;
        debug!(
            enclave_id = %identity.enclave_id,
            function = %cleartext.function,
            args = cleartext.args.len(),
            "Invoking program"
        );

        let mut stub = RecordingStub::new(ledger);
        let result = self.program.invoke(&mut stub, &cleartext.function, &cleartext.args)?;
        let encrypted_response = self.csp.encrypt(&cleartext.response_encryption_key, &result)?;

        let response = ChaincodeResponseMessage {
            encrypted_response,
            rw_set: Some(stub.into_rw_set()),
            enclave_id: identity.enclave_id.clone(),
            proposal: Some(signed_proposal.clone()),
            request_message_hash: sha256(request).to_vec(),
        };
        let response_bytes = response.encode_to_vec();
        let signature = self.csp.sign(identity.signing_keys.private_key(), &response_bytes)?;

        Ok(SignedChaincodeResponseMessage {
            chaincode_response_message: response_bytes,
            signature,
        })
    }

    async fn enclave_id(&self) -> Option<String> {
        self.identity.read().await.as_ref().map(|i| i.enclave_id.clone())
    }
}
