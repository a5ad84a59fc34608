//! Client session against a local peer.

use std::sync::Arc;

use tracing::debug;
use veil_client::{CachedKeySource, EncryptionProvider, RegistryKeySource};
use veil_crypto::Csp;
use veil_types::{Proposal, SerializedIdentity, SignedProposal};

use crate::chaincode::enclave::ENDORSE;
use crate::chaincode::REGISTRY_PROGRAM_ID;
use crate::error::{PeerError, PeerResult};
use crate::peer::Peer;
use crate::response::ChaincodeResponse;

/// Result of a confidential invocation before endorsement.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Cleartext result revealed from the response
    pub result: Vec<u8>,
    /// Base64 signed response, as submitted for endorsement
    pub signed_response: String,
}

/// Submits confidential invocations to one program as one identity.
pub struct Session<'a> {
    peer: &'a Peer,
    provider: EncryptionProvider,
    identity: SerializedIdentity,
    program_id: String,
}

impl<'a> Session<'a> {
    /// Program keys come from the peer's registry state and are cached.
    pub fn new(peer: &'a Peer, csp: Arc<dyn Csp>, identity: SerializedIdentity, program_id: &str) -> Self {
        let keys = RegistryKeySource::new(
            peer.registry(),
            Arc::new(peer.ledger().namespace(REGISTRY_PROGRAM_ID)),
        );
        Self {
            peer,
            provider: EncryptionProvider::new(csp, Arc::new(CachedKeySource::new(keys))),
            identity,
            program_id: program_id.to_string(),
        }
    }

    pub fn identity(&self) -> &SerializedIdentity {
        &self.identity
    }

    /// Signed proposal calling `function(args)` on `program_id` as this session's identity.
    pub fn proposal(&self, program_id: &str, function: &str, args: &[&str]) -> SignedProposal {
        let tx_id = uuid::Uuid::new_v4().to_string();
        Proposal::call(
            &self.peer.config().channel_id,
            tx_id,
            &self.identity,
            program_id,
            function,
            args,
        )
        .sign_with(Vec::new())
    }

    /// Runs a plain (non-confidential) chaincode call.
    pub async fn call(&self, program_id: &str, function: &str, args: &[&str]) -> PeerResult<Vec<u8>> {
        let response = self.peer.execute(&self.proposal(program_id, function, args)).await;
        into_result(response)
    }

    /// Conceals `function(args)`, runs it in the enclave and reveals the result.
    pub async fn invoke(&self, function: &str, args: &[&str]) -> PeerResult<Invocation> {
        let concealed = self
            .provider
            .new_context(&self.program_id)?
            .conceal(function, args.iter().copied())?;
        let tx_id = uuid::Uuid::new_v4().to_string();
        let proposal = Proposal::invoke(
            &self.peer.config().channel_id,
            tx_id,
            &self.identity,
            self.program_id.as_str(),
            &concealed.request_base64(),
        )
        .sign_with(Vec::new());

        let response = into_result(self.peer.execute(&proposal).await)?;
        let signed_response = String::from_utf8(response)
            .map_err(|_| PeerError::Types(veil_types::TypesError::MissingField("signed response")))?;
        let result = concealed.reveal(&signed_response)?;
        debug!(program_id = %self.program_id, function, "Invocation revealed");
        Ok(Invocation { result, signed_response })
    }

    /// Submits a signed response for endorsement.
    pub async fn endorse(&self, signed_response: &str) -> PeerResult<()> {
        self.call(&self.program_id, ENDORSE, &[signed_response]).await?;
        Ok(())
    }

    /// Invokes and endorses; returns the revealed result.
    pub async fn submit(&self, function: &str, args: &[&str]) -> PeerResult<Vec<u8>> {
        let invocation = self.invoke(function, args).await?;
        self.endorse(&invocation.signed_response).await?;
        Ok(invocation.result)
    }
}

fn into_result(response: ChaincodeResponse) -> PeerResult<Vec<u8>> {
    if response.is_ok() {
        return Ok(response.payload);
    }
    Err(PeerError::Rejected {
        kind: response.kind.unwrap_or(veil_types::ErrorKind::Input),
        message: response.message,
    })
}
