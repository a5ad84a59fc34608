//! A peer hosting the registry chaincode and enclave chaincodes on one channel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use veil_attestation::{ConverterRegistry, CredentialVerifier};
use veil_crypto::Csp;
use veil_enclave::EnclaveRuntime;
use veil_endorsement::{Endorser, Validator};
use veil_registry::EnclaveRegistry;
use veil_storage::{MemoryLedger, TxStub};
use veil_types::{SerializedIdentity, SignedProposal};

use crate::chaincode::{EnclaveChaincode, RegistryChaincode, REGISTRY_PROGRAM_ID};
use crate::config::PeerConfig;
use crate::error::{PeerError, PeerResult};
use crate::response::ChaincodeResponse;

pub struct Peer {
    config: PeerConfig,
    ledger: MemoryLedger,
    registry: Arc<RegistryChaincode>,
    converters: Arc<ConverterRegistry>,
    endorser: Arc<Endorser>,
    enclaves: RwLock<HashMap<String, Arc<EnclaveChaincode>>>,
}

impl Peer {
    pub fn new(
        config: PeerConfig,
        ledger: MemoryLedger,
        csp: Arc<dyn Csp>,
        verifier: Arc<dyn CredentialVerifier>,
        converters: ConverterRegistry,
    ) -> Self {
        let registry = Arc::new(EnclaveRegistry::new(verifier));
        let endorser = Arc::new(Endorser::new(registry.clone(), Validator::new(csp)));
        Self {
            config,
            ledger,
            registry: Arc::new(RegistryChaincode::new(registry)),
            converters: Arc::new(converters),
            endorser,
            enclaves: RwLock::new(HashMap::new()),
        }
    }

    /// Peer wired from its configuration: verifiers and converters follow the
    /// attestation mode.
    pub fn from_config(config: PeerConfig, ledger: MemoryLedger, csp: Arc<dyn Csp>) -> PeerResult<Self> {
        config.validate()?;
        let verifier = config.attestation.verifier_registry(csp.clone())?;
        let converters = config.attestation.converter_registry()?;
        Ok(Self::new(config, ledger, csp, Arc::new(verifier), converters))
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn registry(&self) -> Arc<EnclaveRegistry> {
        self.registry.registry().clone()
    }

    /// Installs the enclave chaincode for `program_id`.
    pub fn install(&self, program_id: &str, enclave: Arc<dyn EnclaveRuntime>) -> PeerResult<()> {
        if program_id == REGISTRY_PROGRAM_ID {
            return Err(PeerError::Config(format!("{} is reserved for the registry", program_id)));
        }
        let chaincode = EnclaveChaincode::new(
            program_id,
            enclave,
            self.config.host_params(),
            self.config.attestation.attestation_params(),
            self.converters.clone(),
            self.registry.clone(),
            self.endorser.clone(),
            self.ledger.clone(),
        );
        info!(program_id, "Installed enclave chaincode");
        self.enclaves
            .write()
            .insert(program_id.to_string(), Arc::new(chaincode));
        Ok(())
    }

    /// Executes a signed proposal against the chaincode it names.
    pub async fn execute(&self, signed_proposal: &SignedProposal) -> ChaincodeResponse {
        let result = self.dispatch(signed_proposal).await;
        if let Err(e) = &result {
            warn!(error = %e, kind = %e.kind(), "Chaincode call failed");
        }
        result.into()
    }

    async fn dispatch(&self, signed_proposal: &SignedProposal) -> PeerResult<Vec<u8>> {
        let proposal = signed_proposal.proposal()?;
        let header = proposal.header.clone().unwrap_or_default();
        if header.channel_id != self.config.channel_id {
            return Err(PeerError::WrongChannel {
                expected: self.config.channel_id.clone(),
                actual: header.channel_id,
            });
        }
        let creator = SerializedIdentity::decode_bytes(&header.creator)?;
        let function = proposal
            .function()
            .ok_or_else(|| PeerError::UnknownFunction(String::new()))?
            .to_string();
        let args = proposal.string_args()?;
        debug!(
            program_id = %proposal.program_id,
            function = %function,
            tx_id = %header.tx_id,
            creator = %creator.msp_id,
            "Executing proposal"
        );

        let stub = TxStub::new(&self.ledger, &proposal.program_id, &self.config.channel_id, &creator)
            .with_tx_id(header.tx_id)
            .with_signed_proposal(signed_proposal.clone());

        if proposal.program_id == REGISTRY_PROGRAM_ID {
            return self.registry.invoke(&stub, &function, &args);
        }
        let chaincode = self
            .enclaves
            .read()
            .get(&proposal.program_id)
            .cloned()
            .ok_or_else(|| PeerError::UnknownProgram(proposal.program_id.clone()))?;
        chaincode.invoke(&stub, &function, &args).await
    }
}
