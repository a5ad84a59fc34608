//! Enclave chaincode: the host side of one enclave-backed program.

use std::sync::Arc;

use tracing::{debug, info};
use veil_attestation::{AttestationParams, ConverterRegistry};
use veil_enclave::EnclaveRuntime;
use veil_endorsement::Endorser;
use veil_storage::{ChaincodeStub, MemoryLedger, TxStub};
use veil_types::{Credentials, HostParams, SerializedIdentity, TypesError, INVOKE_FUNCTION};

use crate::chaincode::registry::{RegistryChaincode, REGISTER_ENCLAVE};
use crate::chaincode::{expect_args, REGISTRY_PROGRAM_ID};
use crate::error::{PeerError, PeerResult};

pub const INIT_ENCLAVE: &str = "__initEnclave";
pub const ENDORSE: &str = "__endorse";
pub const SETUP: &str = "__setup";

pub struct EnclaveChaincode {
    program_id: String,
    enclave: Arc<dyn EnclaveRuntime>,
    host: HostParams,
    default_params: AttestationParams,
    converters: Arc<ConverterRegistry>,
    registry: Arc<RegistryChaincode>,
    endorser: Arc<Endorser>,
    ledger: MemoryLedger,
}

impl EnclaveChaincode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        program_id: impl Into<String>,
        enclave: Arc<dyn EnclaveRuntime>,
        host: HostParams,
        default_params: AttestationParams,
        converters: Arc<ConverterRegistry>,
        registry: Arc<RegistryChaincode>,
        endorser: Arc<Endorser>,
        ledger: MemoryLedger,
    ) -> Self {
        Self {
            program_id: program_id.into(),
            enclave,
            host,
            default_params,
            converters,
            registry,
            endorser,
            ledger,
        }
    }

    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    pub async fn invoke(&self, stub: &dyn ChaincodeStub, function: &str, args: &[String]) -> PeerResult<Vec<u8>> {
        match function {
            INIT_ENCLAVE => {
                let credentials = self.init_enclave(stub, args).await?;
                Ok(credentials.to_base64().into_bytes())
            }
            INVOKE_FUNCTION => {
                expect_args::<1>(function, args)?;
                self.invoke_enclave(stub).await.map(String::into_bytes)
            }
            ENDORSE => {
                let [response] = expect_args::<1>(function, args)?;
                let state = self.ledger.namespace(REGISTRY_PROGRAM_ID);
                self.endorser
                    .endorse(&state, stub, &self.program_id, response, &self.host.operator_id)?;
                Ok(b"OK".to_vec())
            }
            SETUP => self.setup(stub, args).await.map(String::into_bytes),
            other => Err(PeerError::UnknownFunction(other.to_string())),
        }
    }

    fn attestation_params(&self, args: &[String]) -> PeerResult<AttestationParams> {
        match args {
            [] => Ok(self.default_params.clone()),
            [json] if json.trim().is_empty() => Ok(self.default_params.clone()),
            [json] => Ok(AttestationParams::from_json(json)?),
            _ => Err(PeerError::Arguments {
                function: INIT_ENCLAVE.to_string(),
                expected: 1,
                actual: args.len(),
            }),
        }
    }

    /// Initializes the enclave for the committed definition.
    async fn init_enclave(&self, stub: &dyn ChaincodeStub, args: &[String]) -> PeerResult<Credentials> {
        let params = self.attestation_params(args)?;
        let definition = stub
            .program_definition(&self.program_id)?
            .ok_or_else(|| PeerError::UnknownProgram(self.program_id.clone()))?;
        let credentials = self
            .enclave
            .init(definition.program_params(stub.channel_id()), self.host.clone(), &params)
            .await?;
        Ok(credentials)
    }

    async fn invoke_enclave(&self, stub: &dyn ChaincodeStub) -> PeerResult<String> {
        let signed_proposal = stub
            .signed_proposal()
            .ok_or(TypesError::MissingField("signed proposal"))?;
        let request = signed_proposal.proposal()?.request_bytes()?;
        debug!(program_id = %self.program_id, tx_id = %stub.tx_id(), "Forwarding request to enclave");
        let state = self.ledger.namespace(self.program_id.as_str());
        let response = self.enclave.invoke(&state, signed_proposal, &request).await?;
        Ok(response.to_base64())
    }

    /// Initializes, converts the attestation and registers the enclave; returns its id.
    async fn setup(&self, stub: &dyn ChaincodeStub, args: &[String]) -> PeerResult<String> {
        let credentials = self.init_enclave(stub, args).await?;
        let credentials = self.converters.convert_credentials(credentials).await?;
        let enclave_id = credentials.attested_data()?.enclave_id();

        let creator = SerializedIdentity::decode_bytes(stub.creator())?;
        let registry_stub = TxStub::new(&self.ledger, REGISTRY_PROGRAM_ID, stub.channel_id(), &creator)
            .with_tx_id(stub.tx_id());
        self.registry
            .invoke(&registry_stub, REGISTER_ENCLAVE, &[credentials.to_base64()])?;

        info!(program_id = %self.program_id, enclave_id = %enclave_id, "Enclave set up");
        Ok(enclave_id)
    }
}
