//! Endorsement of enclave responses.

use std::sync::Arc;

use tracing::{info, warn};
use veil_registry::EnclaveRegistry;
use veil_storage::{ChaincodeStub, LedgerState};
use veil_types::{parse_measurement, ProgramParams, SignedChaincodeResponseMessage};

use crate::error::{EndorsementError, EndorsementResult, ValidationError};
use crate::replay::replay_read_writes;
use crate::validator::Validator;

pub struct Endorser {
    registry: Arc<EnclaveRegistry>,
    validator: Validator,
}

impl Endorser {
    pub fn new(registry: Arc<EnclaveRegistry>, validator: Validator) -> Self {
        Self { registry, validator }
    }

    /// Endorses a base64 signed response on behalf of the peer run by `operator_id`.
    ///
    /// `program_id` is the program whose chaincode is endorsing and `stub` is
    /// that program's namespace, which receives the replayed writes.
    /// `registry_state` holds the registered credentials. Returns the id of the
    /// enclave that produced the response.
    pub fn endorse(
        &self,
        registry_state: &dyn LedgerState,
        stub: &dyn ChaincodeStub,
        program_id: &str,
        signed_response_base64: &str,
        operator_id: &str,
    ) -> EndorsementResult<String> {
        let signed = SignedChaincodeResponseMessage::from_base64(signed_response_base64)?;
        let response = signed.response()?;
        let proposal = response
            .proposal
            .as_ref()
            .ok_or(ValidationError::MissingProposal)?
            .proposal()?;
        let channel_id = stub.channel_id();
        if proposal.program_id != program_id {
            warn!(
                program_id,
                response_program_id = %proposal.program_id,
                "Response belongs to another program"
            );
            return Err(EndorsementError::ProgramMismatch {
                program_id: proposal.program_id.clone(),
                channel_id: channel_id.to_string(),
            });
        }

        let credentials = self
            .registry
            .get_credentials(registry_state, program_id, &response.enclave_id)?;
        let attested = credentials.attested_data()?;

        let definition = stub
            .program_definition(program_id)?
            .ok_or_else(|| EndorsementError::UnknownProgram(program_id.to_string()))?;
        let expected = definition.program_params(channel_id);
        if !attested.program_params.as_ref().is_some_and(|p| same_program(p, &expected)) {
            warn!(program_id, channel_id, enclave_id = %response.enclave_id, "Attested program identity mismatch");
            return Err(EndorsementError::ProgramMismatch {
                program_id: program_id.to_string(),
                channel_id: channel_id.to_string(),
            });
        }

        let operator = attested
            .host_params
            .as_ref()
            .map(|h| h.operator_id.as_str())
            .unwrap_or_default();
        if operator != operator_id || !definition.endorsement_policy.admits(operator) {
            return Err(EndorsementError::HostNotApproved {
                operator: operator.to_string(),
                program_id: program_id.to_string(),
            });
        }

        let validated = self.validator.validate(&signed, &attested)?;
        replay_read_writes(stub.as_state(), validated.rw_set.as_ref())?;

        info!(program_id, enclave_id = %validated.enclave_id, tx_id = %stub.tx_id(), "Response endorsed");
        Ok(validated.enclave_id)
    }
}

/// Same program, channel and sequence; measurements compare as decoded bytes.
fn same_program(attested: &ProgramParams, expected: &ProgramParams) -> bool {
    attested.program_id == expected.program_id
        && attested.channel_id == expected.channel_id
        && attested.sequence == expected.sequence
        && parse_measurement(&attested.measurement).is_some()
        && parse_measurement(&attested.measurement) == parse_measurement(&expected.measurement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_attestation::{AttestationParams, EvidenceEnvelope, SimulatedIssuer, SimulatedVerifier, VerifierRegistry, SIMULATED};
    use veil_crypto::{Csp, SoftwareCsp};
    use veil_enclave::{EnclaveError, EnclaveResult, EnclaveRuntime, Program, ProgramStub, SoftwareEnclave};
    use veil_storage::{MemoryLedger, TxStub};
    use veil_types::{
        to_base64, ChaincodeRequestMessage, CleartextRequest, EndorsementPolicy, ErrorKind, HostParams, Message,
        ProgramDefinition, Proposal, SerializedIdentity,
    };

    const CHANNEL: &str = "mychannel";

    /// Increments a counter key.
    struct Counter;

    impl Program for Counter {
        fn invoke(&self, stub: &mut dyn ProgramStub, _function: &str, _args: &[String]) -> EnclaveResult<Vec<u8>> {
            let current = stub
                .get_state("count")?
                .map(|v| String::from_utf8_lossy(&v).parse::<u64>())
                .transpose()
                .map_err(|e| EnclaveError::Program(e.to_string()))?
                .unwrap_or(0);
            stub.put_state("count", (current + 1).to_string().into_bytes())?;
            Ok(b"OK".to_vec())
        }
    }

    struct Network {
        ledger: MemoryLedger,
        csp: Arc<dyn Csp>,
        enclave: SoftwareEnclave,
        registry: Arc<EnclaveRegistry>,
        program_ek: Vec<u8>,
    }

    fn creator() -> SerializedIdentity {
        SerializedIdentity::new("Org1MSP", b"peer0".to_vec())
    }

    async fn network() -> Network {
        network_attesting(&"11".repeat(32), &"11".repeat(32)).await
    }

    /// Network whose enclave attests `attested_measurement` for a program defined with `measurement`.
    async fn network_attesting(measurement: &str, attested_measurement: &str) -> Network {
        let ledger = MemoryLedger::new();
        let definition = ProgramDefinition::new("counter", measurement, 1)
            .with_policy(EndorsementPolicy::any_of(["Org1MSP"]));
        ledger.define_program(definition.clone());
        let mut params = definition.program_params(CHANNEL);
        params.measurement = attested_measurement.to_string();

        let csp: Arc<dyn Csp> = Arc::new(SoftwareCsp::new());
        let enclave = SoftwareEnclave::new(Arc::new(Counter), csp.clone(), Arc::new(SimulatedIssuer));
        let host = HostParams {
            operator_id: "Org1MSP".into(),
            host_endpoint: "peer0:7051".into(),
            host_identity: Vec::new(),
        };
        let credentials = enclave
            .init(params, host, &AttestationParams::simulated())
            .await
            .unwrap();
        let evidence = EvidenceEnvelope {
            attestation_type: SIMULATED.into(),
            evidence: String::new(),
        };
        let credentials = credentials.with_evidence(evidence.to_bytes().unwrap());
        let program_ek = credentials.attested_data().unwrap().program_ek;

        let registry = Arc::new(EnclaveRegistry::new(Arc::new(
            VerifierRegistry::new().with_verifier(Arc::new(SimulatedVerifier)),
        )));
        let ercc = TxStub::new(&ledger, "ercc", CHANNEL, &creator());
        registry.register_enclave(&ercc, &credentials.to_base64()).unwrap();

        Network {
            ledger,
            csp,
            enclave,
            registry,
            program_ek,
        }
    }

    impl Network {
        async fn invoke(&self) -> String {
            let request_key = self.csp.new_symmetric_key().unwrap();
            let cleartext = CleartextRequest {
                function: "inc".into(),
                args: Vec::new(),
                response_encryption_key: self.csp.new_symmetric_key().unwrap().to_vec(),
            };
            let request = ChaincodeRequestMessage {
                encrypted_request: self.csp.encrypt(&request_key, &cleartext.encode_to_vec()).unwrap(),
                encrypted_request_key: self.csp.pk_encrypt(&self.program_ek, &request_key).unwrap(),
            }
            .encode_to_vec();
            let proposal =
                Proposal::invoke(CHANNEL, "tx-2", &creator(), "counter", &to_base64(&request)).sign_with(Vec::new());
            self.enclave
                .invoke(&self.ledger.namespace("counter"), &proposal, &request)
                .await
                .unwrap()
                .to_base64()
        }

        fn endorser(&self) -> Endorser {
            Endorser::new(self.registry.clone(), Validator::new(self.csp.clone()))
        }

        fn endorse(&self, response: &str, operator: &str) -> EndorsementResult<String> {
            let stub = TxStub::new(&self.ledger, "counter", CHANNEL, &creator());
            self.endorser()
                .endorse(&self.ledger.namespace("ercc"), &stub, "counter", response, operator)
        }
    }

    #[tokio::test]
    async fn test_endorse_replays_writes() {
        let net = network().await;
        let response = net.invoke().await;
        net.endorse(&response, "Org1MSP").unwrap();
        assert_eq!(net.ledger.namespace("counter").get_state("count").unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_stale_response_rejected() {
        let net = network().await;
        let first = net.invoke().await;
        let stale = net.invoke().await;
        net.endorse(&first, "Org1MSP").unwrap();

        let err = net.endorse(&stale, "Org1MSP").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Replay);
        assert_eq!(net.ledger.namespace("counter").get_state("count").unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_unapproved_host_rejected() {
        let net = network().await;
        let response = net.invoke().await;
        let err = net.endorse(&response, "Org2MSP").unwrap_err();
        assert!(matches!(err, EndorsementError::HostNotApproved { .. }));
    }

    #[tokio::test]
    async fn test_upgraded_definition_rejects_old_enclave() {
        let net = network().await;
        let response = net.invoke().await;
        net.ledger.define_program(
            ProgramDefinition::new("counter", "11".repeat(32), 2).with_policy(EndorsementPolicy::any_of(["Org1MSP"])),
        );
        let err = net.endorse(&response, "Org1MSP").unwrap_err();
        assert!(matches!(err, EndorsementError::ProgramMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[tokio::test]
    async fn test_unregistered_enclave_rejected() {
        let net = network().await;
        let response = net.invoke().await;
        let empty = MemoryLedger::new();
        let stub = TxStub::new(&net.ledger, "counter", CHANNEL, &creator());
        let err = net
            .endorser()
            .endorse(&empty.namespace("ercc"), &stub, "counter", &response, "Org1MSP")
            .unwrap_err();
        assert!(matches!(err, EndorsementError::Registry(_)));
    }

    #[tokio::test]
    async fn test_response_of_another_program_rejected() {
        let net = network().await;
        net.ledger.define_program(
            ProgramDefinition::new("other", "11".repeat(32), 1).with_policy(EndorsementPolicy::any_of(["Org1MSP"])),
        );
        let response = net.invoke().await;

        let stub = TxStub::new(&net.ledger, "other", CHANNEL, &creator());
        let err = net
            .endorser()
            .endorse(&net.ledger.namespace("ercc"), &stub, "other", &response, "Org1MSP")
            .unwrap_err();
        assert!(matches!(err, EndorsementError::ProgramMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert_eq!(net.ledger.key_count("other"), 0);
        assert_eq!(net.ledger.key_count("counter"), 0);
    }

    #[tokio::test]
    async fn test_measurement_case_does_not_matter() {
        let measurement = "ab".repeat(32);
        let net = network_attesting(&measurement, &measurement.to_uppercase()).await;
        let response = net.invoke().await;
        net.endorse(&response, "Org1MSP").unwrap();
        assert_eq!(net.ledger.namespace("counter").get_state("count").unwrap(), Some(b"1".to_vec()));
    }
}
