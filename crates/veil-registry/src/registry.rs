//! Enclave registry.
//!
//! Admits an enclave only after its credentials have been checked against
//! the committed program definition, its attestation evidence and the
//! identity of the submitting host. Admitted credentials are stored under
//! `("namespaces/credentials", [program_id, enclave_id])` and never updated.

use std::sync::Arc;

use tracing::{debug, info, warn};
use veil_attestation::CredentialVerifier;
use veil_storage::{ChaincodeStub, LedgerState};
use veil_types::keys::{create_composite_key, split_composite_key};
use veil_types::{parse_measurement, Credentials, Message, ProgramDefinition, ProgramParams, SerializedIdentity};

use crate::error::{RegistryError, RegistryResult};
use crate::identity::{IdentityEvaluator, MspIdentityEvaluator};

pub const CREDENTIALS_KEY_TYPE: &str = "namespaces/credentials";
pub const PROVISIONED_KEY_TYPE: &str = "namespaces/provisioned";

pub struct EnclaveRegistry {
    verifier: Arc<dyn CredentialVerifier>,
    identity: Arc<dyn IdentityEvaluator>,
}

impl EnclaveRegistry {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            identity: Arc::new(MspIdentityEvaluator),
        }
    }

    pub fn with_identity_evaluator(mut self, identity: Arc<dyn IdentityEvaluator>) -> Self {
        self.identity = identity;
        self
    }

    /// Validates and stores base64 credentials; returns the admitted enclave id.
    pub fn register_enclave(&self, stub: &dyn ChaincodeStub, credentials_base64: &str) -> RegistryResult<String> {
        if credentials_base64.trim().is_empty() {
            return Err(RegistryError::EmptyCredentials);
        }
        let credentials = Credentials::from_base64(credentials_base64)?;
        if credentials.serialized_attested_data.is_none() {
            return Err(RegistryError::MissingAttestedData);
        }
        let attested = credentials.attested_data()?;
        if credentials.evidence.is_empty() {
            return Err(RegistryError::MissingEvidence);
        }
        let params = attested
            .program_params
            .as_ref()
            .ok_or(RegistryError::MissingParams("program params"))?;

        let definition = stub
            .program_definition(&params.program_id)?
            .ok_or_else(|| RegistryError::UnknownProgram(params.program_id.clone()))?;
        check_program_params(params, &definition, stub.channel_id())?;

        self.verifier
            .verify_credentials(&credentials, &definition.measurement)?;

        let host = attested
            .host_params
            .as_ref()
            .ok_or(RegistryError::MissingParams("host params"))?;
        let creator = SerializedIdentity::decode_bytes(stub.creator())?;
        self.identity
            .evaluate(&creator, host, &definition.endorsement_policy)?;

        let enclave_id = attested.enclave_id();
        let program_id = params.program_id.as_str();
        let key = create_composite_key(CREDENTIALS_KEY_TYPE, &[program_id, &enclave_id])?;
        let encoded = credentials.encode_to_vec();

        if let Some(existing) = stub.get_state(&key)? {
            if existing == encoded {
                debug!(program_id, enclave_id = %enclave_id, "Identical credentials already registered");
                return Ok(enclave_id);
            }
            warn!(program_id, enclave_id = %enclave_id, "Conflicting re-registration rejected");
            return Err(RegistryError::ConflictingRegistration { enclave_id });
        }
        if let Some(existing) = registered_enclave_ids(stub.as_state(), program_id)?.into_iter().next() {
            warn!(program_id, existing = %existing, enclave_id = %enclave_id, "Program already has an enclave");
            return Err(RegistryError::EnclaveAlreadyDesignated {
                program_id: program_id.to_string(),
                existing,
            });
        }

        stub.put_state(&key, encoded)?;
        let marker = create_composite_key(PROVISIONED_KEY_TYPE, &[program_id, &enclave_id])?;
        stub.put_state(&marker, stub.tx_id().as_bytes().to_vec())?;

        info!(
            program_id,
            enclave_id = %enclave_id,
            operator = %host.operator_id,
            endpoint = %host.host_endpoint,
            "Enclave registered"
        );
        Ok(enclave_id)
    }

    pub fn get_credentials(
        &self,
        state: &dyn LedgerState,
        program_id: &str,
        enclave_id: &str,
    ) -> RegistryResult<Credentials> {
        let key = create_composite_key(CREDENTIALS_KEY_TYPE, &[program_id, enclave_id])?;
        let bytes = state
            .get_state(&key)?
            .ok_or_else(|| RegistryError::CredentialsNotFound {
                program_id: program_id.to_string(),
                enclave_id: enclave_id.to_string(),
            })?;
        Ok(Credentials::decode_bytes(&bytes)?)
    }

    /// All credentials registered for `program_id`, ordered by enclave id.
    pub fn list_credentials(&self, state: &dyn LedgerState, program_id: &str) -> RegistryResult<Vec<Credentials>> {
        state
            .state_by_partial_composite_key(CREDENTIALS_KEY_TYPE, &[program_id])?
            .into_iter()
            .map(|(_, bytes)| Credentials::decode_bytes(&bytes).map_err(RegistryError::from))
            .collect()
    }

    /// Enclave ids carrying a provisioning marker for `program_id`.
    pub fn list_provisioned(&self, state: &dyn LedgerState, program_id: &str) -> RegistryResult<Vec<String>> {
        marker_enclave_ids(state, PROVISIONED_KEY_TYPE, program_id)
    }

    /// Program encryption key taken from a registered enclave's attested data.
    pub fn get_encryption_key(&self, state: &dyn LedgerState, program_id: &str) -> RegistryResult<Vec<u8>> {
        for credentials in self.list_credentials(state, program_id)? {
            let attested = credentials.attested_data()?;
            if !attested.program_ek.is_empty() {
                return Ok(attested.program_ek);
            }
        }
        Err(RegistryError::NoEnclave(program_id.to_string()))
    }

    /// Host endpoints of every registered enclave, comma separated.
    pub fn endpoints(&self, state: &dyn LedgerState, program_id: &str) -> RegistryResult<String> {
        let mut endpoints = Vec::new();
        for credentials in self.list_credentials(state, program_id)? {
            if let Some(host) = credentials.attested_data()?.host_params {
                endpoints.push(host.host_endpoint);
            }
        }
        Ok(endpoints.join(","))
    }
}

fn check_program_params(params: &ProgramParams, definition: &ProgramDefinition, channel_id: &str) -> RegistryResult<()> {
    if params.channel_id != channel_id {
        return Err(RegistryError::ChannelMismatch {
            expected: channel_id.to_string(),
            actual: params.channel_id.clone(),
        });
    }
    let expected = parse_measurement(&definition.measurement).ok_or_else(|| RegistryError::InvalidMeasurement {
        program_id: definition.program_id.clone(),
        measurement: definition.measurement.clone(),
    })?;
    if parse_measurement(&params.measurement) != Some(expected) {
        return Err(RegistryError::MeasurementMismatch {
            expected: definition.measurement.clone(),
            actual: params.measurement.clone(),
        });
    }
    if params.sequence != definition.sequence {
        return Err(RegistryError::SequenceMismatch {
            expected: definition.sequence,
            actual: params.sequence,
        });
    }
    Ok(())
}

fn registered_enclave_ids(state: &dyn LedgerState, program_id: &str) -> RegistryResult<Vec<String>> {
    marker_enclave_ids(state, CREDENTIALS_KEY_TYPE, program_id)
}

fn marker_enclave_ids(state: &dyn LedgerState, key_type: &str, program_id: &str) -> RegistryResult<Vec<String>> {
    let mut ids = Vec::new();
    for (key, _) in state.state_by_partial_composite_key(key_type, &[program_id])? {
        let (_, attributes) = split_composite_key(&key)?;
        if let [_, enclave_id] = attributes.as_slice() {
            ids.push(enclave_id.clone());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_attestation::{
        AttestationEnvelope, AttestationError, AttestationResult, EvidenceEnvelope, SimulatedVerifier,
        VerifierRegistry, SIMULATED,
    };
    use veil_crypto::{MessageSigner, SoftwareCsp, KeyWrapper};
    use veil_storage::{MemoryLedger, TxStub};
    use veil_types::{AttestedData, EndorsementPolicy, ErrorKind, HostParams};

    const CHANNEL: &str = "mychannel";

    fn measurement() -> String {
        "ab".repeat(32)
    }

    fn ledger() -> MemoryLedger {
        let ledger = MemoryLedger::new();
        ledger.define_program(
            ProgramDefinition::new("auction", measurement(), 1)
                .with_policy(EndorsementPolicy::any_of(["Org1MSP"])),
        );
        ledger
    }

    fn stub(ledger: &MemoryLedger, msp: &str) -> TxStub {
        TxStub::new(ledger, "ercc", CHANNEL, &SerializedIdentity::new(msp, b"peer0".to_vec())).with_tx_id("tx-1")
    }

    fn registry() -> EnclaveRegistry {
        EnclaveRegistry::new(Arc::new(VerifierRegistry::new().with_verifier(Arc::new(SimulatedVerifier))))
    }

    fn attested(measurement: &str, sequence: i64) -> AttestedData {
        let csp = SoftwareCsp::new();
        AttestedData {
            enclave_vk: csp.new_signing_keys().unwrap().public_key().to_vec(),
            program_params: Some(ProgramParams {
                program_id: "auction".into(),
                measurement: measurement.into(),
                sequence,
                channel_id: CHANNEL.into(),
            }),
            host_params: Some(HostParams {
                operator_id: "Org1MSP".into(),
                host_endpoint: "peer0.org1:7051".into(),
                host_identity: Vec::new(),
            }),
            program_ek: csp.new_encryption_keys().unwrap().public_key().to_vec(),
        }
    }

    fn credentials(attested: &AttestedData) -> Credentials {
        let attestation = AttestationEnvelope {
            attestation_type: SIMULATED.into(),
            attestation: String::new(),
        };
        let evidence = EvidenceEnvelope {
            attestation_type: SIMULATED.into(),
            evidence: String::new(),
        };
        Credentials::new(attested, attestation.to_bytes().unwrap()).with_evidence(evidence.to_bytes().unwrap())
    }

    #[test]
    fn test_register_and_query() {
        let ledger = ledger();
        let stub = stub(&ledger, "Org1MSP");
        let registry = registry();
        let attested = attested(&measurement(), 1);
        let creds = credentials(&attested);

        let enclave_id = registry.register_enclave(&stub, &creds.to_base64()).unwrap();
        assert_eq!(enclave_id, attested.enclave_id());

        assert_eq!(registry.get_credentials(&stub, "auction", &enclave_id).unwrap(), creds);
        assert_eq!(registry.list_credentials(&stub, "auction").unwrap(), vec![creds]);
        assert_eq!(registry.list_provisioned(&stub, "auction").unwrap(), vec![enclave_id]);
        assert_eq!(registry.get_encryption_key(&stub, "auction").unwrap(), attested.program_ek);
        assert_eq!(registry.endpoints(&stub, "auction").unwrap(), "peer0.org1:7051");
    }

    #[test]
    fn test_identical_registration_is_idempotent() {
        let ledger = ledger();
        let stub = stub(&ledger, "Org1MSP");
        let registry = registry();
        let blob = credentials(&attested(&measurement(), 1)).to_base64();

        registry.register_enclave(&stub, &blob).unwrap();
        registry.register_enclave(&stub, &blob).unwrap();
        assert_eq!(registry.list_credentials(&stub, "auction").unwrap().len(), 1);
        assert_eq!(ledger.key_count("ercc"), 2);
    }

    #[test]
    fn test_conflicting_registration_rejected() {
        let ledger = ledger();
        let stub = stub(&ledger, "Org1MSP");
        let registry = registry();
        let attested = attested(&measurement(), 1);
        registry.register_enclave(&stub, &credentials(&attested).to_base64()).unwrap();

        let mut changed = attested.clone();
        changed.host_params.as_mut().unwrap().host_endpoint = "elsewhere:7051".into();
        let err = registry
            .register_enclave(&stub, &credentials(&changed).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::ConflictingRegistration { .. }));
    }

    #[test]
    fn test_second_enclave_rejected() {
        let ledger = ledger();
        let stub = stub(&ledger, "Org1MSP");
        let registry = registry();
        registry
            .register_enclave(&stub, &credentials(&attested(&measurement(), 1)).to_base64())
            .unwrap();
        let err = registry
            .register_enclave(&stub, &credentials(&attested(&measurement(), 1)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::EnclaveAlreadyDesignated { .. }));
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_program_identity_mismatches() {
        let ledger = ledger();
        let registry = registry();

        let err = registry
            .register_enclave(&stub(&ledger, "Org1MSP"), &credentials(&attested(&"cd".repeat(32), 1)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::MeasurementMismatch { .. }));

        let err = registry
            .register_enclave(&stub(&ledger, "Org1MSP"), &credentials(&attested(&measurement(), 2)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::SequenceMismatch { expected: 1, actual: 2 }));

        let other_channel = TxStub::new(&ledger, "ercc", "otherchannel", &SerializedIdentity::new("Org1MSP", Vec::new()));
        let err = registry
            .register_enclave(&other_channel, &credentials(&attested(&measurement(), 1)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::ChannelMismatch { .. }));
        assert_eq!(ledger.key_count("ercc"), 0);
    }

    #[test]
    fn test_measurement_compared_as_bytes() {
        let ledger = ledger();
        let upper = measurement().to_uppercase();
        registry()
            .register_enclave(&stub(&ledger, "Org1MSP"), &credentials(&attested(&upper, 1)).to_base64())
            .unwrap();
    }

    #[test]
    fn test_malformed_definition_measurement() {
        let ledger = MemoryLedger::new();
        ledger.define_program(ProgramDefinition::new("auction", "not-hex", 1));
        let err = registry()
            .register_enclave(&stub(&ledger, "Org1MSP"), &credentials(&attested("not-hex", 1)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidMeasurement { .. }));
    }

    #[test]
    fn test_malformed_and_incomplete_input() {
        let ledger = ledger();
        let stub = stub(&ledger, "Org1MSP");
        let registry = registry();

        assert!(matches!(registry.register_enclave(&stub, ""), Err(RegistryError::EmptyCredentials)));
        assert_eq!(registry.register_enclave(&stub, "%%%").unwrap_err().kind(), ErrorKind::Input);

        let no_data = Credentials::default().with_evidence(b"{}".to_vec());
        assert!(matches!(
            registry.register_enclave(&stub, &no_data.to_base64()),
            Err(RegistryError::MissingAttestedData)
        ));

        let no_evidence = Credentials::new(&attested(&measurement(), 1), Vec::new());
        assert!(matches!(
            registry.register_enclave(&stub, &no_evidence.to_base64()),
            Err(RegistryError::MissingEvidence)
        ));

        let mut no_host = attested(&measurement(), 1);
        no_host.host_params = None;
        assert!(matches!(
            registry.register_enclave(&stub, &credentials(&no_host).to_base64()),
            Err(RegistryError::MissingParams("host params"))
        ));
    }

    #[test]
    fn test_unknown_program() {
        let ledger = MemoryLedger::new();
        let err = registry()
            .register_enclave(&stub(&ledger, "Org1MSP"), &credentials(&attested(&measurement(), 1)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownProgram(ref p) if p == "auction"));
    }

    #[test]
    fn test_submitter_must_be_host_operator() {
        let ledger = ledger();
        let err = registry()
            .register_enclave(&stub(&ledger, "Org2MSP"), &credentials(&attested(&measurement(), 1)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::HostMismatch { .. }));
        assert_eq!(ledger.key_count("ercc"), 0);
    }

    struct Rejecting;

    impl CredentialVerifier for Rejecting {
        fn verify_credentials(&self, _credentials: &Credentials, _expected: &str) -> AttestationResult<()> {
            Err(AttestationError::Timeout)
        }
    }

    #[test]
    fn test_attestation_failure_propagates() {
        let ledger = ledger();
        let err = EnclaveRegistry::new(Arc::new(Rejecting))
            .register_enclave(&stub(&ledger, "Org1MSP"), &credentials(&attested(&measurement(), 1)).to_base64())
            .unwrap_err();
        assert!(matches!(err, RegistryError::Attestation(AttestationError::Timeout)));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(ledger.key_count("ercc"), 0);
    }

    #[test]
    fn test_queries_on_empty_registry() {
        let ledger = ledger();
        let stub = stub(&ledger, "Org1MSP");
        let registry = registry();
        assert!(registry.list_credentials(&stub, "auction").unwrap().is_empty());
        assert_eq!(registry.endpoints(&stub, "auction").unwrap(), "");
        assert!(matches!(
            registry.get_encryption_key(&stub, "auction"),
            Err(RegistryError::NoEnclave(_))
        ));
        assert!(matches!(
            registry.get_credentials(&stub, "auction", "ABCD"),
            Err(RegistryError::CredentialsNotFound { .. })
        ));
    }
}
