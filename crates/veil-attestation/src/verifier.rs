//! Evidence verification.
//!
//! ```text
//! Credentials (evidence + attested statement)
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────┐
//! │  VerifierRegistry: scheme tag → verifier     │
//! │    1. report signed by pinned authority      │
//! │    2. measurement == expected measurement    │
//! │    3. report data binds the statement, which │
//! │       carries the enclave verification key   │
//! └──────────────────────────────────────────────┘
//!        │
//!        ▼
//!   Accept or reject
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use veil_types::Credentials;

use crate::envelope::{AttestationEnvelope, EvidenceEnvelope, SIMULATED};
use crate::error::{AttestationError, AttestationResult};

/// What a report must prove.
#[derive(Debug, Clone, Copy)]
pub struct ExpectedValues<'a> {
    /// Hex-encoded expected program measurement
    pub measurement: &'a str,
    /// Serialized attested data; its hash must be bound into the report.
    /// It contains the enclave verification key, so binding it binds the key.
    pub statement: &'a [u8],
}

/// Verifier for one attestation scheme.
pub trait SchemeVerifier: Send + Sync {
    fn scheme(&self) -> &str;

    fn verify(&self, evidence: &str, expected: &ExpectedValues<'_>) -> AttestationResult<()>;
}

/// Checks registration credentials against an expected measurement.
pub trait CredentialVerifier: Send + Sync {
    fn verify_credentials(&self, credentials: &Credentials, expected_measurement: &str) -> AttestationResult<()>;
}

/// Accepts every report. Debug deployments only.
#[derive(Debug, Default)]
pub struct SimulatedVerifier;

impl SchemeVerifier for SimulatedVerifier {
    fn scheme(&self) -> &str {
        SIMULATED
    }

    fn verify(&self, _evidence: &str, expected: &ExpectedValues<'_>) -> AttestationResult<()> {
        warn!(
            measurement = %expected.measurement,
            "Accepting simulated attestation; not for production"
        );
        Ok(())
    }
}

/// Explicit mapping from scheme tag to verifier, built once at startup.
#[derive(Default, Clone)]
pub struct VerifierRegistry {
    verifiers: HashMap<String, Arc<dyn SchemeVerifier>>,
}

impl VerifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SchemeVerifier>) -> Self {
        self.register(verifier);
        self
    }

    /// Registers a verifier, replacing any previous one for the same scheme.
    pub fn register(&mut self, verifier: Arc<dyn SchemeVerifier>) {
        debug!(scheme = %verifier.scheme(), "Registering attestation verifier");
        self.verifiers.insert(verifier.scheme().to_string(), verifier);
    }

    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<_> = self.verifiers.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Dispatches `evidence` to the verifier registered for its scheme.
    pub fn verify(&self, evidence: &EvidenceEnvelope, expected: &ExpectedValues<'_>) -> AttestationResult<()> {
        let verifier = self
            .verifiers
            .get(&evidence.attestation_type)
            .ok_or_else(|| AttestationError::UnsupportedScheme(evidence.attestation_type.clone()))?;
        verifier.verify(&evidence.evidence, expected)
    }
}

impl CredentialVerifier for VerifierRegistry {
    fn verify_credentials(&self, credentials: &Credentials, expected_measurement: &str) -> AttestationResult<()> {
        if credentials.evidence.is_empty() {
            return Err(AttestationError::InvalidEvidence("empty evidence".to_string()));
        }
        let evidence = EvidenceEnvelope::from_bytes(&credentials.evidence)?;
        if !credentials.attestation.is_empty() {
            let attestation = AttestationEnvelope::from_bytes(&credentials.attestation)?;
            if attestation.attestation_type != evidence.attestation_type {
                return Err(AttestationError::InvalidEvidence(format!(
                    "attestation scheme {} does not match evidence scheme {}",
                    attestation.attestation_type, evidence.attestation_type
                )));
            }
        }

        let statement = credentials.attested_data_bytes()?;
        let expected = ExpectedValues {
            measurement: expected_measurement,
            statement,
        };
        self.verify(&evidence, &expected)?;
        debug!(scheme = %evidence.attestation_type, "Evidence verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_types::AttestedData;

    struct RejectAll;

    impl SchemeVerifier for RejectAll {
        fn scheme(&self) -> &str {
            "reject"
        }

        fn verify(&self, _evidence: &str, _expected: &ExpectedValues<'_>) -> AttestationResult<()> {
            Err(AttestationError::InvalidSignature)
        }
    }

    fn credentials(scheme: &str) -> Credentials {
        let evidence = EvidenceEnvelope {
            attestation_type: scheme.to_string(),
            evidence: String::new(),
        };
        Credentials::new(&AttestedData::default(), Vec::new()).with_evidence(evidence.to_bytes().unwrap())
    }

    #[test]
    fn test_dispatch_by_scheme() {
        let registry = VerifierRegistry::new()
            .with_verifier(Arc::new(SimulatedVerifier))
            .with_verifier(Arc::new(RejectAll));
        assert_eq!(registry.schemes(), vec!["reject".to_string(), SIMULATED.to_string()]);

        registry.verify_credentials(&credentials(SIMULATED), "00").unwrap();
        assert!(matches!(
            registry.verify_credentials(&credentials("reject"), "00"),
            Err(AttestationError::InvalidSignature)
        ));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let registry = VerifierRegistry::new().with_verifier(Arc::new(SimulatedVerifier));
        let err = registry.verify_credentials(&credentials("sev-snp"), "00").unwrap_err();
        assert!(matches!(err, AttestationError::UnsupportedScheme(ref s) if s == "sev-snp"));
    }

    #[test]
    fn test_empty_evidence_rejected() {
        let registry = VerifierRegistry::new().with_verifier(Arc::new(SimulatedVerifier));
        let creds = Credentials::new(&AttestedData::default(), Vec::new());
        assert!(matches!(
            registry.verify_credentials(&creds, "00"),
            Err(AttestationError::InvalidEvidence(_))
        ));
    }

    #[test]
    fn test_attestation_and_evidence_scheme_must_agree() {
        let registry = VerifierRegistry::new().with_verifier(Arc::new(SimulatedVerifier));
        let mut creds = credentials(SIMULATED);
        creds.attestation = AttestationEnvelope {
            attestation_type: "epid-linkable".into(),
            attestation: String::new(),
        }
        .to_bytes()
        .unwrap();
        assert!(registry.verify_credentials(&creds, "00").is_err());
    }
}
