//! Attestation → evidence conversion.
//!
//! The enclave issues an attestation; before registration it is converted into
//! evidence a verifier can check offline. For hardware schemes that means a
//! round-trip to the remote verification service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info};
use veil_types::Credentials;

use crate::envelope::{AttestationEnvelope, EvidenceEnvelope, EPID_LINKABLE, EPID_UNLINKABLE, SIMULATED};
use crate::error::{AttestationError, AttestationResult};
use crate::ias::RemoteAttestationService;

#[async_trait]
pub trait EvidenceConverter: Send + Sync {
    fn scheme(&self) -> &str;

    async fn convert(&self, attestation: &AttestationEnvelope) -> AttestationResult<EvidenceEnvelope>;
}

/// Simulated attestations are their own evidence.
#[derive(Debug, Default)]
pub struct SimulatedConverter;

#[async_trait]
impl EvidenceConverter for SimulatedConverter {
    fn scheme(&self) -> &str {
        SIMULATED
    }

    async fn convert(&self, attestation: &AttestationEnvelope) -> AttestationResult<EvidenceEnvelope> {
        Ok(EvidenceEnvelope {
            attestation_type: SIMULATED.to_string(),
            evidence: attestation.attestation.clone(),
        })
    }
}

/// Sends the quote to the remote verification service; the signed report is the evidence.
pub struct EpidConverter {
    scheme: &'static str,
    service: Arc<dyn RemoteAttestationService>,
}

impl EpidConverter {
    pub fn linkable(service: Arc<dyn RemoteAttestationService>) -> Self {
        Self {
            scheme: EPID_LINKABLE,
            service,
        }
    }

    pub fn unlinkable(service: Arc<dyn RemoteAttestationService>) -> Self {
        Self {
            scheme: EPID_UNLINKABLE,
            service,
        }
    }
}

#[async_trait]
impl EvidenceConverter for EpidConverter {
    fn scheme(&self) -> &str {
        self.scheme
    }

    async fn convert(&self, attestation: &AttestationEnvelope) -> AttestationResult<EvidenceEnvelope> {
        let quote = STANDARD
            .decode(attestation.attestation.trim())
            .map_err(|e| AttestationError::InvalidEvidence(format!("quote: {}", e)))?;
        let report = self.service.verify_quote(&quote).await?;
        Ok(EvidenceEnvelope {
            attestation_type: self.scheme.to_string(),
            evidence: report.to_json()?,
        })
    }
}

/// Explicit mapping from scheme tag to converter.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn EvidenceConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converter(mut self, converter: Arc<dyn EvidenceConverter>) -> Self {
        debug!(scheme = %converter.scheme(), "Registering evidence converter");
        self.converters.insert(converter.scheme().to_string(), converter);
        self
    }

    pub async fn convert(&self, attestation: &AttestationEnvelope) -> AttestationResult<EvidenceEnvelope> {
        let converter = self
            .converters
            .get(&attestation.attestation_type)
            .ok_or_else(|| AttestationError::UnsupportedScheme(attestation.attestation_type.clone()))?;
        converter.convert(attestation).await
    }

    /// Fills in the evidence of freshly issued credentials.
    pub async fn convert_credentials(&self, credentials: Credentials) -> AttestationResult<Credentials> {
        let attestation = AttestationEnvelope::from_bytes(&credentials.attestation)?;
        let evidence = self.convert(&attestation).await?;
        info!(scheme = %evidence.attestation_type, "Attestation converted to evidence");
        Ok(credentials.with_evidence(evidence.to_bytes()?))
    }
}
