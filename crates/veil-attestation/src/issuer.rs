//! Enclave-side attestation issuing.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;
use veil_types::{sha256, MEASUREMENT_LEN};

use crate::envelope::{AttestationEnvelope, AttestationParams, SIMULATED};
use crate::error::{AttestationError, AttestationResult};
use crate::quote::{report_data_for, sign_type_for, QuoteBody};

pub trait AttestationIssuer: Send + Sync {
    /// Attests to `statement` under the scheme named in `params`.
    fn issue(&self, params: &AttestationParams, statement: &[u8]) -> AttestationResult<AttestationEnvelope>;
}

/// Issues simulated attestations; no hardware involved.
#[derive(Debug, Default)]
pub struct SimulatedIssuer;

impl AttestationIssuer for SimulatedIssuer {
    fn issue(&self, params: &AttestationParams, statement: &[u8]) -> AttestationResult<AttestationEnvelope> {
        if params.attestation_type != SIMULATED {
            return Err(AttestationError::UnsupportedScheme(params.attestation_type.clone()));
        }
        Ok(AttestationEnvelope {
            attestation_type: SIMULATED.to_string(),
            attestation: STANDARD.encode(sha256(statement)),
        })
    }
}

/// Produces quote bodies in the EPID layout for a fixed measurement.
///
/// Stands in for the platform quoting enclave in software deployments; it can
/// also issue simulated attestations so one enclave serves both modes.
#[derive(Debug, Clone)]
pub struct SoftwareQuoteIssuer {
    measurement: [u8; MEASUREMENT_LEN],
}

impl SoftwareQuoteIssuer {
    pub fn new(measurement: [u8; MEASUREMENT_LEN]) -> Self {
        Self { measurement }
    }

    pub fn from_hex(measurement: &str) -> AttestationResult<Self> {
        veil_types::parse_measurement(measurement)
            .map(Self::new)
            .ok_or_else(|| AttestationError::Config(format!("measurement {:?} is not 32-byte hex", measurement)))
    }
}

impl AttestationIssuer for SoftwareQuoteIssuer {
    fn issue(&self, params: &AttestationParams, statement: &[u8]) -> AttestationResult<AttestationEnvelope> {
        if params.attestation_type == SIMULATED {
            return SimulatedIssuer.issue(params, statement);
        }
        let sign_type = sign_type_for(&params.attestation_type)
            .ok_or_else(|| AttestationError::UnsupportedScheme(params.attestation_type.clone()))?;
        let spid = hex::decode(&params.hex_spid)
            .map_err(|e| AttestationError::Config(format!("hex_spid: {}", e)))?;

        let quote = QuoteBody {
            sign_type,
            mr_enclave: self.measurement,
            report_data: report_data_for(statement),
        };
        debug!(scheme = %params.attestation_type, "Issued quote");
        Ok(AttestationEnvelope {
            attestation_type: params.attestation_type.clone(),
            attestation: STANDARD.encode(quote.to_bytes(&spid)),
        })
    }
}
