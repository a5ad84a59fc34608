//! JSON envelopes exchanged between enclave, converter and verifier.

use serde::{Deserialize, Serialize};

use crate::error::{AttestationError, AttestationResult};

/// Scheme tag for simulated (debug) attestations.
pub const SIMULATED: &str = "simulated";
/// Scheme tag for EPID quotes with linkable signatures.
pub const EPID_LINKABLE: &str = "epid-linkable";
/// Scheme tag for EPID quotes with unlinkable signatures.
pub const EPID_UNLINKABLE: &str = "epid-unlinkable";

/// Parameters handed to the enclave when it is asked to attest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationParams {
    pub attestation_type: String,
    /// Hex-encoded service provider id (device group)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hex_spid: String,
    /// Signature revocation list, base64
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sig_rl: String,
}

impl AttestationParams {
    pub fn simulated() -> Self {
        Self {
            attestation_type: SIMULATED.to_string(),
            hex_spid: String::new(),
            sig_rl: String::new(),
        }
    }

    pub fn epid(scheme: &str, hex_spid: impl Into<String>) -> Self {
        Self {
            attestation_type: scheme.to_string(),
            hex_spid: hex_spid.into(),
            sig_rl: String::new(),
        }
    }

    pub fn from_json(text: &str) -> AttestationResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| AttestationError::InvalidEvidence(format!("attestation params: {}", e)))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Attestation as issued inside the enclave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationEnvelope {
    pub attestation_type: String,
    pub attestation: String,
}

/// Attestation after conversion into something a verifier can check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEnvelope {
    pub attestation_type: String,
    pub evidence: String,
}

macro_rules! json_codec {
    ($ty:ty, $what:literal) => {
        impl $ty {
            pub fn from_bytes(bytes: &[u8]) -> AttestationResult<Self> {
                serde_json::from_slice(bytes)
                    .map_err(|e| AttestationError::InvalidEvidence(format!("{}: {}", $what, e)))
            }

            pub fn to_bytes(&self) -> AttestationResult<Vec<u8>> {
                serde_json::to_vec(self)
                    .map_err(|e| AttestationError::InvalidEvidence(format!("{}: {}", $what, e)))
            }
        }
    };
}

json_codec!(AttestationEnvelope, "attestation envelope");
json_codec!(EvidenceEnvelope, "evidence envelope");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_json_shape() {
        let json = AttestationParams::epid(EPID_LINKABLE, "00".repeat(16)).to_json();
        assert!(json.contains("\"attestation_type\":\"epid-linkable\""));
        assert!(!json.contains("sig_rl"));

        let parsed = AttestationParams::from_json(r#"{"attestation_type":"simulated"}"#).unwrap();
        assert_eq!(parsed, AttestationParams::simulated());
    }

    #[test]
    fn test_evidence_envelope_rejects_garbage() {
        assert!(matches!(
            EvidenceEnvelope::from_bytes(b"not json"),
            Err(AttestationError::InvalidEvidence(_))
        ));
        let envelope = EvidenceEnvelope {
            attestation_type: SIMULATED.into(),
            evidence: String::new(),
        };
        assert_eq!(EvidenceEnvelope::from_bytes(&envelope.to_bytes().unwrap()).unwrap(), envelope);
    }
}
