//! Verification reports returned by the remote attestation service.

use serde::{Deserialize, Serialize};

use crate::error::{AttestationError, AttestationResult};

/// Quote statuses that still prove genuine hardware.
pub const ACCEPTED_QUOTE_STATUSES: &[&str] = &[
    "OK",
    "GROUP_OUT_OF_DATE",
    "CONFIGURATION_NEEDED",
    "SW_HARDENING_NEEDED",
    "CONFIGURATION_AND_SW_HARDENING_NEEDED",
];

/// Signed report, as carried in evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IasReport {
    /// Base64 signature over `ias_report`
    pub ias_signature: String,
    /// Percent-encoded PEM signing chain, leaf first
    #[serde(default)]
    pub ias_certificates: String,
    /// Exact JSON body the signature covers
    pub ias_report: String,
}

/// Body of an [`IasReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IasReportBody {
    pub id: String,
    pub timestamp: String,
    #[serde(default)]
    pub version: u32,
    pub isv_enclave_quote_status: String,
    /// Base64 quote body (without the EPID signature)
    pub isv_enclave_quote_body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl IasReport {
    pub fn from_json(text: &str) -> AttestationResult<Self> {
        serde_json::from_str(text).map_err(|e| AttestationError::InvalidEvidence(format!("report: {}", e)))
    }

    pub fn to_json(&self) -> AttestationResult<String> {
        serde_json::to_string(self).map_err(|e| AttestationError::InvalidEvidence(format!("report: {}", e)))
    }

    pub fn body(&self) -> AttestationResult<IasReportBody> {
        serde_json::from_str(&self.ias_report)
            .map_err(|e| AttestationError::InvalidEvidence(format!("report body: {}", e)))
    }
}

impl IasReportBody {
    pub fn status_accepted(&self) -> bool {
        ACCEPTED_QUOTE_STATUSES.contains(&self.isv_enclave_quote_status.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_field_names() {
        let report = IasReport {
            ias_signature: "c2ln".into(),
            ias_certificates: String::new(),
            ias_report: r#"{"id":"1","timestamp":"t","isvEnclaveQuoteStatus":"OK","isvEnclaveQuoteBody":"AA=="}"#.into(),
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("iasSignature"));
        assert!(json.contains("iasReport"));

        let body = IasReport::from_json(&json).unwrap().body().unwrap();
        assert!(body.status_accepted());
        assert_eq!(body.isv_enclave_quote_body, "AA==");
    }

    #[test]
    fn test_revoked_status_not_accepted() {
        let body = IasReportBody {
            id: "1".into(),
            timestamp: "t".into(),
            version: 4,
            isv_enclave_quote_status: "SIGNATURE_REVOKED".into(),
            isv_enclave_quote_body: String::new(),
            nonce: None,
            revocation_reason: None,
        };
        assert!(!body.status_accepted());
    }
}
