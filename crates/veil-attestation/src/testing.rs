//! In-process stand-in for the remote verification service.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use veil_crypto::{Csp, KeyPair};

use crate::authority::ReportAuthority;
use crate::error::AttestationResult;
use crate::ias::RemoteAttestationService;
use crate::quote::QuoteBody;
use crate::report::{IasReport, IasReportBody};

/// Signs reports for any well-formed quote with its own P-256 key. Verifiers
/// trust it through [`ReportAuthority::Key`], never through a certificate.
pub struct LocalAttestationService {
    csp: Arc<dyn Csp>,
    authority: KeyPair,
    status: String,
}

impl LocalAttestationService {
    pub fn new(csp: Arc<dyn Csp>) -> AttestationResult<Self> {
        let authority = csp.new_signing_keys()?;
        Ok(Self {
            csp,
            authority,
            status: "OK".to_string(),
        })
    }

    /// Reports every quote with `status` instead of `OK`.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Authority verifiers must pin.
    pub fn authority(&self) -> ReportAuthority {
        ReportAuthority::Key(self.authority.public_key().to_vec())
    }
}

#[async_trait]
impl RemoteAttestationService for LocalAttestationService {
    async fn verify_quote(&self, quote: &[u8]) -> AttestationResult<IasReport> {
        QuoteBody::parse(quote)?;
        let body = IasReportBody {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: "1970-01-01T00:00:00.000000".to_string(),
            version: 4,
            isv_enclave_quote_status: self.status.clone(),
            isv_enclave_quote_body: STANDARD.encode(quote),
            nonce: None,
            revocation_reason: None,
        };
        let ias_report = serde_json::to_string(&body)
            .map_err(|e| crate::error::AttestationError::InvalidEvidence(e.to_string()))?;
        let signature = self.csp.sign(self.authority.private_key(), ias_report.as_bytes())?;
        Ok(IasReport {
            ias_signature: STANDARD.encode(signature),
            ias_certificates: String::new(),
            ias_report,
        })
    }
}
