//! Client for the remote attestation (quote verification) service.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AttestationError, AttestationResult};
use crate::report::{IasReport, IasReportBody};

/// Development endpoint of the Intel Attestation Service.
pub const IAS_DEV_URL: &str = "https://api.trustedservices.intel.com/sgx/dev/attestation/v4/report";

const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const SIGNATURE_HEADER: &str = "X-IASReport-Signature";
const CERTIFICATES_HEADER: &str = "X-IASReport-Signing-Certificate";

/// Turns a raw quote into a signed verification report.
#[async_trait]
pub trait RemoteAttestationService: Send + Sync {
    async fn verify_quote(&self, quote: &[u8]) -> AttestationResult<IasReport>;
}

#[derive(Serialize)]
struct QuoteRequest<'a> {
    #[serde(rename = "isvEnclaveQuote")]
    isv_enclave_quote: &'a str,
}

pub struct IasClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl IasClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> AttestationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AttestationError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> AttestationError {
    if e.is_timeout() {
        AttestationError::Timeout
    } else {
        AttestationError::Transport(e.to_string())
    }
}

#[async_trait]
impl RemoteAttestationService for IasClient {
    async fn verify_quote(&self, quote: &[u8]) -> AttestationResult<IasReport> {
        let quote_b64 = STANDARD.encode(quote);
        debug!(url = %self.url, quote_len = quote.len(), "Requesting verification report");

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&QuoteRequest {
                isv_enclave_quote: &quote_b64,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "Verification service rejected quote");
            return Err(AttestationError::Transport(format!("service returned {}", status)));
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let ias_signature = header(SIGNATURE_HEADER)
            .ok_or_else(|| AttestationError::Transport(format!("response lacks {}", SIGNATURE_HEADER)))?;
        let ias_certificates = header(CERTIFICATES_HEADER).unwrap_or_default();
        let ias_report = response.text().await.map_err(transport_error)?;

        // The service echoes the quote body without its EPID signature, so a
        // prefix match ties the report to this request.
        let body: IasReportBody = serde_json::from_str(&ias_report)
            .map_err(|e| AttestationError::Transport(format!("unparseable report: {}", e)))?;
        if body.isv_enclave_quote_body.is_empty() || !quote_b64.starts_with(&body.isv_enclave_quote_body) {
            return Err(AttestationError::Transport(
                "report does not contain the submitted quote".to_string(),
            ));
        }

        Ok(IasReport {
            ias_signature,
            ias_certificates,
            ias_report,
        })
    }
}
