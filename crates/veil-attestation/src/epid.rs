//! Hardware (EPID quote) verification against a pinned report-signing authority.
//! Nothing in a report body is read before [`ReportAuthority::verify`] accepts it.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;
use veil_crypto::Csp;
use veil_types::parse_measurement;

use crate::authority::ReportAuthority;
use crate::envelope::{EPID_LINKABLE, EPID_UNLINKABLE};
use crate::error::{AttestationError, AttestationResult};
use crate::quote::{report_data_for, sign_type_for, QuoteBody};
use crate::report::IasReport;
use crate::verifier::{ExpectedValues, SchemeVerifier};

pub struct EpidVerifier {
    scheme: &'static str,
    sign_type: u16,
    authority: ReportAuthority,
    csp: Arc<dyn Csp>,
}

impl EpidVerifier {
    pub fn linkable(authority: ReportAuthority, csp: Arc<dyn Csp>) -> Self {
        Self::new(EPID_LINKABLE, authority, csp)
    }

    pub fn unlinkable(authority: ReportAuthority, csp: Arc<dyn Csp>) -> Self {
        Self::new(EPID_UNLINKABLE, authority, csp)
    }

    fn new(scheme: &'static str, authority: ReportAuthority, csp: Arc<dyn Csp>) -> Self {
        let sign_type = sign_type_for(scheme).unwrap_or_default();
        Self {
            scheme,
            sign_type,
            authority,
            csp,
        }
    }
}

impl SchemeVerifier for EpidVerifier {
    fn scheme(&self) -> &str {
        self.scheme
    }

    fn verify(&self, evidence: &str, expected: &ExpectedValues<'_>) -> AttestationResult<()> {
        let report = IasReport::from_json(evidence)?;

        // Nothing in the body is trusted before the authority signature checks out.
        let signature = STANDARD
            .decode(report.ias_signature.trim())
            .map_err(|e| AttestationError::InvalidEvidence(format!("report signature: {}", e)))?;
        self.authority.verify(self.csp.as_ref(), &report, &signature)?;

        let body = report.body()?;
        if !body.status_accepted() {
            return Err(AttestationError::QuoteStatus(body.isv_enclave_quote_status));
        }

        let quote_bytes = STANDARD
            .decode(body.isv_enclave_quote_body.trim())
            .map_err(|e| AttestationError::InvalidEvidence(format!("quote body: {}", e)))?;
        let quote = QuoteBody::parse(&quote_bytes)?;

        if quote.sign_type != self.sign_type {
            return Err(AttestationError::SignTypeMismatch {
                scheme: self.scheme.to_string(),
                actual: quote.sign_type,
            });
        }

        let expected_measurement = parse_measurement(expected.measurement).ok_or_else(|| {
            AttestationError::InvalidEvidence(format!("expected measurement {:?} is not 32-byte hex", expected.measurement))
        })?;
        if quote.mr_enclave != expected_measurement {
            return Err(AttestationError::MeasurementMismatch {
                expected: expected.measurement.to_string(),
                actual: hex::encode(quote.mr_enclave),
            });
        }

        if quote.report_data != report_data_for(expected.statement) {
            return Err(AttestationError::KeyBindingMismatch);
        }

        debug!(
            scheme = self.scheme,
            report_id = %body.id,
            status = %body.isv_enclave_quote_status,
            "Hardware report verified"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::fixtures;
    use crate::quote::{SIGN_TYPE_LINKABLE, SIGN_TYPE_UNLINKABLE};
    use crate::report::IasReportBody;
    use veil_crypto::{KeyPair, SoftwareCsp};

    const MEASUREMENT: [u8; 32] = [0x42; 32];

    struct Authority {
        csp: Arc<dyn Csp>,
        keys: KeyPair,
    }

    impl Authority {
        fn new() -> Self {
            let csp: Arc<dyn Csp> = Arc::new(SoftwareCsp::new());
            let keys = csp.new_signing_keys().unwrap();
            Self { csp, keys }
        }

        fn report(&self, sign_type: u16, measurement: [u8; 32], statement: &[u8], status: &str) -> String {
            let body_json = body(sign_type, measurement, statement, status);
            let signature = self.csp.sign(self.keys.private_key(), body_json.as_bytes()).unwrap();
            IasReport {
                ias_signature: STANDARD.encode(signature),
                ias_certificates: String::new(),
                ias_report: body_json,
            }
            .to_json()
            .unwrap()
        }

        fn verifier(&self) -> EpidVerifier {
            EpidVerifier::linkable(ReportAuthority::Key(self.keys.public_key().to_vec()), self.csp.clone())
        }
    }

    fn body(sign_type: u16, measurement: [u8; 32], statement: &[u8], status: &str) -> String {
        let quote = QuoteBody {
            sign_type,
            mr_enclave: measurement,
            report_data: report_data_for(statement),
        };
        let body = IasReportBody {
            id: "report-1".into(),
            timestamp: "2026-01-01T00:00:00".into(),
            version: 4,
            isv_enclave_quote_status: status.into(),
            isv_enclave_quote_body: STANDARD.encode(quote.to_bytes(&[0u8; 16])),
            nonce: None,
            revocation_reason: None,
        };
        serde_json::to_string(&body).unwrap()
    }

    fn expected<'a>(measurement: &'a str, statement: &'a [u8]) -> ExpectedValues<'a> {
        ExpectedValues { measurement, statement }
    }

    #[test]
    fn test_all_checks_pass() {
        let authority = Authority::new();
        let evidence = authority.report(SIGN_TYPE_LINKABLE, MEASUREMENT, b"statement", "OK");
        let measurement = hex::encode(MEASUREMENT);
        authority
            .verifier()
            .verify(&evidence, &expected(&measurement, b"statement"))
            .unwrap();

        // Measurement comparison is case-insensitive.
        authority
            .verifier()
            .verify(&evidence, &expected(&measurement.to_uppercase(), b"statement"))
            .unwrap();
    }

    #[test]
    fn test_wrong_measurement_rejected() {
        let authority = Authority::new();
        let evidence = authority.report(SIGN_TYPE_LINKABLE, [0x13; 32], b"statement", "OK");
        let err = authority
            .verifier()
            .verify(&evidence, &expected(&hex::encode(MEASUREMENT), b"statement"))
            .unwrap_err();
        assert!(matches!(err, AttestationError::MeasurementMismatch { .. }));
    }

    #[test]
    fn test_wrong_key_binding_rejected() {
        let authority = Authority::new();
        let evidence = authority.report(SIGN_TYPE_LINKABLE, MEASUREMENT, b"other enclave", "OK");
        let err = authority
            .verifier()
            .verify(&evidence, &expected(&hex::encode(MEASUREMENT), b"statement"))
            .unwrap_err();
        assert!(matches!(err, AttestationError::KeyBindingMismatch));
    }

    #[test]
    fn test_foreign_authority_rejected() {
        let authority = Authority::new();
        let impostor = Authority::new();
        let evidence = impostor.report(SIGN_TYPE_LINKABLE, MEASUREMENT, b"statement", "OK");
        let err = authority
            .verifier()
            .verify(&evidence, &expected(&hex::encode(MEASUREMENT), b"statement"))
            .unwrap_err();
        assert!(matches!(err, AttestationError::InvalidSignature));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let authority = Authority::new();
        let evidence = authority.report(SIGN_TYPE_LINKABLE, MEASUREMENT, b"statement", "OK");
        let mut report = IasReport::from_json(&evidence).unwrap();
        report.ias_report = report.ias_report.replace("report-1", "report-2");
        let err = authority
            .verifier()
            .verify(&report.to_json().unwrap(), &expected(&hex::encode(MEASUREMENT), b"statement"))
            .unwrap_err();
        assert!(matches!(err, AttestationError::InvalidSignature));
    }

    #[test]
    fn test_revoked_status_rejected() {
        let authority = Authority::new();
        let evidence = authority.report(SIGN_TYPE_LINKABLE, MEASUREMENT, b"statement", "SIGNATURE_REVOKED");
        let err = authority
            .verifier()
            .verify(&evidence, &expected(&hex::encode(MEASUREMENT), b"statement"))
            .unwrap_err();
        assert!(matches!(err, AttestationError::QuoteStatus(_)));
    }

    #[test]
    fn test_sign_type_must_match_scheme() {
        let authority = Authority::new();
        let evidence = authority.report(SIGN_TYPE_UNLINKABLE, MEASUREMENT, b"statement", "OK");
        let err = authority
            .verifier()
            .verify(&evidence, &expected(&hex::encode(MEASUREMENT), b"statement"))
            .unwrap_err();
        assert!(matches!(err, AttestationError::SignTypeMismatch { .. }));
    }

    #[test]
    fn test_report_under_certificate_chain_verified() {
        let authority = ReportAuthority::root_from_pem(fixtures::ROOT).unwrap();
        let csp: Arc<dyn Csp> = Arc::new(SoftwareCsp::new());
        let verifier = EpidVerifier::unlinkable(authority, csp);
        let measurement = hex::encode(MEASUREMENT);
        let body_json = body(SIGN_TYPE_UNLINKABLE, MEASUREMENT, b"statement", "GROUP_OUT_OF_DATE");

        let evidence = fixtures::signed_report(&body_json, &[fixtures::SIGNING_CERT, fixtures::ROOT])
            .to_json()
            .unwrap();
        verifier.verify(&evidence, &expected(&measurement, b"statement")).unwrap();

        // Same chain, but a different root is pinned.
        let stranger = EpidVerifier::unlinkable(
            ReportAuthority::root_from_pem(fixtures::OTHER_ROOT).unwrap(),
            Arc::new(SoftwareCsp::new()),
        );
        let err = stranger.verify(&evidence, &expected(&measurement, b"statement")).unwrap_err();
        assert!(matches!(err, AttestationError::UntrustedCertificate(_)));
    }
}
