//! Report-signing authorities a hardware verifier pins.
//!
//! The remote service signs each report with RSA PKCS#1 v1.5 over SHA-256 and
//! ships its signing certificate chain, PEM and percent-encoded, beside the
//! report. The chain must end at the pinned root. The in-process stand-in
//! signs with a bare P-256 key instead.

use std::path::Path;

use percent_encoding::percent_decode_str;
use rsa::{pkcs8::DecodePublicKey, Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use tracing::warn;
use veil_crypto::Csp;
use x509_parser::prelude::*;

use crate::error::{AttestationError, AttestationResult};
use crate::report::IasReport;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportAuthority {
    /// DER of the pinned root certificate
    Root(Vec<u8>),
    /// SEC1 P-256 public key; reports carry no certificates
    Key(Vec<u8>),
}

impl ReportAuthority {
    /// Pins the first certificate in `pem_text`.
    pub fn root_from_pem(pem_text: &str) -> AttestationResult<Self> {
        let pem = ::pem::parse(pem_text).map_err(|e| AttestationError::Config(format!("pinned root: {}", e)))?;
        if pem.tag() != CERTIFICATE_TAG {
            return Err(AttestationError::Config(format!("pinned root is a {}, not a certificate", pem.tag())));
        }
        let der = pem.into_contents();
        let (_, root) = X509Certificate::from_der(&der)
            .map_err(|e| AttestationError::Config(format!("pinned root: {}", e)))?;
        if !root.is_ca() {
            return Err(AttestationError::Config(format!("pinned root {} is not a CA", root.subject())));
        }
        Ok(ReportAuthority::Root(der))
    }

    pub fn root_from_file(path: &Path) -> AttestationResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AttestationError::Config(format!("pinned root {}: {}", path.display(), e)))?;
        Self::root_from_pem(&text)
    }

    /// Checks that `report` was signed by this authority.
    pub fn verify(&self, csp: &dyn Csp, report: &IasReport, signature: &[u8]) -> AttestationResult<()> {
        match self {
            ReportAuthority::Root(root_der) => {
                let signing_key = signing_key_under(root_der, &report.ias_certificates)?;
                let digest = Sha256::digest(report.ias_report.as_bytes());
                signing_key
                    .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
                    .map_err(|e| {
                        warn!(error = %e, "Report signature rejected");
                        AttestationError::InvalidSignature
                    })
            }
            ReportAuthority::Key(key) => csp.verify(key, report.ias_report.as_bytes(), signature).map_err(|e| {
                warn!(error = %e, "Report signature rejected");
                AttestationError::InvalidSignature
            }),
        }
    }
}

fn parse_certificate(der: &[u8]) -> AttestationResult<X509Certificate<'_>> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| AttestationError::InvalidEvidence(format!("signing certificate: {}", e)))
}

/// Walks the shipped chain, leaf first, up to the pinned root and returns the
/// leaf's RSA key. A copy of the root inside the chain ends the walk.
fn signing_key_under(root_der: &[u8], shipped: &str) -> AttestationResult<RsaPublicKey> {
    let decoded = percent_decode_str(shipped)
        .decode_utf8()
        .map_err(|e| AttestationError::InvalidEvidence(format!("signing certificates: {}", e)))?;
    let chain: Vec<Vec<u8>> = ::pem::parse_many(decoded.as_bytes())
        .map_err(|e| AttestationError::InvalidEvidence(format!("signing certificates: {}", e)))?
        .into_iter()
        .filter(|pem| pem.tag() == CERTIFICATE_TAG)
        .map(|pem| pem.into_contents())
        .take_while(|der| der.as_slice() != root_der)
        .collect();

    let root = parse_certificate(root_der)?;
    let certs = chain
        .iter()
        .map(|der| parse_certificate(der))
        .collect::<AttestationResult<Vec<_>>>()?;
    let leaf = certs
        .first()
        .ok_or_else(|| AttestationError::UntrustedCertificate("report carries no signing certificate".to_string()))?;

    if !root.validity().is_valid() {
        return Err(AttestationError::UntrustedCertificate(format!("pinned root {} has expired", root.subject())));
    }
    for (i, cert) in certs.iter().enumerate() {
        let issuer = certs.get(i + 1).unwrap_or(&root);
        if i > 0 && !cert.is_ca() {
            return Err(AttestationError::UntrustedCertificate(format!("{} is not a CA", cert.subject())));
        }
        if !cert.validity().is_valid() {
            return Err(AttestationError::UntrustedCertificate(format!(
                "{} is outside its validity period",
                cert.subject()
            )));
        }
        cert.verify_signature(Some(issuer.public_key())).map_err(|e| {
            AttestationError::UntrustedCertificate(format!("{} not issued by {}: {}", cert.subject(), issuer.subject(), e))
        })?;
    }

    RsaPublicKey::from_public_key_der(leaf.public_key().raw)
        .map_err(|e| AttestationError::UntrustedCertificate(format!("signing key is not RSA: {}", e)))
}
