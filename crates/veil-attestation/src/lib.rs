//! # Veil attestation
//!
//! Everything between an enclave claiming "I am program X on genuine
//! hardware" and the registry believing it.
//!
//! ```text
//! enclave                      host peer                         registry
//! ───────                      ─────────                         ────────
//! AttestationIssuer ──► ConverterRegistry ──► (remote service) ──► VerifierRegistry
//!   attestation          evidence                                   accept / reject
//! ```
//!
//! ## Schemes
//!
//! - **simulated**: debug only; every report is accepted
//! - **epid-linkable / epid-unlinkable**: quote verified by the remote
//!   attestation service, report signature checked under a pinned root
//!   certificate (see [`ReportAuthority`])
//!
//! Registries are plain values built once at startup (see
//! [`AttestationConfig::verifier_registry`]) and injected where needed.

pub mod authority;
pub mod config;
pub mod converter;
pub mod envelope;
pub mod epid;
pub mod error;
pub mod ias;
pub mod issuer;
pub mod quote;
pub mod report;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod verifier;

pub use authority::ReportAuthority;
pub use config::{AttestationConfig, AttestationMode};
pub use converter::{ConverterRegistry, EpidConverter, EvidenceConverter, SimulatedConverter};
pub use envelope::{
    AttestationEnvelope, AttestationParams, EvidenceEnvelope, EPID_LINKABLE, EPID_UNLINKABLE, SIMULATED,
};
pub use epid::EpidVerifier;
pub use error::{AttestationError, AttestationResult};
pub use ias::{IasClient, RemoteAttestationService, IAS_DEV_URL};
pub use issuer::{AttestationIssuer, SimulatedIssuer, SoftwareQuoteIssuer};
pub use report::{IasReport, IasReportBody};
pub use verifier::{CredentialVerifier, ExpectedValues, SchemeVerifier, SimulatedVerifier, VerifierRegistry};
