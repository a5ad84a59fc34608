//! Attestation configuration.
//!
//! Loaded from the `[attestation]` table of the peer config file and then
//! overridden from the environment:
//!
//! | variable | meaning |
//! |---|---|
//! | `VEIL_ATTESTATION_MODE` / `SGX_MODE` | `simulated`/`SIM` or `hardware`/`HW` |
//! | `IAS_API_KEY` | remote service API key (else `$SGX_CREDENTIALS_PATH/api_key.txt`) |
//! | `VEIL_SPID` | hex SPID (else `$SGX_CREDENTIALS_PATH/spid.txt`) |
//! | `VEIL_EPID_SCHEME` | `epid-linkable`/`epid-unlinkable` (else `spid_type.txt`) |
//! | `VEIL_IAS_URL` | remote service URL |
//! | `VEIL_IAS_TIMEOUT_MS` | remote call timeout |
//! | `VEIL_IAS_ROOT_CERT` | PEM file of the pinned report-signing root |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use veil_crypto::Csp;

use crate::authority::ReportAuthority;
use crate::converter::{ConverterRegistry, EpidConverter, SimulatedConverter};
use crate::envelope::{AttestationParams, EPID_LINKABLE, EPID_UNLINKABLE};
use crate::epid::EpidVerifier;
use crate::error::{AttestationError, AttestationResult};
use crate::ias::{IasClient, RemoteAttestationService, IAS_DEV_URL};
use crate::verifier::{SimulatedVerifier, VerifierRegistry};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const SPID_HEX_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationMode {
    #[default]
    Simulated,
    Hardware,
}

impl std::str::FromStr for AttestationMode {
    type Err = AttestationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" | "sim" => Ok(AttestationMode::Simulated),
            "hardware" | "hw" => Ok(AttestationMode::Hardware),
            other => Err(AttestationError::Config(format!("unknown attestation mode {:?}", other))),
        }
    }
}

impl std::fmt::Display for AttestationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttestationMode::Simulated => write!(f, "simulated"),
            AttestationMode::Hardware => write!(f, "hardware"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationConfig {
    pub mode: AttestationMode,
    pub api_key: Option<String>,
    pub spid: Option<String>,
    pub epid_scheme: String,
    pub service_url: String,
    pub timeout_ms: u64,
    /// PEM file of the root certificate report-signing chains must end at
    pub authority_root: Option<PathBuf>,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            mode: AttestationMode::Simulated,
            api_key: None,
            spid: None,
            epid_scheme: EPID_LINKABLE.to_string(),
            service_url: IAS_DEV_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            authority_root: None,
        }
    }
}

impl std::fmt::Debug for AttestationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationConfig")
            .field("mode", &self.mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("spid", &self.spid)
            .field("epid_scheme", &self.epid_scheme)
            .field("service_url", &self.service_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("authority_root", &self.authority_root)
            .finish()
    }
}

fn read_credential_file(dir: &Path, name: &str) -> Option<String> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Credential file not readable");
            None
        }
    }
}

impl AttestationConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> AttestationResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> AttestationResult<()> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AttestationResult<()> {
        if let Some(mode) = lookup("VEIL_ATTESTATION_MODE").or_else(|| lookup("SGX_MODE")) {
            self.mode = mode.parse()?;
        }

        let credentials_dir = lookup("SGX_CREDENTIALS_PATH").map(PathBuf::from);
        let from_dir = |name: &str| credentials_dir.as_deref().and_then(|dir| read_credential_file(dir, name));

        if let Some(api_key) = lookup("IAS_API_KEY").or_else(|| from_dir("api_key.txt")) {
            self.api_key = Some(api_key);
        }
        if let Some(spid) = lookup("VEIL_SPID").or_else(|| from_dir("spid.txt")) {
            self.spid = Some(spid);
        }
        if let Some(scheme) = lookup("VEIL_EPID_SCHEME").or_else(|| from_dir("spid_type.txt")) {
            self.epid_scheme = scheme;
        }
        if let Some(url) = lookup("VEIL_IAS_URL") {
            self.service_url = url;
        }
        if let Some(timeout) = lookup("VEIL_IAS_TIMEOUT_MS") {
            self.timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| AttestationError::Config(format!("VEIL_IAS_TIMEOUT_MS={:?} is not a number", timeout)))?;
        }
        if let Some(path) = lookup("VEIL_IAS_ROOT_CERT") {
            self.authority_root = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Rejects hardware configurations that could not verify anything.
    pub fn validate(&self) -> AttestationResult<()> {
        if self.mode == AttestationMode::Simulated {
            return Ok(());
        }
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(AttestationError::Config("hardware mode requires an API key".to_string()));
        }
        match self.spid.as_deref() {
            Some(spid) if spid.len() == SPID_HEX_LEN && hex::decode(spid).is_ok() => {}
            _ => return Err(AttestationError::Config("hardware mode requires a 16-byte hex SPID".to_string())),
        }
        if self.epid_scheme != EPID_LINKABLE && self.epid_scheme != EPID_UNLINKABLE {
            return Err(AttestationError::Config(format!("unknown EPID scheme {:?}", self.epid_scheme)));
        }
        self.report_authority()?;
        if self.timeout_ms == 0 {
            return Err(AttestationError::Config("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn report_authority(&self) -> AttestationResult<ReportAuthority> {
        let path = self
            .authority_root
            .as_deref()
            .ok_or_else(|| AttestationError::Config("hardware mode requires a pinned root certificate".to_string()))?;
        ReportAuthority::root_from_file(path)
    }

    /// Parameters the enclave attests with.
    pub fn attestation_params(&self) -> AttestationParams {
        match self.mode {
            AttestationMode::Simulated => AttestationParams::simulated(),
            AttestationMode::Hardware => {
                AttestationParams::epid(&self.epid_scheme, self.spid.clone().unwrap_or_default())
            }
        }
    }

    /// Verifiers accepted by this deployment. Hardware mode does not accept
    /// simulated evidence.
    pub fn verifier_registry(&self, csp: Arc<dyn Csp>) -> AttestationResult<VerifierRegistry> {
        self.validate()?;
        let registry = match self.mode {
            AttestationMode::Simulated => VerifierRegistry::new().with_verifier(Arc::new(SimulatedVerifier)),
            AttestationMode::Hardware => {
                let authority = self.report_authority()?;
                VerifierRegistry::new()
                    .with_verifier(Arc::new(EpidVerifier::linkable(authority.clone(), csp.clone())))
                    .with_verifier(Arc::new(EpidVerifier::unlinkable(authority, csp)))
            }
        };
        info!(mode = %self.mode, schemes = ?registry.schemes(), "Attestation verifiers ready");
        Ok(registry)
    }

    /// Converters for this deployment, talking to the configured remote service.
    pub fn converter_registry(&self) -> AttestationResult<ConverterRegistry> {
        self.validate()?;
        match self.mode {
            AttestationMode::Simulated => Ok(ConverterRegistry::new().with_converter(Arc::new(SimulatedConverter))),
            AttestationMode::Hardware => {
                let client = IasClient::new(
                    self.service_url.clone(),
                    self.api_key.clone().unwrap_or_default(),
                    self.timeout(),
                )?;
                Ok(Self::epid_converters(Arc::new(client)))
            }
        }
    }

    /// EPID converters backed by `service`.
    pub fn epid_converters(service: Arc<dyn RemoteAttestationService>) -> ConverterRegistry {
        ConverterRegistry::new()
            .with_converter(Arc::new(EpidConverter::linkable(service.clone())))
            .with_converter(Arc::new(EpidConverter::unlinkable(service)))
    }
}
