//! Peer configuration.
//!
//! ```toml
//! channel_id = "mychannel"
//! operator_id = "Org1MSP"
//! host_endpoint = "peer0.org1.example.com:7051"
//!
//! [attestation]
//! mode = "simulated"
//! ```
//!
//! File values are overridden by `VEIL_CHANNEL_ID`, `VEIL_OPERATOR_ID`,
//! `VEIL_HOST_ENDPOINT` and the attestation variables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use veil_attestation::AttestationConfig;
use veil_types::HostParams;

use crate::error::{PeerError, PeerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    pub channel_id: String,
    /// MSP id of the organization running this peer
    pub operator_id: String,
    pub host_endpoint: String,
    pub attestation: AttestationConfig,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            channel_id: "mychannel".to_string(),
            operator_id: "Org1MSP".to_string(),
            host_endpoint: "localhost:7051".to_string(),
            attestation: AttestationConfig::default(),
        }
    }
}

impl PeerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> PeerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PeerError::Config(format!("{}: {}", path.display(), e)))?;
        let config: PeerConfig =
            toml::from_str(&text).map_err(|e| PeerError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded peer config");
        Ok(config)
    }

    /// Defaults, or the file at `path`, then the environment on top.
    pub fn load(path: Option<&Path>) -> PeerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> PeerResult<()> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    pub fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) -> PeerResult<()> {
        if let Some(channel) = lookup("VEIL_CHANNEL_ID") {
            self.channel_id = channel;
        }
        if let Some(operator) = lookup("VEIL_OPERATOR_ID") {
            self.operator_id = operator;
        }
        if let Some(endpoint) = lookup("VEIL_HOST_ENDPOINT") {
            self.host_endpoint = endpoint;
        }
        self.attestation.apply_lookup(lookup)?;
        Ok(())
    }

    pub fn validate(&self) -> PeerResult<()> {
        if self.channel_id.is_empty() {
            return Err(PeerError::Config("channel_id must not be empty".to_string()));
        }
        if self.operator_id.is_empty() {
            return Err(PeerError::Config("operator_id must not be empty".to_string()));
        }
        self.attestation.validate()?;
        Ok(())
    }

    /// Host parameters an enclave on this peer attests to.
    pub fn host_params(&self) -> HostParams {
        HostParams {
            operator_id: self.operator_id.clone(),
            host_endpoint: self.host_endpoint.clone(),
            host_identity: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use veil_attestation::AttestationMode;

    #[test]
    fn test_from_file_with_partial_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
channel_id = "auctions"
host_endpoint = "peer1.org2:7051"

[attestation]
timeout_ms = 2500
"#
        )
        .unwrap();

        let config = PeerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channel_id, "auctions");
        assert_eq!(config.operator_id, "Org1MSP");
        assert_eq!(config.attestation.timeout_ms, 2500);
        assert_eq!(config.attestation.mode, AttestationMode::Simulated);
    }

    #[test]
    fn test_env_overrides_file() {
        let vars: HashMap<&str, &str> = [("VEIL_OPERATOR_ID", "Org2MSP"), ("VEIL_ATTESTATION_MODE", "SIM")]
            .into_iter()
            .collect();
        let mut config = PeerConfig::default();
        config
            .apply_lookup(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.operator_id, "Org2MSP");
        assert_eq!(config.host_params().operator_id, "Org2MSP");
    }

    #[test]
    fn test_hardware_without_credentials_rejected() {
        let mut config = PeerConfig::default();
        config.attestation.mode = AttestationMode::Hardware;
        assert!(matches!(config.validate(), Err(PeerError::Attestation(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PeerConfig::from_file("/nonexistent/veil.toml"),
            Err(PeerError::Config(_))
        ));
    }
}
