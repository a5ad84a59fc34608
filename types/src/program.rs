//! On-ledger program definitions.

use serde::{Deserialize, Serialize};

use crate::credentials::ProgramParams;

/// Organizations whose members may endorse for a program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementPolicy {
    pub principals: Vec<String>,
}

impl EndorsementPolicy {
    pub fn any_of<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principals: principals.into_iter().map(Into::into).collect(),
        }
    }

    pub fn admits(&self, msp_id: &str) -> bool {
        self.principals.iter().any(|p| p == msp_id)
    }
}

/// Committed definition of a program; source of truth for what an enclave must attest to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDefinition {
    pub program_id: String,
    /// Hex-encoded expected enclave measurement
    pub measurement: String,
    pub sequence: i64,
    pub endorsement_policy: EndorsementPolicy,
}

impl ProgramDefinition {
    pub fn new(program_id: impl Into<String>, measurement: impl Into<String>, sequence: i64) -> Self {
        Self {
            program_id: program_id.into(),
            measurement: measurement.into(),
            sequence,
            endorsement_policy: EndorsementPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EndorsementPolicy) -> Self {
        self.endorsement_policy = policy;
        self
    }

    /// Parameters an enclave for this program on `channel_id` has to attest to.
    pub fn program_params(&self, channel_id: &str) -> ProgramParams {
        ProgramParams {
            program_id: self.program_id.clone(),
            measurement: self.measurement.clone(),
            sequence: self.sequence,
            channel_id: channel_id.to_string(),
        }
    }
}
