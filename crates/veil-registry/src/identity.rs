//! Host identity evaluation.

use veil_types::{EndorsementPolicy, HostParams, SerializedIdentity};

use crate::error::{RegistryError, RegistryResult};

/// Decides whether the submitter of a registration may speak for the attested host.
pub trait IdentityEvaluator: Send + Sync {
    fn evaluate(
        &self,
        creator: &SerializedIdentity,
        host: &HostParams,
        policy: &EndorsementPolicy,
    ) -> RegistryResult<()>;
}

/// Organization-level evaluation.
///
/// The submitter's MSP must be the host operator and must be a principal of
/// the endorsement policy. When the host pinned an identity, the submitter's
/// identity bytes must match it exactly.
#[derive(Debug, Default, Clone, Copy)]
pub struct MspIdentityEvaluator;

impl IdentityEvaluator for MspIdentityEvaluator {
    fn evaluate(
        &self,
        creator: &SerializedIdentity,
        host: &HostParams,
        policy: &EndorsementPolicy,
    ) -> RegistryResult<()> {
        if creator.msp_id != host.operator_id {
            return Err(RegistryError::HostMismatch {
                creator: creator.msp_id.clone(),
                operator: host.operator_id.clone(),
            });
        }
        if !host.host_identity.is_empty() && host.host_identity != creator.id_bytes {
            return Err(RegistryError::HostIdentityMismatch);
        }
        if !policy.admits(&creator.msp_id) {
            return Err(RegistryError::PolicyRejected(creator.msp_id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(operator: &str, identity: &[u8]) -> HostParams {
        HostParams {
            operator_id: operator.into(),
            host_endpoint: "peer0:7051".into(),
            host_identity: identity.to_vec(),
        }
    }

    #[test]
    fn test_operator_must_match_creator() {
        let policy = EndorsementPolicy::any_of(["Org1MSP", "Org2MSP"]);
        let creator = SerializedIdentity::new("Org1MSP", b"peer0".to_vec());
        MspIdentityEvaluator.evaluate(&creator, &host("Org1MSP", b""), &policy).unwrap();
        assert!(matches!(
            MspIdentityEvaluator.evaluate(&creator, &host("Org2MSP", b""), &policy),
            Err(RegistryError::HostMismatch { .. })
        ));
    }

    #[test]
    fn test_pinned_host_identity() {
        let policy = EndorsementPolicy::any_of(["Org1MSP"]);
        let creator = SerializedIdentity::new("Org1MSP", b"peer0".to_vec());
        MspIdentityEvaluator
            .evaluate(&creator, &host("Org1MSP", b"peer0"), &policy)
            .unwrap();
        assert!(matches!(
            MspIdentityEvaluator.evaluate(&creator, &host("Org1MSP", b"peer1"), &policy),
            Err(RegistryError::HostIdentityMismatch)
        ));
    }

    #[test]
    fn test_policy_must_admit_operator() {
        let creator = SerializedIdentity::new("Org3MSP", Vec::new());
        let err = MspIdentityEvaluator
            .evaluate(&creator, &host("Org3MSP", b""), &EndorsementPolicy::any_of(["Org1MSP"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::PolicyRejected(ref m) if m == "Org3MSP"));
    }
}
