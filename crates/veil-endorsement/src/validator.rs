//! Response validation.

use std::sync::Arc;

use tracing::debug;
use veil_crypto::Csp;
use veil_types::{sha256, AttestedData, ChaincodeResponseMessage, SignedChaincodeResponseMessage};

use crate::error::{ValidationError, ValidationResult};

pub struct Validator {
    csp: Arc<dyn Csp>,
}

impl Validator {
    pub fn new(csp: Arc<dyn Csp>) -> Self {
        Self { csp }
    }

    /// Checks that `signed` came from the enclave described by `attested` and
    /// answers the request carried by its original proposal.
    ///
    /// Returns the decoded inner response.
    pub fn validate(
        &self,
        signed: &SignedChaincodeResponseMessage,
        attested: &AttestedData,
    ) -> ValidationResult<ChaincodeResponseMessage> {
        if signed.signature.is_empty() {
            return Err(ValidationError::EmptySignature);
        }
        if signed.chaincode_response_message.is_empty() {
            return Err(ValidationError::EmptyResponse);
        }
        self.csp
            .verify(&attested.enclave_vk, &signed.chaincode_response_message, &signed.signature)?;

        let response = signed.response()?;
        let enclave_id = attested.enclave_id();
        if response.enclave_id != enclave_id {
            return Err(ValidationError::EnclaveMismatch {
                expected: enclave_id,
                actual: response.enclave_id,
            });
        }

        let proposal = response
            .proposal
            .as_ref()
            .ok_or(ValidationError::MissingProposal)?
            .proposal()?;
        let request = proposal.request_bytes()?;
        if sha256(&request).as_slice() != response.request_message_hash.as_slice() {
            return Err(ValidationError::RequestHashMismatch);
        }

        debug!(enclave_id = %response.enclave_id, "Response validated");
        Ok(response)
    }
}
