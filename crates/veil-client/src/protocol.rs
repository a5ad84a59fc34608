//! Request concealment and response reveal.
//!
//! An [`EncryptionContext`] serves exactly one invocation. `conceal` consumes
//! it and yields a [`ConcealedRequest`]; `reveal` consumes that in turn, so
//! neither step can run twice on the same keys. A retry starts from a fresh
//! context.

use std::sync::Arc;

use tracing::debug;
use veil_crypto::{Csp, SymmetricKey};
use veil_types::{
    ChaincodeRequestMessage, CleartextRequest, Message, SignedChaincodeResponseMessage,
};

use crate::error::{ClientError, ClientResult};
use crate::keys::KeySource;

/// Hands out per-invocation contexts for programs.
pub struct EncryptionProvider {
    csp: Arc<dyn Csp>,
    keys: Arc<dyn KeySource>,
}

impl EncryptionProvider {
    pub fn new(csp: Arc<dyn Csp>, keys: Arc<dyn KeySource>) -> Self {
        Self { csp, keys }
    }

    pub fn new_context(&self, program_id: &str) -> ClientResult<EncryptionContext> {
        let program_ek = self.keys.encryption_key(program_id)?;
        if program_ek.is_empty() {
            return Err(ClientError::NoEncryptionKey(program_id.to_string()));
        }
        Ok(EncryptionContext {
            csp: self.csp.clone(),
            program_id: program_id.to_string(),
            program_ek,
        })
    }
}

pub struct EncryptionContext {
    csp: Arc<dyn Csp>,
    program_id: String,
    program_ek: Vec<u8>,
}

impl EncryptionContext {
    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    /// Encrypts `function(args)` for the program's enclave.
    ///
    /// The payload is sealed under a fresh request key; only that key is
    /// wrapped under the program encryption key.
    pub fn conceal<I, S>(self, function: &str, args: I) -> ClientResult<ConcealedRequest>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request_key = self.csp.new_symmetric_key()?;
        let response_key = self.csp.new_symmetric_key()?;

        let cleartext = CleartextRequest {
            function: function.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            response_encryption_key: response_key.to_vec(),
        };
        let message = ChaincodeRequestMessage {
            encrypted_request: self.csp.encrypt(&request_key, &cleartext.encode_to_vec())?,
            encrypted_request_key: self.csp.pk_encrypt(&self.program_ek, &request_key)?,
        };
        debug!(
            program_id = %self.program_id,
            function,
            args = cleartext.args.len(),
            "Concealed request"
        );

        Ok(ConcealedRequest {
            csp: self.csp,
            request: message.encode_to_vec(),
            response_key,
        })
    }
}

/// A concealed request, waiting for its response.
pub struct ConcealedRequest {
    csp: Arc<dyn Csp>,
    request: Vec<u8>,
    response_key: SymmetricKey,
}

impl ConcealedRequest {
    /// Serialized `ChaincodeRequestMessage`.
    pub fn request_bytes(&self) -> &[u8] {
        &self.request
    }

    pub fn request_base64(&self) -> String {
        veil_types::to_base64(&self.request)
    }

    /// Decrypts the result carried by a base64 signed response.
    ///
    /// Does not check the enclave signature; that is the endorser's job.
    pub fn reveal(self, signed_response_base64: &str) -> ClientResult<Vec<u8>> {
        let signed = SignedChaincodeResponseMessage::from_base64(signed_response_base64)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        if signed.chaincode_response_message.is_empty() {
            return Err(ClientError::MalformedResponse("empty response message".to_string()));
        }
        let response = signed
            .response()
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        Ok(self.csp.decrypt(&self.response_key, &response.encrypted_response)?)
    }
}
