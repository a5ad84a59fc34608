//! Request/response envelopes exchanged between clients, peers and enclaves.

use prost::Message;

use crate::encoding::{from_base64, to_base64};
use crate::error::{TypesError, TypesResult};
use crate::proposal::SignedProposal;

/// Invocation as seen by the enclave after decryption.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CleartextRequest {
    #[prost(string, tag = "1")]
    pub function: String,
    #[prost(string, repeated, tag = "2")]
    pub args: Vec<String>,
    /// Raw symmetric key the enclave encrypts its result under
    #[prost(bytes = "vec", tag = "3")]
    pub response_encryption_key: Vec<u8>,
}

/// Encrypted request as submitted to the enclave.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeRequestMessage {
    /// AEAD ciphertext of a [`CleartextRequest`]
    #[prost(bytes = "vec", tag = "1")]
    pub encrypted_request: Vec<u8>,
    /// Request key wrapped under the program encryption key
    #[prost(bytes = "vec", tag = "2")]
    pub encrypted_request_key: Vec<u8>,
}

impl ChaincodeRequestMessage {
    pub fn from_base64(text: &str) -> TypesResult<Self> {
        let bytes = from_base64(text)?;
        ChaincodeRequestMessage::decode(bytes.as_slice())
            .map_err(|e| TypesError::decode("ChaincodeRequestMessage", e))
    }

    pub fn to_base64(&self) -> String {
        to_base64(self.encode_to_vec())
    }
}

/// A single read observed by the enclave.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct KvRead {
    #[prost(string, tag = "1")]
    pub key: String,
    /// SHA-256 of the value observed (of the empty string if absent)
    #[prost(bytes = "vec", tag = "2")]
    pub value_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct KvWrite {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(bool, tag = "2")]
    pub is_delete: bool,
    #[prost(bytes = "vec", tag = "3")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RangeQueryInfo {
    #[prost(string, tag = "1")]
    pub start_key: String,
    #[prost(string, tag = "2")]
    pub end_key: String,
}

/// Reads and writes an enclave claims to have performed, in execution order.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ProgramRwSet {
    #[prost(message, repeated, tag = "1")]
    pub reads: Vec<KvRead>,
    #[prost(message, repeated, tag = "2")]
    pub writes: Vec<KvWrite>,
    #[prost(message, repeated, tag = "3")]
    pub range_queries: Vec<RangeQueryInfo>,
}

/// Enclave output before signing.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeResponseMessage {
    /// AEAD ciphertext of the result under the response key
    #[prost(bytes = "vec", tag = "1")]
    pub encrypted_response: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub rw_set: Option<ProgramRwSet>,
    #[prost(string, tag = "3")]
    pub enclave_id: String,
    #[prost(message, optional, tag = "4")]
    pub proposal: Option<SignedProposal>,
    /// SHA-256 of the serialized request message the enclave processed
    #[prost(bytes = "vec", tag = "5")]
    pub request_message_hash: Vec<u8>,
}

/// Response message plus the enclave's signature over its exact bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignedChaincodeResponseMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub chaincode_response_message: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

impl SignedChaincodeResponseMessage {
    pub fn from_base64(text: &str) -> TypesResult<Self> {
        let bytes = from_base64(text)?;
        SignedChaincodeResponseMessage::decode(bytes.as_slice())
            .map_err(|e| TypesError::decode("SignedChaincodeResponseMessage", e))
    }

    pub fn to_base64(&self) -> String {
        to_base64(self.encode_to_vec())
    }

    pub fn response(&self) -> TypesResult<ChaincodeResponseMessage> {
        ChaincodeResponseMessage::decode(self.chaincode_response_message.as_slice())
            .map_err(|e| TypesError::decode("ChaincodeResponseMessage", e))
    }
}

impl CleartextRequest {
    pub fn decode_bytes(bytes: &[u8]) -> TypesResult<Self> {
        CleartextRequest::decode(bytes).map_err(|e| TypesError::decode("CleartextRequest", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_response_inner_decode() {
        let inner = ChaincodeResponseMessage {
            encrypted_response: vec![1, 2, 3],
            enclave_id: "ABCD".into(),
            request_message_hash: vec![9; 32],
            ..Default::default()
        };
        let signed = SignedChaincodeResponseMessage {
            chaincode_response_message: inner.encode_to_vec(),
            signature: vec![7; 70],
        };
        let decoded = SignedChaincodeResponseMessage::from_base64(&signed.to_base64()).unwrap();
        assert_eq!(decoded.response().unwrap(), inner);
    }

    #[test]
    fn test_garbage_response_rejected() {
        let signed = SignedChaincodeResponseMessage {
            chaincode_response_message: vec![0xff, 0xff, 0xff],
            signature: Vec::new(),
        };
        assert!(matches!(signed.response(), Err(TypesError::Decode { .. })));
    }
}
