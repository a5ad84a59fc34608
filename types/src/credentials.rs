//! Enclave credentials and the data an enclave attests to.

use prost::Message;
use prost_types::Any;

use crate::encoding::{enclave_id, from_base64, to_base64};
use crate::error::{TypesError, TypesResult};

/// Type url carried by the `Any` wrapping serialized [`AttestedData`].
pub const ATTESTED_DATA_TYPE_URL: &str = "type.googleapis.com/veil.AttestedData";

/// Identity of the program an enclave runs, as seen on the ledger.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ProgramParams {
    #[prost(string, tag = "1")]
    pub program_id: String,
    /// Hex-encoded enclave measurement
    #[prost(string, tag = "2")]
    pub measurement: String,
    #[prost(int64, tag = "3")]
    pub sequence: i64,
    #[prost(string, tag = "4")]
    pub channel_id: String,
}

/// The peer hosting an enclave.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct HostParams {
    /// Organization (MSP) controlling the host peer
    #[prost(string, tag = "1")]
    pub operator_id: String,
    #[prost(string, tag = "2")]
    pub host_endpoint: String,
    #[prost(bytes = "vec", tag = "3")]
    pub host_identity: Vec<u8>,
}

/// Statement bound into an enclave's attestation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttestedData {
    /// SEC1-encoded enclave verification key
    #[prost(bytes = "vec", tag = "1")]
    pub enclave_vk: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub program_params: Option<ProgramParams>,
    #[prost(message, optional, tag = "3")]
    pub host_params: Option<HostParams>,
    /// SEC1-encoded program encryption key
    #[prost(bytes = "vec", tag = "4")]
    pub program_ek: Vec<u8>,
}

impl AttestedData {
    pub fn enclave_id(&self) -> String {
        enclave_id(&self.enclave_vk)
    }

    pub fn program_id(&self) -> Option<&str> {
        self.program_params.as_ref().map(|p| p.program_id.as_str())
    }

    /// Wraps the encoded statement into an `Any`.
    pub fn to_any(&self) -> Any {
        Any {
            type_url: ATTESTED_DATA_TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}

/// Everything the registry needs to admit an enclave.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Credentials {
    /// JSON attestation envelope issued inside the enclave
    #[prost(bytes = "vec", tag = "1")]
    pub attestation: Vec<u8>,
    /// JSON evidence envelope produced by attestation conversion
    #[prost(bytes = "vec", tag = "2")]
    pub evidence: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub serialized_attested_data: Option<Any>,
}

impl Credentials {
    pub fn new(attested_data: &AttestedData, attestation: Vec<u8>) -> Self {
        Self {
            attestation,
            evidence: Vec::new(),
            serialized_attested_data: Some(attested_data.to_any()),
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<u8>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Exact bytes of the attested statement, as signed over by the enclave.
    pub fn attested_data_bytes(&self) -> TypesResult<&[u8]> {
        let any = self
            .serialized_attested_data
            .as_ref()
            .ok_or(TypesError::MissingField("serialized_attested_data"))?;
        if any.type_url != ATTESTED_DATA_TYPE_URL {
            return Err(TypesError::TypeUrl {
                expected: ATTESTED_DATA_TYPE_URL,
                actual: any.type_url.clone(),
            });
        }
        Ok(&any.value)
    }

    pub fn attested_data(&self) -> TypesResult<AttestedData> {
        let bytes = self.attested_data_bytes()?;
        AttestedData::decode(bytes).map_err(|e| TypesError::decode("AttestedData", e))
    }

    pub fn decode_bytes(bytes: &[u8]) -> TypesResult<Self> {
        Credentials::decode(bytes).map_err(|e| TypesError::decode("Credentials", e))
    }

    pub fn from_base64(text: &str) -> TypesResult<Self> {
        let bytes = from_base64(text)?;
        Self::decode_bytes(&bytes)
    }

    pub fn to_base64(&self) -> String {
        to_base64(self.encode_to_vec())
    }
}
