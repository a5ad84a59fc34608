//! Transaction proposals and submitter identities.

use prost::Message;

use crate::encoding::from_base64;
use crate::error::{TypesError, TypesResult};

/// Function name under which encrypted requests are submitted.
pub const INVOKE_FUNCTION: &str = "__invoke";

/// Organization-scoped identity of a transaction submitter.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SerializedIdentity {
    #[prost(string, tag = "1")]
    pub msp_id: String,
    #[prost(bytes = "vec", tag = "2")]
    pub id_bytes: Vec<u8>,
}

impl SerializedIdentity {
    pub fn new(msp_id: impl Into<String>, id_bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            msp_id: msp_id.into(),
            id_bytes: id_bytes.into(),
        }
    }

    pub fn decode_bytes(bytes: &[u8]) -> TypesResult<Self> {
        SerializedIdentity::decode(bytes).map_err(|e| TypesError::decode("SerializedIdentity", e))
    }
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ProposalHeader {
    #[prost(string, tag = "1")]
    pub channel_id: String,
    #[prost(string, tag = "2")]
    pub tx_id: String,
    /// Encoded [`SerializedIdentity`] of the submitter
    #[prost(bytes = "vec", tag = "3")]
    pub creator: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub args: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Proposal {
    #[prost(message, optional, tag = "1")]
    pub header: Option<ProposalHeader>,
    #[prost(string, tag = "2")]
    pub program_id: String,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
}

#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SignedProposal {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

impl Proposal {
    /// Proposal calling `function(args)` on `program_id`.
    pub fn call(
        channel_id: impl Into<String>,
        tx_id: impl Into<String>,
        creator: &SerializedIdentity,
        program_id: impl Into<String>,
        function: &str,
        args: &[&str],
    ) -> Self {
        let args = std::iter::once(function)
            .chain(args.iter().copied())
            .map(|a| a.as_bytes().to_vec())
            .collect();
        Self {
            header: Some(ProposalHeader {
                channel_id: channel_id.into(),
                tx_id: tx_id.into(),
                creator: creator.encode_to_vec(),
            }),
            program_id: program_id.into(),
            input: Some(ChaincodeInput { args }),
        }
    }

    /// Proposal carrying an encrypted request as `[__invoke, request]`.
    pub fn invoke(
        channel_id: impl Into<String>,
        tx_id: impl Into<String>,
        creator: &SerializedIdentity,
        program_id: impl Into<String>,
        request_base64: &str,
    ) -> Self {
        Self::call(channel_id, tx_id, creator, program_id, INVOKE_FUNCTION, &[request_base64])
    }

    /// Signed envelope; signature material is supplied by the submitter's wallet.
    pub fn sign_with(&self, signature: Vec<u8>) -> SignedProposal {
        SignedProposal {
            proposal_bytes: self.encode_to_vec(),
            signature,
        }
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.header.as_ref().map(|h| h.channel_id.as_str())
    }

    pub fn args(&self) -> &[Vec<u8>] {
        self.input.as_ref().map(|i| i.args.as_slice()).unwrap_or(&[])
    }

    /// First argument, naming the function to call.
    pub fn function(&self) -> Option<&str> {
        self.args().first().and_then(|f| std::str::from_utf8(f).ok())
    }

    /// Arguments after the function name, as text.
    pub fn string_args(&self) -> TypesResult<Vec<String>> {
        self.args()
            .iter()
            .skip(1)
            .map(|a| {
                String::from_utf8(a.clone()).map_err(|_| TypesError::MissingField("text argument"))
            })
            .collect()
    }

    /// Raw request bytes carried by an `[__invoke, base64(request)]` proposal.
    pub fn request_bytes(&self) -> TypesResult<Vec<u8>> {
        match self.args() {
            [_function, request] => {
                let text = std::str::from_utf8(request)
                    .map_err(|_| TypesError::MissingField("request argument"))?;
                from_base64(text)
            }
            _ => Err(TypesError::MissingField("request argument")),
        }
    }
}

impl SignedProposal {
    pub fn proposal(&self) -> TypesResult<Proposal> {
        Proposal::decode(self.proposal_bytes.as_slice()).map_err(|e| TypesError::decode("Proposal", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::to_base64;

    #[test]
    fn test_invoke_proposal_request_bytes() {
        let creator = SerializedIdentity::new("Org1MSP", b"alice".to_vec());
        let request = to_base64(b"request");
        let signed = Proposal::invoke("mychannel", "tx1", &creator, "auction", &request).sign_with(Vec::new());

        let proposal = signed.proposal().unwrap();
        assert_eq!(proposal.channel_id(), Some("mychannel"));
        assert_eq!(proposal.request_bytes().unwrap(), b"request".to_vec());
        let header = proposal.header.unwrap();
        assert_eq!(SerializedIdentity::decode_bytes(&header.creator).unwrap(), creator);
    }

    #[test]
    fn test_call_args() {
        let creator = SerializedIdentity::new("Org1MSP", Vec::new());
        let proposal = Proposal::call("ch", "tx", &creator, "ercc", "queryChaincodeEndPoints", &["auction"]);
        assert_eq!(proposal.function(), Some("queryChaincodeEndPoints"));
        assert_eq!(proposal.string_args().unwrap(), vec!["auction".to_string()]);
    }

    #[test]
    fn test_request_bytes_requires_two_args() {
        let proposal = Proposal {
            input: Some(ChaincodeInput { args: vec![b"__invoke".to_vec()] }),
            ..Default::default()
        };
        assert!(proposal.request_bytes().is_err());
    }
}
