// ========== Core Modules ==========
pub mod credentials; // Enclave credentials and attested statements
pub mod encoding; // base64 / hashing helpers
pub mod error;
pub mod keys; // Composite ledger keys
pub mod messages; // Request / response envelopes
pub mod program; // On-ledger program definitions
pub mod proposal; // Proposals and submitter identities

pub use credentials::{AttestedData, Credentials, HostParams, ProgramParams, ATTESTED_DATA_TYPE_URL};
pub use encoding::{enclave_id, from_base64, parse_measurement, sha256, to_base64, MEASUREMENT_LEN};
pub use error::{ErrorKind, TypesError, TypesResult};
pub use messages::{
    ChaincodeRequestMessage, ChaincodeResponseMessage, CleartextRequest, KvRead, KvWrite,
    ProgramRwSet, RangeQueryInfo, SignedChaincodeResponseMessage,
};
pub use program::{EndorsementPolicy, ProgramDefinition};
pub use proposal::{
    ChaincodeInput, Proposal, ProposalHeader, SerializedIdentity, SignedProposal, INVOKE_FUNCTION,
};

// Encoding trait, so downstream crates can call `encode_to_vec` / `decode`
pub use prost::Message;
