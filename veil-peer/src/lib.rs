//! # Veil Peer
//!
//! Hosts the enclave registry chaincode (`ercc`) and one enclave chaincode per
//! installed program on a single channel, backed by an in-memory ledger.
//!
//! Registry functions: `registerEnclave`, `queryEnclaveCredentials`,
//! `queryListEnclaveCredentials`, `queryChaincodeEncryptionKey`,
//! `queryChaincodeEndPoints`, `queryListProvisionedEnclaves`.
//!
//! Enclave chaincode functions: `__initEnclave`, `__invoke`, `__endorse`,
//! `__setup`.

pub mod auction;
pub mod chaincode;
pub mod config;
pub mod error;
pub mod peer;
pub mod response;
pub mod session;

pub use auction::{AuctionProgram, AuctionResult};
pub use chaincode::{EnclaveChaincode, RegistryChaincode, REGISTRY_PROGRAM_ID};
pub use config::PeerConfig;
pub use error::{PeerError, PeerResult};
pub use peer::Peer;
pub use response::ChaincodeResponse;
pub use session::{Invocation, Session};
