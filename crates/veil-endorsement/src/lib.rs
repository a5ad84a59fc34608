//! # Veil Endorsement
//!
//! Decides whether an enclave response may be committed:
//!
//! - [`Validator::validate`]: enclave signature, enclave id and the binding
//!   between the response and the request in its original proposal
//! - [`replay_read_writes`]: claimed reads re-checked against the ledger,
//!   then writes applied, all or nothing
//! - [`Endorser::endorse`]: both of the above plus registered credentials,
//!   program identity and host approval

pub mod endorser;
pub mod error;
pub mod replay;
pub mod validator;

pub use endorser::Endorser;
pub use error::{
    EndorsementError, EndorsementResult, ReplayError, ReplayResult, ValidationError, ValidationResult,
};
pub use replay::replay_read_writes;
pub use validator::Validator;
