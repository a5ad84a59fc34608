//! # Veil Enclave
//!
//! The trusted side of the protocol. An enclave hosts one [`Program`],
//! generates its own signing and program encryption keys at
//! [`EnclaveRuntime::init`], and answers encrypted requests with signed
//! responses that carry the read/write set the program produced.
//!
//! ```text
//! request ──► pk_decrypt(request key) ──► decrypt(CleartextRequest)
//!                                              │
//!                                  Program::invoke(RecordingStub)
//!                                              │
//! SignedChaincodeResponseMessage ◄── sign ◄── encrypt(result, response key)
//! ```
//!
//! At most [`MAX_CONCURRENT_INVOCATIONS`] requests run at once; further
//! callers wait for a slot.

pub mod error;
pub mod program;
pub mod runtime;
pub mod rwset;
pub mod software;

pub use error::{EnclaveError, EnclaveResult};
pub use program::{Program, ProgramStub};
pub use runtime::{EnclaveRuntime, MAX_CONCURRENT_INVOCATIONS};
pub use rwset::RecordingStub;
pub use software::SoftwareEnclave;
