//! # Veil Enclave Registry
//!
//! Per `(program_id, enclave_id)` an enclave is either unregistered or
//! registered; registration is terminal. [`EnclaveRegistry::register_enclave`]
//! admits an enclave after, in order:
//!
//! 1. decoding the credentials and requiring attested data and evidence
//! 2. matching channel, measurement and sequence to the program definition
//! 3. verifying the evidence against the defined measurement
//! 4. evaluating the submitter against the attested host and the policy
//!
//! Queries serve credentials, the program encryption key, host endpoints and
//! provisioned enclave ids.

pub mod error;
pub mod identity;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use identity::{IdentityEvaluator, MspIdentityEvaluator};
pub use registry::{EnclaveRegistry, CREDENTIALS_KEY_TYPE, PROVISIONED_KEY_TYPE};
