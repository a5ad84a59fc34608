use thiserror::Error;
use veil_attestation::AttestationError;
use veil_storage::StorageError;
use veil_types::{ErrorKind, TypesError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Empty credentials")]
    EmptyCredentials,

    #[error("Credentials carry no attested data")]
    MissingAttestedData,

    #[error("Credentials carry no evidence")]
    MissingEvidence,

    #[error("Attested data carries no {0}")]
    MissingParams(&'static str),

    #[error("No program definition for {0}")]
    UnknownProgram(String),

    #[error("Program definition for {program_id} has malformed measurement {measurement:?}")]
    InvalidMeasurement { program_id: String, measurement: String },

    #[error("Attested channel {actual} does not match channel {expected}")]
    ChannelMismatch { expected: String, actual: String },

    #[error("Attested measurement {actual} does not match defined measurement {expected}")]
    MeasurementMismatch { expected: String, actual: String },

    #[error("Attested sequence {actual} does not match defined sequence {expected}")]
    SequenceMismatch { expected: i64, actual: i64 },

    #[error("Submitter {creator} is not the attested host operator {operator}")]
    HostMismatch { creator: String, operator: String },

    #[error("Submitter identity bytes do not match the attested host identity")]
    HostIdentityMismatch,

    #[error("{0} is not admitted by the program endorsement policy")]
    PolicyRejected(String),

    #[error("Enclave {enclave_id} is already registered with different credentials")]
    ConflictingRegistration { enclave_id: String },

    #[error("Program {program_id} already has enclave {existing}")]
    EnclaveAlreadyDesignated { program_id: String, existing: String },

    #[error("No credentials for enclave {enclave_id} of program {program_id}")]
    CredentialsNotFound { program_id: String, enclave_id: String },

    #[error("No enclave registered for program {0}")]
    NoEnclave(String),

    #[error(transparent)]
    Attestation(#[from] AttestationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::UnknownProgram(_)
            | RegistryError::InvalidMeasurement { .. }
            | RegistryError::ChannelMismatch { .. }
            | RegistryError::MeasurementMismatch { .. }
            | RegistryError::SequenceMismatch { .. }
            | RegistryError::HostMismatch { .. }
            | RegistryError::HostIdentityMismatch
            | RegistryError::PolicyRejected(_)
            | RegistryError::ConflictingRegistration { .. }
            | RegistryError::EnclaveAlreadyDesignated { .. } => ErrorKind::Consistency,
            RegistryError::Attestation(e) => e.kind(),
            RegistryError::Storage(e) => e.kind(),
            RegistryError::Types(e) => e.kind(),
            _ => ErrorKind::Input,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
