//! Ledger accessor traits.
//!
//! Components never touch a concrete store; they see the slice of the ledger
//! a transaction is allowed to see through these narrow traits.

use veil_types::keys::composite_key_prefix;
use veil_types::{ProgramDefinition, SignedProposal};

use crate::error::StorageResult;

/// Key/value state of one namespace.
pub trait LedgerState: Send + Sync {
    fn get_state(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn put_state(&self, key: &str, value: Vec<u8>) -> StorageResult<()>;

    fn del_state(&self, key: &str) -> StorageResult<()>;

    /// All entries whose key starts with `prefix`, in key order.
    fn state_by_prefix(&self, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>>;

    fn state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let prefix = composite_key_prefix(object_type, attributes)?;
        self.state_by_prefix(&prefix)
    }
}

/// Read-only view of committed program definitions.
pub trait ProgramDefinitions: Send + Sync {
    fn program_definition(&self, program_id: &str) -> StorageResult<Option<ProgramDefinition>>;
}

/// Facts about the transaction being executed.
pub trait TransactionContext: Send + Sync {
    fn channel_id(&self) -> &str;

    fn tx_id(&self) -> &str;

    /// Encoded `SerializedIdentity` of the submitter.
    fn creator(&self) -> &[u8];

    fn signed_proposal(&self) -> Option<&SignedProposal>;
}

/// Everything a chaincode entry point can reach.
pub trait ChaincodeStub: LedgerState + ProgramDefinitions + TransactionContext {
    fn as_state(&self) -> &dyn LedgerState;
}

impl<T> ChaincodeStub for T
where
    T: LedgerState + ProgramDefinitions + TransactionContext,
{
    fn as_state(&self) -> &dyn LedgerState {
        self
    }
}
