//! Ledger state accessors.
//!
//! - `LedgerState`: key/value state of one namespace
//! - `ProgramDefinitions`: committed program definitions
//! - `TransactionContext`: channel, submitter and proposal of a transaction
//! - `MemoryLedger` / `TxStub`: in-memory implementations

pub mod error;
pub mod ledger;
pub mod memory;
pub mod stub;

pub use error::{StorageError, StorageResult};
pub use ledger::{ChaincodeStub, LedgerState, ProgramDefinitions, TransactionContext};
pub use memory::{MemoryLedger, NamespacedState};
pub use stub::TxStub;
