//! Per-transaction view of the ledger.

use veil_types::{Message, ProgramDefinition, SerializedIdentity, SignedProposal};

use crate::error::StorageResult;
use crate::ledger::{LedgerState, ProgramDefinitions, TransactionContext};
use crate::memory::{MemoryLedger, NamespacedState};

/// Ledger access for one transaction against one namespace.
pub struct TxStub {
    state: NamespacedState,
    ledger: MemoryLedger,
    channel_id: String,
    tx_id: String,
    creator: Vec<u8>,
    signed_proposal: Option<SignedProposal>,
}

impl TxStub {
    pub fn new(
        ledger: &MemoryLedger,
        namespace: &str,
        channel_id: impl Into<String>,
        creator: &SerializedIdentity,
    ) -> Self {
        Self {
            state: ledger.namespace(namespace),
            ledger: ledger.clone(),
            channel_id: channel_id.into(),
            tx_id: String::new(),
            creator: creator.encode_to_vec(),
            signed_proposal: None,
        }
    }

    pub fn with_tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = tx_id.into();
        self
    }

    pub fn with_signed_proposal(mut self, signed_proposal: SignedProposal) -> Self {
        self.signed_proposal = Some(signed_proposal);
        self
    }
}

impl LedgerState for TxStub {
    fn get_state(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.state.get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.state.put_state(key, value)
    }

    fn del_state(&self, key: &str) -> StorageResult<()> {
        self.state.del_state(key)
    }

    fn state_by_prefix(&self, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>> {
        self.state.state_by_prefix(prefix)
    }
}

impl ProgramDefinitions for TxStub {
    fn program_definition(&self, program_id: &str) -> StorageResult<Option<ProgramDefinition>> {
        self.ledger.program_definition(program_id)
    }
}

impl TransactionContext for TxStub {
    fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn creator(&self) -> &[u8] {
        &self.creator
    }

    fn signed_proposal(&self) -> Option<&SignedProposal> {
        self.signed_proposal.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ChaincodeStub;

    #[test]
    fn test_stub_shares_ledger() {
        let ledger = MemoryLedger::new();
        let creator = SerializedIdentity::new("Org1MSP", b"alice".to_vec());
        let stub = TxStub::new(&ledger, "auction", "mychannel", &creator).with_tx_id("tx1");

        stub.as_state().put_state("k", b"v".to_vec()).unwrap();
        assert_eq!(ledger.namespace("auction").get_state("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(stub.channel_id(), "mychannel");
        assert_eq!(stub.tx_id(), "tx1");
        assert_eq!(SerializedIdentity::decode_bytes(stub.creator()).unwrap(), creator);
        assert!(stub.signed_proposal().is_none());
    }
}
