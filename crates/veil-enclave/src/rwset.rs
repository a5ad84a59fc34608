//! Read/write-set recording.

use std::collections::HashMap;

use veil_storage::LedgerState;
use veil_types::keys::to_enclave_key;
use veil_types::{sha256, KvRead, KvWrite, ProgramRwSet};

use crate::error::EnclaveResult;
use crate::program::ProgramStub;

/// Stub that serves reads from the ledger and records every access.
///
/// Only the first read of a key is recorded. A later write to the same key
/// replaces the earlier one in place, so writes keep first-touch order.
pub struct RecordingStub<'a> {
    ledger: &'a dyn LedgerState,
    reads: Vec<KvRead>,
    read_index: HashMap<String, usize>,
    writes: Vec<KvWrite>,
    write_index: HashMap<String, usize>,
}

impl<'a> RecordingStub<'a> {
    pub fn new(ledger: &'a dyn LedgerState) -> Self {
        Self {
            ledger,
            reads: Vec::new(),
            read_index: HashMap::new(),
            writes: Vec::new(),
            write_index: HashMap::new(),
        }
    }

    fn record_write(&mut self, write: KvWrite) {
        match self.write_index.get(&write.key).copied() {
            Some(i) => self.writes[i] = write,
            None => {
                self.write_index.insert(write.key.clone(), self.writes.len());
                self.writes.push(write);
            }
        }
    }

    pub fn into_rw_set(self) -> ProgramRwSet {
        ProgramRwSet {
            reads: self.reads,
            writes: self.writes,
            range_queries: Vec::new(),
        }
    }
}

impl ProgramStub for RecordingStub<'_> {
    fn get_state(&mut self, key: &str) -> EnclaveResult<Option<Vec<u8>>> {
        let recorded = to_enclave_key(key)?;
        let value = self.ledger.get_state(key)?;
        if !self.read_index.contains_key(&recorded) {
            let value_hash = sha256(value.as_deref().unwrap_or_default()).to_vec();
            self.read_index.insert(recorded.clone(), self.reads.len());
            self.reads.push(KvRead {
                key: recorded,
                value_hash,
            });
        }
        Ok(value)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> EnclaveResult<()> {
        self.record_write(KvWrite {
            key: to_enclave_key(key)?,
            is_delete: false,
            value,
        });
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> EnclaveResult<()> {
        self.record_write(KvWrite {
            key: to_enclave_key(key)?,
            is_delete: true,
            value: Vec::new(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::MemoryLedger;
    use veil_types::keys::create_composite_key;

    #[test]
    fn test_reads_hash_observed_values() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        ns.put_state("a", b"1".to_vec()).unwrap();

        let mut stub = RecordingStub::new(&ns);
        assert_eq!(stub.get_state("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(stub.get_state("missing").unwrap(), None);
        stub.get_state("a").unwrap();

        let rw = stub.into_rw_set();
        assert_eq!(rw.reads.len(), 2);
        assert_eq!(rw.reads[0].value_hash, sha256(b"1").to_vec());
        assert_eq!(rw.reads[1].value_hash, sha256(b"").to_vec());
    }

    #[test]
    fn test_writes_are_recorded_not_applied() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        let mut stub = RecordingStub::new(&ns);
        stub.put_state("a", b"1".to_vec()).unwrap();
        stub.put_state("b", b"2".to_vec()).unwrap();
        stub.put_state("a", b"3".to_vec()).unwrap();
        stub.del_state("b").unwrap();

        let rw = stub.into_rw_set();
        assert_eq!(ns.get_state("a").unwrap(), None);
        assert_eq!(rw.writes.len(), 2);
        assert_eq!(rw.writes[0].key, "a");
        assert_eq!(rw.writes[0].value, b"3".to_vec());
        assert!(rw.writes[1].is_delete);
    }

    #[test]
    fn test_composite_keys_recorded_in_enclave_form() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        let key = create_composite_key("bid", &["MyAuction", "alice"]).unwrap();
        ns.put_state(&key, b"200".to_vec()).unwrap();

        let mut stub = RecordingStub::new(&ns);
        assert_eq!(stub.get_state(&key).unwrap(), Some(b"200".to_vec()));
        stub.put_state(&key, b"300".to_vec()).unwrap();

        let rw = stub.into_rw_set();
        assert_eq!(rw.reads[0].key, ".bid.MyAuction.alice.");
        assert_eq!(rw.writes[0].key, ".bid.MyAuction.alice.");
    }

    #[test]
    fn test_ambiguous_key_rejected_before_recording() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        let mut stub = RecordingStub::new(&ns);
        assert!(stub.put_state("\u{0}auction\u{0}My.Auction\u{0}", b"open".to_vec()).is_err());
        assert!(stub.get_state(".auction.MyAuction.").is_err());

        let rw = stub.into_rw_set();
        assert!(rw.reads.is_empty());
        assert!(rw.writes.is_empty());
    }
}
