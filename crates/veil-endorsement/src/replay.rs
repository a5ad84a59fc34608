//! Read/write-set replay.

use tracing::{debug, warn};
use veil_storage::LedgerState;
use veil_types::keys::to_ledger_key;
use veil_types::{sha256, ProgramRwSet};

use crate::error::{ReplayError, ReplayResult};

/// Re-checks every claimed read against `state`, then applies the writes.
///
/// Nothing is written unless every read matches and every write key resolves.
/// A missing set is an empty one.
pub fn replay_read_writes(state: &dyn LedgerState, rw_set: Option<&ProgramRwSet>) -> ReplayResult<()> {
    let Some(rw_set) = rw_set else {
        return Ok(());
    };
    if !rw_set.range_queries.is_empty() {
        return Err(ReplayError::RangeQueriesUnsupported(rw_set.range_queries.len()));
    }

    for read in &rw_set.reads {
        let key = to_ledger_key(&read.key)?;
        let value = state.get_state(&key)?;
        if sha256(value.as_deref().unwrap_or_default()).as_slice() != read.value_hash.as_slice() {
            warn!(key = %read.key, "Read hash mismatch during replay");
            return Err(ReplayError::ReadMismatch { key: read.key.clone() });
        }
    }

    let mut writes = Vec::with_capacity(rw_set.writes.len());
    for write in &rw_set.writes {
        let key = to_ledger_key(&write.key)?;
        if key.is_empty() {
            return Err(ReplayError::EmptyWriteKey);
        }
        writes.push((key, write));
    }
    for (key, write) in writes {
        if write.is_delete {
            state.del_state(&key)?;
        } else {
            state.put_state(&key, write.value.clone())?;
        }
    }

    debug!(
        reads = rw_set.reads.len(),
        writes = rw_set.writes.len(),
        "Replayed read/write set"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_storage::MemoryLedger;
    use veil_types::keys::create_composite_key;
    use veil_types::{KvRead, KvWrite, RangeQueryInfo};

    fn read(key: &str, value: &[u8]) -> KvRead {
        KvRead {
            key: key.into(),
            value_hash: sha256(value).to_vec(),
        }
    }

    fn write(key: &str, value: &[u8]) -> KvWrite {
        KvWrite {
            key: key.into(),
            is_delete: false,
            value: value.to_vec(),
        }
    }

    #[test]
    fn test_replay_applies_writes() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        ns.put_state("a", b"1".to_vec()).unwrap();
        ns.put_state("gone", b"x".to_vec()).unwrap();

        let rw = ProgramRwSet {
            reads: vec![read("a", b"1"), read("missing", b"")],
            writes: vec![
                write("a", b"2"),
                KvWrite {
                    key: "gone".into(),
                    is_delete: true,
                    value: Vec::new(),
                },
            ],
            range_queries: Vec::new(),
        };
        replay_read_writes(&ns, Some(&rw)).unwrap();
        assert_eq!(ns.get_state("a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(ns.get_state("gone").unwrap(), None);
    }

    #[test]
    fn test_one_bad_read_blocks_all_writes() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        ns.put_state("a", b"1".to_vec()).unwrap();
        ns.put_state("b", b"2".to_vec()).unwrap();

        let rw = ProgramRwSet {
            reads: vec![read("a", b"1"), read("b", b"stale")],
            writes: vec![write("c", b"3"), write("a", b"9")],
            range_queries: Vec::new(),
        };
        let err = replay_read_writes(&ns, Some(&rw)).unwrap_err();
        assert!(matches!(err, ReplayError::ReadMismatch { ref key } if key == "b"));
        assert_eq!(err.kind(), veil_types::ErrorKind::Replay);
        assert_eq!(ns.get_state("c").unwrap(), None);
        assert_eq!(ns.get_state("a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_enclave_composite_keys_resolved() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        let ledger_key = create_composite_key("bid", &["MyAuction", "alice"]).unwrap();
        ns.put_state(&ledger_key, b"200".to_vec()).unwrap();

        let rw = ProgramRwSet {
            reads: vec![read(".bid.MyAuction.alice.", b"200")],
            writes: vec![write(".bid.MyAuction.alice.", b"300")],
            range_queries: Vec::new(),
        };
        replay_read_writes(&ns, Some(&rw)).unwrap();
        assert_eq!(ns.get_state(&ledger_key).unwrap(), Some(b"300".to_vec()));
        assert_eq!(ns.get_state(".bid.MyAuction.alice.").unwrap(), None);
    }

    #[test]
    fn test_range_queries_rejected() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        let rw = ProgramRwSet {
            reads: Vec::new(),
            writes: vec![write("a", b"1")],
            range_queries: vec![RangeQueryInfo {
                start_key: "a".into(),
                end_key: "z".into(),
            }],
        };
        assert!(matches!(
            replay_read_writes(&ns, Some(&rw)),
            Err(ReplayError::RangeQueriesUnsupported(1))
        ));
        assert_eq!(ledger.key_count("auction"), 0);
    }

    #[test]
    fn test_empty_and_missing_sets() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        replay_read_writes(&ns, None).unwrap();
        replay_read_writes(&ns, Some(&ProgramRwSet::default())).unwrap();
    }

    #[test]
    fn test_empty_write_key_rejected_before_any_write() {
        let ledger = MemoryLedger::new();
        let ns = ledger.namespace("auction");
        let rw = ProgramRwSet {
            reads: Vec::new(),
            writes: vec![write("a", b"1"), write("", b"2")],
            range_queries: Vec::new(),
        };
        assert!(matches!(replay_read_writes(&ns, Some(&rw)), Err(ReplayError::EmptyWriteKey)));
        assert_eq!(ledger.key_count("auction"), 0);
    }
}
