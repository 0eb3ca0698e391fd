//! End-to-end integrity tests for the ledger core.
//!
//! These walk the public API the way a front end would: build a chain,
//! hand it to storage, read it back, tamper with it, and check that
//! verification says exactly what broke and where.

use mhchain::config::{GENESIS_PAYLOAD, GENESIS_PREDECESSOR};
use mhchain::crypto::block_digest;
use mhchain::storage::{Block, Chain, ChainDB, SharedChain, VerifyOptions, ViolationKind};
use mhchain::ChainError;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// genesis → "first" → "second"
fn first_second_chain() -> Chain {
    let mut chain = Chain::genesis();
    chain.append(b"first".to_vec()).expect("append first");
    chain.append(b"second".to_vec()).expect("append second");
    chain
}

/// Swap the payload at `index` without touching any hash.
fn with_payload(chain: &Chain, index: usize, payload: &[u8]) -> Chain {
    let mut blocks = chain.blocks().to_vec();
    let (_, prev, hash) = blocks[index].clone().into_raw_parts();
    blocks[index] = Block::from_raw_parts(payload.to_vec(), prev, hash);
    Chain::from_blocks(blocks)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn genesis_then_two_appends() {
    let chain = first_second_chain();

    assert_eq!(chain.len(), 3);
    assert!(chain.verify().unwrap().is_valid());
    assert_eq!(
        chain.block_at(2).unwrap().predecessor_hash(),
        chain.block_at(1).unwrap().hash()
    );
}

#[test]
fn genesis_follows_convention() {
    let chain = Chain::genesis();
    let genesis = chain.block_at(0).unwrap();

    assert_eq!(genesis.payload(), GENESIS_PAYLOAD);
    assert_eq!(genesis.predecessor_hash(), GENESIS_PREDECESSOR);
    assert_eq!(*genesis.hash(), block_digest(GENESIS_PAYLOAD, GENESIS_PREDECESSOR));
}

#[test]
fn tampered_payload_is_reported_at_its_index() {
    let tampered = with_payload(&first_second_chain(), 1, b"tampered");
    let report = tampered.verify().unwrap();

    assert!(!report.is_valid());
    assert_eq!(report.violated_indices(), vec![1]);

    let violation = report.violations_at(1).next().unwrap();
    match &violation.kind {
        ViolationKind::ContentIntegrity { stored, computed } => {
            assert_eq!(stored, tampered.block_at(1).unwrap().hash());
            let prev = tampered.block_at(0).unwrap().hash();
            assert_eq!(*computed, block_digest(b"tampered", prev));
        }
        other => panic!("expected content-integrity violation, got {other:?}"),
    }
}

#[test]
fn forging_a_consistent_block_breaks_the_next_link() {
    let chain = first_second_chain();
    let mut blocks = chain.blocks().to_vec();
    let prev = blocks[0].hash().to_vec();
    blocks[1] = Block::new(b"rewritten history".to_vec(), prev);

    let report = Chain::from_blocks(blocks).verify().unwrap();
    assert_eq!(report.violated_indices(), vec![2]);
    assert!(report.has_violation(2, "linkage"));
}

#[test]
fn every_tampered_index_is_reported() {
    let mut chain = Chain::genesis();
    for i in 0..10 {
        chain.append(format!("record {i}").into_bytes()).unwrap();
    }
    let chain = with_payload(&chain, 3, b"x");
    let chain = with_payload(&chain, 7, b"y");

    let report = chain.verify().unwrap();
    assert_eq!(report.length, 11);
    assert_eq!(report.violated_indices(), vec![3, 7]);
}

#[test]
fn empty_payload_block_verifies() {
    let mut chain = first_second_chain();
    chain.append(Vec::new()).expect("empty payload must be accepted");

    assert_eq!(chain.len(), 4);
    assert!(chain.block_at(3).unwrap().payload().is_empty());
    assert!(chain.verify().unwrap().is_valid());
}

#[test]
fn append_to_chain_without_genesis_fails_cleanly() {
    let mut chain = Chain::default();
    let err = chain.append(b"data".to_vec()).unwrap_err();

    assert!(matches!(err, ChainError::InvalidChainState(_)));
    assert!(err.to_string().contains("empty chain"));
}

#[test]
fn repeated_verification_is_stable() {
    let chain = first_second_chain();
    let reports: Vec<_> = (0..5).map(|_| chain.verify().unwrap()).collect();
    assert!(reports.windows(2).all(|pair| pair[0] == pair[1]));

    let tampered = with_payload(&chain, 2, b"nope");
    let first = tampered.verify().unwrap();
    let second = tampered.verify().unwrap();
    assert_eq!(first, second);
}

#[test]
fn suffix_verifies_only_with_lenient_genesis() {
    let chain = first_second_chain();
    let suffix = Chain::from_blocks(chain.blocks()[1..].to_vec());

    assert!(!suffix.verify().unwrap().is_valid());
    assert!(suffix
        .verify_with(VerifyOptions::lenient())
        .unwrap()
        .is_valid());
}

// ---------------------------------------------------------------------------
// Storage & Sharing
// ---------------------------------------------------------------------------

#[test]
fn persisted_chain_survives_reopen_and_verifies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let shared = SharedChain::genesis();

    {
        let db = ChainDB::open(dir.path()).expect("open db");
        db.put_block(0, &shared.block_at(0).unwrap()).unwrap();
        for payload in [
            b"alpha".as_slice(),
            b"".as_slice(),
            b"\x00\x01\x02".as_slice(),
        ] {
            let (index, block) = shared.append(payload.to_vec()).unwrap();
            db.put_block(index as u64, &block).unwrap();
        }
    }

    let db = ChainDB::open(dir.path()).expect("reopen db");
    let loaded = db.load_chain().unwrap();
    assert_eq!(loaded, shared.snapshot());
    assert!(loaded.verify().unwrap().is_valid());
    assert_eq!(loaded.tail_hash().unwrap(), shared.tail_hash().unwrap());
}

#[test]
fn concurrent_writers_through_shared_handle() {
    let shared = SharedChain::genesis();
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    shared.append(format!("{w}:{i}").into_bytes()).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let chain = shared.snapshot();
    assert_eq!(chain.len(), 201);
    assert!(chain.verify().unwrap().is_valid());
}

#[test]
fn failed_write_keeps_store_reloadable() {
    type WriteResult = Result<(), Box<dyn std::error::Error>>;

    let dir = tempfile::tempdir().expect("tempdir");
    let shared = SharedChain::genesis();

    {
        let db = ChainDB::open(dir.path()).expect("open db");
        db.put_block(0, &shared.block_at(0).unwrap()).unwrap();

        let lost = shared.append_with(b"lost".to_vec(), |_, _| -> WriteResult {
            Err("simulated write failure".into())
        });
        assert!(lost.is_err());

        let (index, _) = shared
            .append_with(b"next".to_vec(), |index, block| -> WriteResult {
                db.put_block(index as u64, block)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(index, 1);
    }

    let db = ChainDB::open(dir.path()).expect("reopen db");
    let loaded = db.load_chain().expect("store has no gaps");
    assert_eq!(loaded, shared.snapshot());
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.block_at(1).unwrap().payload(), b"next");
}

#[test]
fn concurrent_persisting_writers_leave_a_complete_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = std::sync::Arc::new(ChainDB::open(dir.path()).expect("open db"));
    let shared = SharedChain::genesis();
    db.put_block(0, &shared.block_at(0).unwrap()).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let shared = shared.clone();
            let db = std::sync::Arc::clone(&db);
            std::thread::spawn(move || {
                for i in 0..20 {
                    shared
                        .append_with(format!("{w}:{i}").into_bytes(), |index, block| {
                            db.put_block(index as u64, block)
                                .map_err(|e| ChainError::InvalidChainState(e.to_string()))
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(db.latest_index().unwrap(), Some(80));
    let loaded = db.load_chain().unwrap();
    assert_eq!(loaded, shared.snapshot());
    assert!(loaded.verify().unwrap().is_valid());
}
