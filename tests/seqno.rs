//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fs;

use midst::config::{HyperbolicState, MidstState};
use midst::packet::lsa::LsaType;
use midst::seqno::{SEQ_FILE_NAME, SequencingManager};

#[test]
fn test_write_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    let mut seqno = SequencingManager::new(dir.path());
    seqno.set(LsaType::Name, 42);
    seqno.set(LsaType::Adjacency, 7);
    seqno.set(LsaType::Midst, 3);
    seqno.write_to_file().unwrap();

    // Reading back without initiating applies no bumps.
    let mut restored = SequencingManager::new(dir.path());
    restored.read_from_file().unwrap();
    assert_eq!(restored.seq(LsaType::Name), 42);
    assert_eq!(restored.seq(LsaType::Adjacency), 7);
    assert_eq!(restored.seq(LsaType::Coordinate), 0);
    assert_eq!(restored.seq(LsaType::Midst), 3);
}

#[test]
fn test_file_format() {
    let dir = tempfile::tempdir().unwrap();

    let mut seqno = SequencingManager::new(dir.path());
    seqno.set(LsaType::Name, 1);
    seqno.set(LsaType::Adjacency, 2);
    seqno.set(LsaType::Coordinate, 3);
    seqno.set(LsaType::Midst, 4);
    seqno.write_to_file().unwrap();

    let contents = fs::read_to_string(dir.path().join(SEQ_FILE_NAME)).unwrap();
    assert_eq!(
        contents,
        "NameLsaSeq 1\nAdjLsaSeq 2\nCorLsaSeq 3\nMidstLsaSeq 4"
    );
}

// Restart in link-state mode with MIDST off: name and adjacency counters
// get the recovery bump, the others stay cleared.
#[test]
fn test_recovery_link_state() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(SEQ_FILE_NAME),
        "NameLsaSeq 42\nAdjLsaSeq 7\nCorLsaSeq 0\nMidstLsaSeq 0",
    )
    .unwrap();

    let mut seqno = SequencingManager::new(dir.path());
    seqno.initiate(HyperbolicState::Off, MidstState::Off);
    assert_eq!(seqno.seq(LsaType::Name), 52);
    assert_eq!(seqno.seq(LsaType::Adjacency), 17);
    assert_eq!(seqno.seq(LsaType::Coordinate), 0);
    assert_eq!(seqno.seq(LsaType::Midst), 0);
}

// A missing sequence file leaves every counter at zero, without bumps.
#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    let mut seqno = SequencingManager::new(dir.path());
    seqno.initiate(HyperbolicState::Off, MidstState::Off);
    assert_eq!(seqno.seq(LsaType::Name), 0);
    assert_eq!(seqno.seq(LsaType::Adjacency), 0);
    assert_eq!(seqno.seq(LsaType::Coordinate), 0);
    assert_eq!(seqno.seq(LsaType::Midst), 0);
}

// Counters of routing modes that are no longer configured are cleared
// before the bump of the active mode is applied.
#[test]
fn test_recovery_midst() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(SEQ_FILE_NAME),
        "NameLsaSeq 4\nAdjLsaSeq 0\nCorLsaSeq 0\nMidstLsaSeq 100",
    )
    .unwrap();

    let mut seqno = SequencingManager::new(dir.path());
    seqno.initiate(HyperbolicState::Off, MidstState::On);
    assert_eq!(seqno.seq(LsaType::Name), 0);
    assert_eq!(seqno.seq(LsaType::Adjacency), 10);
    assert_eq!(seqno.seq(LsaType::Coordinate), 0);
    assert_eq!(seqno.seq(LsaType::Midst), 10);
}

#[test]
fn test_recovery_hyperbolic() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(SEQ_FILE_NAME),
        "NameLsaSeq 5\nAdjLsaSeq 9\nCorLsaSeq 2\nMidstLsaSeq 0",
    )
    .unwrap();

    let mut seqno = SequencingManager::new(dir.path());
    seqno.initiate(HyperbolicState::On, MidstState::Off);
    // Link-state leftovers are cleared, the coordinate counter is bumped.
    assert_eq!(seqno.seq(LsaType::Name), 15);
    assert_eq!(seqno.seq(LsaType::Adjacency), 0);
    assert_eq!(seqno.seq(LsaType::Coordinate), 12);
    assert_eq!(seqno.seq(LsaType::Midst), 0);
}

#[test]
fn test_increment() {
    let dir = tempfile::tempdir().unwrap();

    let mut seqno = SequencingManager::new(dir.path());
    assert_eq!(seqno.increment(LsaType::Name), 1);
    assert_eq!(seqno.increment(LsaType::Name), 2);
    assert_eq!(seqno.seq(LsaType::Name), 2);
}
