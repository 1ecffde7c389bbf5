//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use bytes::{Bytes, BytesMut};
use midst::name::Name;
use midst::packet::error::DecodeError;
use midst::packet::lsa::{
    AdjacencyEntry, AdjacencyLsa, CoordinateLsa, Lsa, LsaBody, LsaHdr,
    MidstLsa, MidstPrefix, MidstPrefixList, NameLsa,
};

use super::{expiry, test_decode_lsa, test_encode_lsa};

static NAME_LSA1: Lazy<(Vec<u8>, Lsa)> = Lazy::new(|| {
    (
        vec![
            0x89, 0x20, 0x80, 0x14, 0x81, 0x05, 0x07, 0x03, 0x08, 0x01, 0x61,
            0x82, 0x01, 0x01, 0x8b, 0x08, 0x00, 0x00, 0x01, 0x74, 0x87, 0x6e,
            0x80, 0x00, 0x07, 0x08, 0x08, 0x01, 0x61, 0x08, 0x03, 0x61, 0x70,
            0x70,
        ],
        Lsa::new(
            LsaHdr::new(Name::from("/a"), 1, expiry()),
            LsaBody::Name(NameLsa::new(vec![Name::from("/a/app")])),
        ),
    )
});

static ADJ_LSA1: Lazy<(Vec<u8>, Lsa)> = Lazy::new(|| {
    (
        vec![
            0x83, 0x32, 0x80, 0x14, 0x81, 0x05, 0x07, 0x03, 0x08, 0x01, 0x61,
            0x82, 0x01, 0x01, 0x8b, 0x08, 0x00, 0x00, 0x01, 0x74, 0x87, 0x6e,
            0x80, 0x00, 0x84, 0x1a, 0x07, 0x03, 0x08, 0x01, 0x62, 0x8d, 0x09,
            0x75, 0x64, 0x70, 0x34, 0x3a, 0x2f, 0x2f, 0x72, 0x32, 0x8c, 0x08,
            0x40, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ],
        Lsa::new(
            LsaHdr::new(Name::from("/a"), 1, expiry()),
            LsaBody::Adjacency(AdjacencyLsa::new(vec![AdjacencyEntry::new(
                Name::from("/b"),
                "udp4://r2".to_owned(),
                10.0,
            )])),
        ),
    )
});

static COR_LSA1: Lazy<(Vec<u8>, Lsa)> = Lazy::new(|| {
    (
        vec![
            0x85, 0x2a, 0x80, 0x14, 0x81, 0x05, 0x07, 0x03, 0x08, 0x01, 0x61,
            0x82, 0x01, 0x01, 0x8b, 0x08, 0x00, 0x00, 0x01, 0x74, 0x87, 0x6e,
            0x80, 0x00, 0x87, 0x08, 0x40, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x88, 0x08, 0x3f, 0xf8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ],
        Lsa::new(
            LsaHdr::new(Name::from("/a"), 1, expiry()),
            LsaBody::Coordinate(CoordinateLsa::new(10.0, vec![1.5])),
        ),
    )
});

static MIDST_LSA1: Lazy<(Vec<u8>, Lsa)> = Lazy::new(|| {
    let mut prefixes = MidstPrefixList::default();
    prefixes.insert(MidstPrefix::new(
        Name::from("/c/v"),
        0.0,
        Name::from("/c"),
        1,
    ));
    (
        vec![
            0x8e, 0x39, 0x80, 0x14, 0x81, 0x05, 0x07, 0x03, 0x08, 0x01, 0x63,
            0x82, 0x01, 0x01, 0x8b, 0x08, 0x00, 0x00, 0x01, 0x74, 0x87, 0x6e,
            0x80, 0x00, 0x8f, 0x21, 0x07, 0x06, 0x08, 0x01, 0x63, 0x08, 0x01,
            0x76, 0x90, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x07, 0x03, 0x08, 0x01, 0x63, 0x91, 0x08, 0x3f, 0xf0, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ],
        Lsa::new(
            LsaHdr::new(Name::from("/c"), 1, expiry()),
            LsaBody::Midst(MidstLsa::new(prefixes)),
        ),
    )
});

#[test]
fn test_encode_name_lsa1() {
    let (ref bytes, ref lsa) = *NAME_LSA1;
    test_encode_lsa(bytes, lsa);
}

#[test]
fn test_decode_name_lsa1() {
    let (ref bytes, ref lsa) = *NAME_LSA1;
    test_decode_lsa(bytes, lsa);
}

#[test]
fn test_encode_adj_lsa1() {
    let (ref bytes, ref lsa) = *ADJ_LSA1;
    test_encode_lsa(bytes, lsa);
}

#[test]
fn test_decode_adj_lsa1() {
    let (ref bytes, ref lsa) = *ADJ_LSA1;
    test_decode_lsa(bytes, lsa);
}

#[test]
fn test_encode_cor_lsa1() {
    let (ref bytes, ref lsa) = *COR_LSA1;
    test_encode_lsa(bytes, lsa);
}

#[test]
fn test_decode_cor_lsa1() {
    let (ref bytes, ref lsa) = *COR_LSA1;
    test_decode_lsa(bytes, lsa);
}

#[test]
fn test_encode_midst_lsa1() {
    let (ref bytes, ref lsa) = *MIDST_LSA1;
    test_encode_lsa(bytes, lsa);
}

#[test]
fn test_decode_midst_lsa1() {
    let (ref bytes, ref lsa) = *MIDST_LSA1;
    test_decode_lsa(bytes, lsa);
}

// An empty MIDST LSA encodes as a zero-length prefix list and decodes back.
#[test]
fn test_midst_lsa_empty() {
    let lsa = Lsa::new(
        LsaHdr::new(Name::from("/c"), 2, expiry()),
        LsaBody::Midst(MidstLsa::default()),
    );
    let bytes = lsa.to_bytes();
    // Outer block wraps the 22-octet header plus "8f 00".
    assert_eq!(&bytes[bytes.len() - 2..], &[0x8f, 0x00]);
    let mut buf = bytes.clone();
    let decoded = Lsa::decode(&mut buf).unwrap();
    assert_eq!(lsa, decoded);
}

// Relay encode: only the prefix-list portion is emitted and every distance
// is increased by exactly the extra distance.
#[test]
fn test_midst_encode_forward() {
    let (_, ref lsa) = *MIDST_LSA1;
    let midst_lsa = lsa.body.as_midst().unwrap();

    let mut buf = BytesMut::new();
    midst_lsa.encode_forward(&mut buf, 5.0);
    let mut buf = buf.freeze();

    let list = MidstPrefixList::decode(&mut buf).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.distance(&Name::from("/c/v")), Some(5.0));
    assert_eq!(list.anchor(&Name::from("/c/v")), Some(&Name::from("/c")));
    assert_eq!(list.seq_no(&Name::from("/c/v")), Some(1));
}

// Entry fields are required in the exact order Name, Distance, Anchor,
// SeqNo.
#[test]
fn test_midst_prefix_list_missing_distance() {
    let bytes = [
        0x8f, 0x08, 0x07, 0x06, 0x08, 0x01, 0x63, 0x08, 0x01, 0x76,
    ];
    let mut buf = Bytes::copy_from_slice(&bytes);
    assert_eq!(
        MidstPrefixList::decode(&mut buf),
        Err(DecodeError::MissingField("Distance"))
    );
}

#[test]
fn test_midst_prefix_list_out_of_order() {
    // Name followed by SeqNo where Distance is expected.
    let bytes = [
        0x8f, 0x12, 0x07, 0x06, 0x08, 0x01, 0x63, 0x08, 0x01, 0x76, 0x91,
        0x08, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let mut buf = Bytes::copy_from_slice(&bytes);
    assert!(MidstPrefixList::decode(&mut buf).is_err());
}

#[test]
fn test_unknown_top_level_type() {
    let bytes = [0xf0, 0x00];
    let mut buf = Bytes::copy_from_slice(&bytes);
    assert_eq!(
        Lsa::decode(&mut buf),
        Err(DecodeError::UnknownTopLevelType(0xf0))
    );
}

// Unknown trailing sub-TLVs inside an LSA body are skipped.
#[test]
fn test_name_lsa_unknown_subtlv() {
    let (ref bytes, ref lsa) = *NAME_LSA1;
    let mut bytes = bytes.clone();
    bytes.extend_from_slice(&[0xc8, 0x01, 0xff]);
    bytes[1] += 3;
    let mut buf = Bytes::copy_from_slice(&bytes);
    let decoded = Lsa::decode(&mut buf).unwrap();
    assert_eq!(*lsa, decoded);
}

// Truncated input surfaces an encoding error rather than a panic.
#[test]
fn test_truncated_lsa() {
    let (ref bytes, _) = *NAME_LSA1;
    let mut buf = Bytes::copy_from_slice(&bytes[..bytes.len() - 4]);
    assert!(Lsa::decode(&mut buf).is_err());
}

// The MIDST update keeps tuples for retained names and reports the prefix
// delta for additions and removals.
#[test]
fn test_midst_lsa_update() {
    let mut stored = MidstPrefixList::default();
    stored.insert(MidstPrefix::new(
        Name::from("/c/v"),
        5.0,
        Name::from("/c"),
        1,
    ));
    stored.insert(MidstPrefix::new(
        Name::from("/c/w"),
        5.0,
        Name::from("/c"),
        1,
    ));
    let mut stored = MidstLsa::new(stored);

    let mut new = MidstPrefixList::default();
    new.insert(MidstPrefix::new(
        Name::from("/c/v"),
        7.0,
        Name::from("/c"),
        2,
    ));
    new.insert(MidstPrefix::new(
        Name::from("/c/x"),
        3.0,
        Name::from("/d"),
        2,
    ));
    let new = MidstLsa::new(new);

    let (changed, added, removed) = stored.update(&new);
    assert!(changed);
    assert_eq!(added, vec![Name::from("/c/x")]);
    assert_eq!(removed, vec![Name::from("/c/w")]);
    // Retained names keep their stored tuple.
    assert_eq!(stored.prefixes.distance(&Name::from("/c/v")), Some(5.0));
    // Added names copy the tuple from the newer LSA.
    assert_eq!(stored.prefixes.distance(&Name::from("/c/x")), Some(3.0));
    assert_eq!(
        stored.prefixes.anchor(&Name::from("/c/x")),
        Some(&Name::from("/d"))
    );
}

// Removing every name reports the old list as the removal set.
#[test]
fn test_midst_lsa_update_removed_all() {
    let mut stored = MidstPrefixList::default();
    stored.insert(MidstPrefix::new(
        Name::from("/c/v"),
        5.0,
        Name::from("/c"),
        1,
    ));
    let mut stored = MidstLsa::new(stored);

    let (changed, added, removed) = stored.update(&MidstLsa::default());
    assert!(changed);
    assert!(added.is_empty());
    assert_eq!(removed, vec![Name::from("/c/v")]);
    assert!(stored.prefixes.is_empty());
}
