//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod lsa;
mod name;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use midst::packet::lsa::Lsa;

// Expiration timepoint used by all static vectors.
fn expiry() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(1_600_000_000_000).unwrap()
}

//
// Helper functions.
//

fn test_encode_lsa(bytes_expected: &[u8], lsa: &Lsa) {
    let bytes_actual = lsa.to_bytes();
    assert_eq!(bytes_expected, bytes_actual.as_ref());
}

fn test_decode_lsa(bytes: &[u8], lsa_expected: &Lsa) {
    let mut buf = Bytes::copy_from_slice(bytes);
    let lsa_actual = Lsa::decode(&mut buf).unwrap();
    assert!(buf.is_empty());
    assert_eq!(*lsa_expected, lsa_actual);
}
