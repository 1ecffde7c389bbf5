//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::SigningInfo;
use crate::name::Name;

// Freshness period stamped on every self-originated Data packet.
pub const DATA_FRESHNESS: Duration = Duration::from_secs(10);

// An Interest packet. Transport framing is the face's concern; the core
// exchanges parsed packets with the face over channels.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Interest {
    pub name: Name,
    pub lifetime: Duration,
    pub must_be_fresh: bool,
    pub can_be_prefix: bool,
}

// A signed Data packet.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Data {
    pub name: Name,
    pub freshness: Duration,
    pub content: Bytes,
    pub signer: Name,
    pub signature: Bytes,
}

// ===== impl Interest =====

impl Interest {
    pub fn new(name: Name, lifetime: Duration) -> Interest {
        Interest {
            name,
            lifetime,
            must_be_fresh: true,
            can_be_prefix: true,
        }
    }
}

// ===== impl Data =====

impl Data {
    // Builds a Data packet signed with the configured key. The signature
    // covers the wire-encoded name followed by the content.
    pub fn sign(
        name: Name,
        content: impl Into<Bytes>,
        signing: &SigningInfo,
    ) -> Data {
        let content = content.into();
        let signature = compute_signature(&name, &content, &signing.key);
        Data {
            name,
            freshness: DATA_FRESHNESS,
            content,
            signer: signing.signer.clone(),
            signature,
        }
    }

    // Verifies the packet signature against the given key.
    pub fn verify(&self, key: &[u8]) -> bool {
        compute_signature(&self.name, &self.content, key) == self.signature
    }
}

// ===== helper functions =====

fn compute_signature(name: &Name, content: &Bytes, key: &[u8]) -> Bytes {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .expect("HMAC accepts keys of any size");
    mac.update(&name.to_bytes());
    mac.update(content);
    Bytes::copy_from_slice(&mac.finalize().into_bytes())
}
