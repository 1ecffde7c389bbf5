//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::debug::Debug;
use crate::name::Name;

// A configured neighbor and its liveness state.
#[derive(Debug)]
pub struct Adjacency {
    pub name: Name,
    pub face_uri: String,
    pub link_cost: f64,
    // Forwarder face identifier, 0 while unknown.
    pub face_id: u64,
    pub status: AdjacencyStatus,
    pub hello_timeouts: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum AdjacencyStatus {
    Active,
    Inactive,
}

// Neighbor table, ordered by router name. Created from configuration at
// startup; mutated by the hello protocol and the face event stream.
#[derive(Debug, Default)]
pub struct AdjacencyTable {
    entries: BTreeMap<Name, Adjacency>,
}

// ===== impl Adjacency =====

impl Adjacency {
    // Transitions the liveness status if different from the current one.
    pub fn set_status(&mut self, status: AdjacencyStatus) {
        if self.status == status {
            return;
        }
        Debug::AdjacencyStatusChange(&self.name, status).log();
        self.status = status;
    }

    pub fn is_active(&self) -> bool {
        self.status == AdjacencyStatus::Active
    }
}

// ===== impl AdjacencyStatus =====

impl fmt::Display for AdjacencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjacencyStatus::Active => write!(f, "active"),
            AdjacencyStatus::Inactive => write!(f, "inactive"),
        }
    }
}

// ===== impl AdjacencyTable =====

impl AdjacencyTable {
    // Every neighbor starts out inactive with the timeout counter already
    // at the retry threshold.
    pub fn from_config(config: &Config) -> AdjacencyTable {
        let entries = config
            .neighbors
            .iter()
            .map(|neighbor| {
                let adjacency = Adjacency {
                    name: neighbor.name.clone(),
                    face_uri: neighbor.face_uri.clone(),
                    link_cost: neighbor.link_cost,
                    face_id: 0,
                    status: AdjacencyStatus::Inactive,
                    hello_timeouts: config.hello_retry_count,
                };
                (neighbor.name.clone(), adjacency)
            })
            .collect();
        AdjacencyTable { entries }
    }

    pub fn get(&self, name: &Name) -> Option<&Adjacency> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &Name) -> Option<&mut Adjacency> {
        self.entries.get_mut(name)
    }

    pub fn is_neighbor(&self, name: &Name) -> bool {
        self.entries.contains_key(name)
    }

    pub fn find_by_face_id_mut(
        &mut self,
        face_id: u64,
    ) -> Option<&mut Adjacency> {
        self.entries
            .values_mut()
            .find(|adjacency| adjacency.face_id == face_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Adjacency> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Adjacency> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
