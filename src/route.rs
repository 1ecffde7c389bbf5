//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::fib;
use crate::instance::Instance;
use crate::name::Name;
use crate::packet::lsa::{LsaKey, LsaType};

// A single next hop towards a destination.
#[derive(Clone, Debug, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Nexthop {
    pub face_uri: String,
    pub cost: f64,
}

// Next hops towards one destination, ordered by ascending cost.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NexthopList {
    hops: Vec<Nexthop>,
}

// Routing table produced by the last computation: destination router to
// next-hop list, cost non-decreasing within each list.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    pub entries: BTreeMap<Name, NexthopList>,
}

// ===== impl NexthopList =====

impl NexthopList {
    // Upsert by face, keeping the lower cost.
    pub fn add(&mut self, nexthop: Nexthop) {
        match self
            .hops
            .iter()
            .position(|hop| hop.face_uri == nexthop.face_uri)
        {
            Some(index) => {
                if nexthop.cost < self.hops[index].cost {
                    self.hops[index].cost = nexthop.cost;
                }
            }
            None => self.hops.push(nexthop),
        }
    }

    // Sorts by ascending cost and truncates to the face limit (0 means
    // unbounded).
    pub fn cap(&mut self, max_faces: usize) {
        self.hops.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        if max_faces != 0 && self.hops.len() > max_faces {
            self.hops.truncate(max_faces);
        }
    }

    // Multipath tie-breaking: keep every hop whose total cost stays within
    // `best * (1 + tolerance)`, then apply the face limit.
    pub fn prune(&mut self, max_faces: usize, tolerance: f64) {
        self.hops.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        if let Some(best) = self.hops.first().map(|hop| hop.cost) {
            let limit = best * (1.0 + tolerance);
            self.hops.retain(|hop| hop.cost <= limit);
        }
        if max_faces != 0 && self.hops.len() > max_faces {
            self.hops.truncate(max_faces);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Nexthop> {
        self.hops.iter()
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn best(&self) -> Option<&Nexthop> {
        self.hops.first()
    }
}

// ===== global functions =====

// Projects the routing table into the name-prefix table and synchronizes
// the FIB shadow with it.
//
// A destination router contributes every prefix it advertises through its
// NameLSA plus every MIDST prefix anchored at it, regardless of which
// neighbor relayed the record.
pub(crate) fn project(instance: &mut Instance) {
    let mut target = BTreeMap::new();

    for (dest, nexthops) in &instance.state.routing_table.entries {
        if nexthops.is_empty() {
            continue;
        }

        let mut prefixes = BTreeSet::new();
        let key = LsaKey::new(dest.clone(), LsaType::Name);
        if let Some(entry) = instance.state.lsdb.get(&key)
            .and_then(|entry| entry.data.body.as_name())
        {
            prefixes.extend(entry.name_list.iter().cloned());
        }
        for entry in instance.state.lsdb.iter_type(LsaType::Midst) {
            if let Some(midst_lsa) = entry.data.body.as_midst() {
                prefixes.extend(
                    midst_lsa
                        .prefixes
                        .iter()
                        .filter(|prefix| prefix.anchor == *dest)
                        .map(|prefix| prefix.name.clone()),
                );
            }
        }

        for prefix in prefixes {
            let list: &mut NexthopList = target.entry(prefix).or_default();
            for nexthop in nexthops.iter() {
                list.add(nexthop.clone());
            }
        }
    }

    // Merged lists are re-sorted by cost and capped by the face limit.
    for list in target.values_mut() {
        list.cap(instance.config.max_faces_per_prefix);
    }
    target.retain(|_, list| !list.is_empty());

    instance.state.prefix_table = target;
    fib::sync(instance);
}
