//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use crate::debug::Debug;
use crate::instance::{Instance, InstanceState};
use crate::name::Name;
use crate::route::NexthopList;
use crate::southbound;
use crate::tasks;
use crate::tasks::TimeoutTask;

// Shadow of one installed prefix: the next hops the forwarder currently
// holds, plus the periodic re-registration timer.
#[derive(Debug)]
pub struct FibEntry {
    pub nexthops: NexthopList,
    pub refresh_timer: Option<TimeoutTask>,
}

// Shadow of the forwarder state. Diffed against the name-prefix table on
// every recomputation so only actual changes reach the management RPC.
#[derive(Debug, Default)]
pub struct Fib {
    entries: BTreeMap<Name, FibEntry>,
}

// ===== impl Fib =====

impl Fib {
    pub fn get(&self, prefix: &Name) -> Option<&FibEntry> {
        self.entries.get(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &FibEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ===== global functions =====

// Synchronizes the shadow with the freshly projected name-prefix table,
// issuing install/update/remove commands for the differences only.
pub(crate) fn sync(instance: &mut Instance) {
    let proto_tx = instance.tx.protocol_input.clone();
    let sb_tx = instance.tx.southbound.clone();
    let refresh_interval = instance.config.lsa_refresh_interval * 2;

    let InstanceState {
        fib, prefix_table, ..
    } = &mut instance.state;

    // Entries whose prefix vanished from the target.
    let stale = fib
        .entries
        .keys()
        .filter(|prefix| !prefix_table.contains_key(*prefix))
        .cloned()
        .collect::<Vec<_>>();
    for prefix in stale {
        if let Some(entry) = fib.entries.remove(&prefix) {
            for nexthop in entry.nexthops.iter() {
                Debug::FibRemove(&prefix, &nexthop.face_uri).log();
                southbound::tx::rib_remove(&sb_tx, &prefix, &nexthop.face_uri);
            }
        }
    }

    for (prefix, target) in prefix_table.iter() {
        // Freshly reachable prefix: install every next hop.
        if !fib.entries.contains_key(prefix) {
            for nexthop in target.iter() {
                Debug::FibAdd(prefix, &nexthop.face_uri, nexthop.cost).log();
                southbound::tx::rib_install(
                    &sb_tx,
                    prefix,
                    &nexthop.face_uri,
                    nexthop.cost,
                );
            }
            let refresh_timer = tasks::fib_refresh_timer(
                prefix.clone(),
                refresh_interval,
                &proto_tx,
            );
            fib.entries.insert(
                prefix.clone(),
                FibEntry {
                    nexthops: target.clone(),
                    refresh_timer: Some(refresh_timer),
                },
            );
            continue;
        }

        // Known prefix: diff the next-hop sets.
        let Some(entry) = fib.entries.get_mut(prefix) else {
            continue;
        };
        for nexthop in target.iter() {
            match entry
                .nexthops
                .iter()
                .find(|old| old.face_uri == nexthop.face_uri)
            {
                None => {
                    Debug::FibAdd(prefix, &nexthop.face_uri, nexthop.cost)
                        .log();
                    southbound::tx::rib_install(
                        &sb_tx,
                        prefix,
                        &nexthop.face_uri,
                        nexthop.cost,
                    );
                }
                Some(old) if old.cost != nexthop.cost => {
                    Debug::FibUpdate(prefix, &nexthop.face_uri, nexthop.cost)
                        .log();
                    southbound::tx::rib_update(
                        &sb_tx,
                        prefix,
                        &nexthop.face_uri,
                        nexthop.cost,
                    );
                }
                Some(_) => (),
            }
        }
        for old in entry.nexthops.iter().filter(|old| {
            !target
                .iter()
                .any(|nexthop| nexthop.face_uri == old.face_uri)
        }) {
            Debug::FibRemove(prefix, &old.face_uri).log();
            southbound::tx::rib_remove(&sb_tx, prefix, &old.face_uri);
        }
        entry.nexthops = target.clone();
    }
}

// Entry refresh fired: re-register every next hop to survive forwarder
// restarts, then re-arm the timer.
pub(crate) fn process_refresh(instance: &mut Instance, prefix: Name) {
    let proto_tx = instance.tx.protocol_input.clone();
    let sb_tx = instance.tx.southbound.clone();
    let refresh_interval = instance.config.lsa_refresh_interval * 2;

    let Some(entry) = instance.state.fib.entries.get_mut(&prefix) else {
        return;
    };
    Debug::FibRefresh(&prefix).log();
    for nexthop in entry.nexthops.iter() {
        southbound::tx::rib_install(
            &sb_tx,
            &prefix,
            &nexthop.face_uri,
            nexthop.cost,
        );
    }
    entry.refresh_timer = Some(tasks::fib_refresh_timer(
        prefix.clone(),
        refresh_interval,
        &proto_tx,
    ));
}

// Removes everything the shadow holds. Used at shutdown.
pub(crate) fn clear(instance: &mut Instance) {
    let sb_tx = instance.tx.southbound.clone();
    for (prefix, entry) in std::mem::take(&mut instance.state.fib.entries) {
        for nexthop in entry.nexthops.iter() {
            Debug::FibRemove(&prefix, &nexthop.face_uri).log();
            southbound::tx::rib_remove(&sb_tx, &prefix, &nexthop.face_uri);
        }
    }
}
