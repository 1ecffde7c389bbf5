//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use crate::config::HyperbolicState;
use crate::debug::Debug;
use crate::instance::Instance;
use crate::name::Name;
use crate::packet::lsa::{CoordinateLsa, LsaType};
use crate::route::{self, Nexthop, NexthopList, RoutingTable};
use crate::tasks;

// ===== global functions =====

// Schedules a debounced routing recomputation. Coalesces: a pending run is
// replaced, never duplicated.
pub(crate) fn schedule(instance: &mut Instance) {
    Debug::RoutingCalcScheduled.log();
    match &mut instance.state.routing_calc_timer {
        Some(timer) => timer.reset(None),
        None => {
            instance.state.routing_calc_timer =
                Some(tasks::routing_calc_timer(
                    instance.config.routing_calc_interval,
                    &instance.tx.protocol_input,
                ));
        }
    }
}

pub(crate) fn process_routing_calc(instance: &mut Instance) {
    instance.state.routing_calc_timer = None;
    compute(instance);
}

// Computes the routing table from the current LSDB snapshot and projects
// the result into the FIB.
pub fn compute(instance: &mut Instance) {
    let mode = instance.config.hyperbolic_state;
    Debug::RoutingCalcStart(mode).log();

    let table = match mode {
        HyperbolicState::Off => compute_link_state(instance),
        HyperbolicState::On => compute_hyperbolic(instance),
        HyperbolicState::DryRun => {
            // Compute both, install link-state.
            let dry_run = compute_hyperbolic(instance);
            Debug::RoutingCalcDryRun(dry_run.entries.len()).log();
            compute_link_state(instance)
        }
    };

    Debug::RoutingCalcDone(table.entries.len()).log();
    instance.state.routing_table = table;
    route::project(instance);
}

// ===== helper functions =====

// Link-state mode: shortest paths over the directed graph derived from the
// adjacency LSAs. One Dijkstra run per active first hop yields the
// candidate costs; the tolerance rule then keeps every near-shortest path
// up to the face limit.
fn compute_link_state(instance: &Instance) -> RoutingTable {
    let own = &instance.config.router_prefix;

    let mut graph: BTreeMap<Name, Vec<(Name, f64)>> = BTreeMap::new();
    for entry in instance.state.lsdb.iter_type(LsaType::Adjacency) {
        if let Some(adj_lsa) = entry.data.body.as_adjacency() {
            graph
                .entry(entry.data.hdr.origin.clone())
                .or_default()
                .extend(
                    adj_lsa
                        .adjacencies
                        .iter()
                        .map(|adjacency| {
                            (adjacency.neighbor.clone(), adjacency.cost)
                        }),
                );
        }
    }

    let mut table = RoutingTable::default();
    for adjacency in instance
        .state
        .adjacencies
        .iter()
        .filter(|adjacency| adjacency.is_active())
    {
        for (dest, cost) in dijkstra(&graph, &adjacency.name, own) {
            if dest == *own {
                continue;
            }
            table.entries.entry(dest).or_default().add(Nexthop::new(
                adjacency.face_uri.clone(),
                adjacency.link_cost + cost,
            ));
        }
    }

    for list in table.entries.values_mut() {
        list.prune(
            instance.config.max_faces_per_prefix,
            instance.config.max_faces_tolerance,
        );
    }
    table.entries.retain(|_, list| !list.is_empty());
    table
}

// Single-source shortest paths starting at `source`, never transiting
// `exclude`. Small graphs, so the selection step stays linear.
fn dijkstra(
    graph: &BTreeMap<Name, Vec<(Name, f64)>>,
    source: &Name,
    exclude: &Name,
) -> BTreeMap<Name, f64> {
    let mut dist: BTreeMap<Name, f64> = BTreeMap::new();
    let mut visited = BTreeSet::new();
    dist.insert(source.clone(), 0.0);

    loop {
        let Some((node, node_dist)) = dist
            .iter()
            .filter(|(name, _)| !visited.contains(*name))
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, cost)| (name.clone(), *cost))
        else {
            break;
        };
        visited.insert(node.clone());

        for (neighbor, cost) in graph.get(&node).into_iter().flatten() {
            if neighbor == exclude || visited.contains(neighbor) {
                continue;
            }
            let candidate = node_dist + cost;
            let improved = dist
                .get(neighbor)
                .is_none_or(|current| candidate < *current);
            if improved {
                dist.insert(neighbor.clone(), candidate);
            }
        }
    }

    dist
}

// Hyperbolic mode: rank the direct neighbors of this router by hyperbolic
// distance to each destination's coordinates and take the top K.
fn compute_hyperbolic(instance: &Instance) -> RoutingTable {
    let own = &instance.config.router_prefix;

    let mut coordinates = BTreeMap::new();
    for entry in instance.state.lsdb.iter_type(LsaType::Coordinate) {
        if let Some(cor_lsa) = entry.data.body.as_coordinate() {
            coordinates.insert(entry.data.hdr.origin.clone(), cor_lsa);
        }
    }

    let mut table = RoutingTable::default();
    for (dest, dest_coordinates) in &coordinates {
        if dest == own {
            continue;
        }
        let mut list = NexthopList::default();
        for adjacency in instance
            .state
            .adjacencies
            .iter()
            .filter(|adjacency| adjacency.is_active())
        {
            let Some(neighbor_coordinates) = coordinates.get(&adjacency.name)
            else {
                continue;
            };
            let Some(distance) =
                hyperbolic_distance(neighbor_coordinates, dest_coordinates)
            else {
                continue;
            };
            list.add(Nexthop::new(adjacency.face_uri.clone(), distance));
        }
        list.cap(instance.config.max_faces_per_prefix);
        if !list.is_empty() {
            table.entries.insert(dest.clone(), list);
        }
    }
    table
}

// Distance between two points of the hyperbolic plane, from their radial
// and (first) angular coordinates. `None` when either coordinate set is
// unusable.
pub fn hyperbolic_distance(
    a: &CoordinateLsa,
    b: &CoordinateLsa,
) -> Option<f64> {
    let theta_a = *a.angles.first()?;
    let theta_b = *b.angles.first()?;
    if a.radius < 0.0 || b.radius < 0.0 {
        return None;
    }

    let delta = (theta_a - theta_b).abs() % (2.0 * std::f64::consts::PI);
    let delta = delta.min(2.0 * std::f64::consts::PI - delta);

    let arg = a.radius.cosh() * b.radius.cosh()
        - a.radius.sinh() * b.radius.sinh() * delta.cos();
    if arg < 1.0 {
        // Numerically coincident points.
        return Some(0.0);
    }
    Some(arg.acosh())
}
