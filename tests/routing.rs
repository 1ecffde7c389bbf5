//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use chrono::{Duration, Utc};
use common::new_router;
use midst::adjacency::AdjacencyStatus;
use midst::config::HyperbolicState;
use midst::name::Name;
use midst::packet::lsa::{
    AdjacencyEntry, AdjacencyLsa, CoordinateLsa, Lsa, LsaBody, LsaHdr,
    NameLsa,
};
use midst::southbound::ForwarderCmd;
use midst::spf::hyperbolic_distance;
use midst::tasks::messages::input::{
    FibRefreshMsg, ProtocolMsg, RoutingCalcMsg,
};
use midst::{lsdb, spf};

fn hdr(origin: &str, seq_no: u64) -> LsaHdr {
    LsaHdr::new(
        Name::from(origin),
        seq_no,
        Utc::now() + Duration::seconds(1800),
    )
}

fn adj_lsa(origin: &str, seq_no: u64, neighbors: &[(&str, f64)]) -> Lsa {
    let adjacencies = neighbors
        .iter()
        .map(|(name, cost)| {
            AdjacencyEntry::new(
                Name::from(*name),
                format!("udp4://{}", &name[1..]),
                *cost,
            )
        })
        .collect();
    Lsa::new(
        hdr(origin, seq_no),
        LsaBody::Adjacency(AdjacencyLsa::new(adjacencies)),
    )
}

fn name_lsa(origin: &str, seq_no: u64, names: &[&str]) -> Lsa {
    Lsa::new(
        hdr(origin, seq_no),
        LsaBody::Name(NameLsa::new(
            names.iter().map(|name| Name::from(*name)).collect(),
        )),
    )
}

fn cor_lsa(origin: &str, seq_no: u64, radius: f64, angle: f64) -> Lsa {
    Lsa::new(
        hdr(origin, seq_no),
        LsaBody::Coordinate(CoordinateLsa::new(radius, vec![angle])),
    )
}

fn activate(router: &mut common::TestRouter, neighbor: &str) {
    let adjacency = router
        .instance
        .state
        .adjacencies
        .get_mut(&Name::from(neighbor))
        .unwrap();
    adjacency.status = AdjacencyStatus::Active;
    adjacency.hello_timeouts = 0;
}

// Two adjacent routers with link cost 10: each ends up with the other's
// prefix behind the connecting face at cost 10.
#[tokio::test]
async fn test_two_router_convergence() {
    let mut router = new_router("/a", &[("/b", "udp4://b", 10.0)], |_| ());
    activate(&mut router, "/b");

    lsdb::build_and_install_own_adj_lsa(&mut router.instance);
    lsdb::install(&mut router.instance, adj_lsa("/b", 1, &[("/a", 10.0)]));
    lsdb::install(&mut router.instance, name_lsa("/b", 1, &["/b/app"]));
    router
        .instance
        .process_message(ProtocolMsg::RoutingCalc(RoutingCalcMsg {}));

    let nexthops = &router.instance.state.routing_table.entries
        [&Name::from("/b")];
    assert_eq!(nexthops.len(), 1);
    let best = nexthops.best().unwrap();
    assert_eq!(best.face_uri, "udp4://b");
    assert_eq!(best.cost, 10.0);

    let entry = router.instance.state.fib.get(&Name::from("/b/app")).unwrap();
    assert_eq!(entry.nexthops.best().unwrap().cost, 10.0);
    assert!(router.drain_sb().iter().any(|cmd| matches!(cmd,
        ForwarderCmd::RibInstall { prefix, face_uri, cost }
            if *prefix == Name::from("/b/app")
                && face_uri == "udp4://b"
                && *cost == 10.0)));
}

// A single adjacency with link cost 0 yields exactly one direct path.
#[tokio::test]
async fn test_zero_cost_direct_path() {
    let mut router = new_router("/a", &[("/b", "udp4://b", 0.0)], |_| ());
    activate(&mut router, "/b");

    lsdb::build_and_install_own_adj_lsa(&mut router.instance);
    spf::compute(&mut router.instance);

    let nexthops = &router.instance.state.routing_table.entries
        [&Name::from("/b")];
    assert_eq!(nexthops.len(), 1);
    assert_eq!(nexthops.best().unwrap().cost, 0.0);
}

// Multipath tie-breaking keeps every path within the configured cost
// tolerance, bounded by the face limit.
#[tokio::test]
async fn test_multipath_tolerance() {
    let topology = |tolerance: f64, max_faces: usize| {
        let mut router = new_router(
            "/a",
            &[("/b", "udp4://b", 10.0), ("/c", "udp4://c", 12.0)],
            |config| {
                config.max_faces_tolerance = tolerance;
                config.max_faces_per_prefix = max_faces;
            },
        );
        activate(&mut router, "/b");
        activate(&mut router, "/c");
        lsdb::build_and_install_own_adj_lsa(&mut router.instance);
        lsdb::install(&mut router.instance, adj_lsa("/b", 1, &[("/d", 10.0)]));
        lsdb::install(&mut router.instance, adj_lsa("/c", 1, &[("/d", 10.0)]));
        spf::compute(&mut router.instance);
        router
    };

    // Tolerance 0.1: 22 <= 20 * 1.1, both paths to /d survive.
    let router = topology(0.1, 0);
    let nexthops = &router.instance.state.routing_table.entries
        [&Name::from("/d")];
    assert_eq!(nexthops.len(), 2);
    assert_eq!(nexthops.best().unwrap().cost, 20.0);

    // No tolerance: only the shortest path.
    let router = topology(0.0, 0);
    let nexthops = &router.instance.state.routing_table.entries
        [&Name::from("/d")];
    assert_eq!(nexthops.len(), 1);
    assert_eq!(nexthops.best().unwrap().face_uri, "udp4://b");

    // The face limit bounds the list even within tolerance.
    let router = topology(0.1, 1);
    let nexthops = &router.instance.state.routing_table.entries
        [&Name::from("/d")];
    assert_eq!(nexthops.len(), 1);
}

// Hyperbolic mode ranks direct neighbors by hyperbolic distance to the
// destination's coordinates.
#[tokio::test]
async fn test_hyperbolic_routing() {
    let mut router = new_router(
        "/a",
        &[("/b", "udp4://b", 5.0), ("/c", "udp4://c", 5.0)],
        |config| {
            config.hyperbolic_state = HyperbolicState::On;
            config.max_faces_per_prefix = 1;
        },
    );
    activate(&mut router, "/b");
    activate(&mut router, "/c");

    lsdb::install(&mut router.instance, cor_lsa("/b", 1, 1.0, 0.0));
    lsdb::install(
        &mut router.instance,
        cor_lsa("/c", 1, 1.0, std::f64::consts::PI),
    );
    lsdb::install(&mut router.instance, cor_lsa("/d", 1, 1.0, 0.1));
    lsdb::install(&mut router.instance, name_lsa("/d", 1, &["/d/app"]));
    spf::compute(&mut router.instance);

    // /b sits almost on top of /d, /c is on the far side.
    let nexthops = &router.instance.state.routing_table.entries
        [&Name::from("/d")];
    assert_eq!(nexthops.len(), 1);
    assert_eq!(nexthops.best().unwrap().face_uri, "udp4://b");

    let entry = router.instance.state.fib.get(&Name::from("/d/app")).unwrap();
    assert_eq!(entry.nexthops.best().unwrap().face_uri, "udp4://b");
}

// Dry-run mode computes the hyperbolic table but installs link-state.
#[tokio::test]
async fn test_hyperbolic_dry_run() {
    let mut router = new_router("/a", &[("/b", "udp4://b", 7.0)], |config| {
        config.hyperbolic_state = HyperbolicState::DryRun;
    });
    activate(&mut router, "/b");

    lsdb::install(&mut router.instance, cor_lsa("/b", 1, 1.0, 0.0));
    lsdb::build_and_install_own_adj_lsa(&mut router.instance);
    spf::compute(&mut router.instance);

    // Link-state cost, not hyperbolic distance.
    let nexthops = &router.instance.state.routing_table.entries
        [&Name::from("/b")];
    assert_eq!(nexthops.best().unwrap().cost, 7.0);
}

#[test]
fn test_hyperbolic_distance() {
    let origin = CoordinateLsa::new(1.0, vec![0.0]);
    let same = CoordinateLsa::new(1.0, vec![0.0]);
    let far = CoordinateLsa::new(2.0, vec![std::f64::consts::PI]);
    let near = CoordinateLsa::new(1.5, vec![0.2]);

    assert!(hyperbolic_distance(&origin, &same).unwrap() < 1e-6);
    let d_far = hyperbolic_distance(&origin, &far).unwrap();
    let d_near = hyperbolic_distance(&origin, &near).unwrap();
    assert!(d_far > d_near);
    // Symmetric.
    assert_eq!(hyperbolic_distance(&far, &origin), Some(d_far));
    // Missing angles are unusable.
    assert_eq!(
        hyperbolic_distance(&origin, &CoordinateLsa::new(1.0, vec![])),
        None
    );
}

// Withdrawn prefixes are removed from the forwarder on the next
// projection.
#[tokio::test]
async fn test_fib_withdraw() {
    let mut router = new_router("/a", &[("/b", "udp4://b", 10.0)], |_| ());
    activate(&mut router, "/b");

    lsdb::build_and_install_own_adj_lsa(&mut router.instance);
    lsdb::install(&mut router.instance, name_lsa("/b", 1, &["/b/app"]));
    router
        .instance
        .process_message(ProtocolMsg::RoutingCalc(RoutingCalcMsg {}));
    assert!(router.instance.state.fib.get(&Name::from("/b/app")).is_some());
    router.drain_sb();

    // The next version of the NameLSA no longer advertises the prefix.
    lsdb::install(&mut router.instance, name_lsa("/b", 2, &[]));
    assert!(router.instance.state.fib.get(&Name::from("/b/app")).is_none());
    assert!(router.drain_sb().iter().any(|cmd| matches!(cmd,
        ForwarderCmd::RibRemove { prefix, .. }
            if *prefix == Name::from("/b/app"))));
}

// A refresh re-registers the installed next hops.
#[tokio::test]
async fn test_fib_refresh() {
    let mut router = new_router("/a", &[("/b", "udp4://b", 10.0)], |_| ());
    activate(&mut router, "/b");

    lsdb::build_and_install_own_adj_lsa(&mut router.instance);
    lsdb::install(&mut router.instance, name_lsa("/b", 1, &["/b/app"]));
    router
        .instance
        .process_message(ProtocolMsg::RoutingCalc(RoutingCalcMsg {}));
    router.drain_sb();

    router
        .instance
        .process_message(ProtocolMsg::FibRefresh(FibRefreshMsg {
            prefix: Name::from("/b/app"),
        }));
    assert!(router.drain_sb().iter().any(|cmd| matches!(cmd,
        ForwarderCmd::RibInstall { prefix, .. }
            if *prefix == Name::from("/b/app"))));
}

// A prefix advertised by multiple routers merges their next hops, ordered
// by cost.
#[tokio::test]
async fn test_prefix_multi_advertiser() {
    let mut router = new_router(
        "/a",
        &[("/b", "udp4://b", 10.0), ("/c", "udp4://c", 20.0)],
        |_| (),
    );
    activate(&mut router, "/b");
    activate(&mut router, "/c");

    lsdb::build_and_install_own_adj_lsa(&mut router.instance);
    lsdb::install(&mut router.instance, name_lsa("/b", 1, &["/svc"]));
    lsdb::install(&mut router.instance, name_lsa("/c", 1, &["/svc"]));
    router
        .instance
        .process_message(ProtocolMsg::RoutingCalc(RoutingCalcMsg {}));

    let entry = router.instance.state.fib.get(&Name::from("/svc")).unwrap();
    assert_eq!(entry.nexthops.len(), 2);
    assert_eq!(entry.nexthops.best().unwrap().face_uri, "udp4://b");
}
