//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::name::Name;

// Hyperbolic routing mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum HyperbolicState {
    Off,
    DryRun,
    On,
}

// MIDST distance-vector mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum MidstState {
    Off,
    On,
}

// Signing material for self-originated packets. Key distribution and
// certificate handling live outside the core.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct SigningInfo {
    pub signer: Name,
    pub key: Bytes,
}

// Static neighbor definition.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NeighborCfg {
    pub name: Name,
    pub face_uri: String,
    pub link_cost: f64,
}

// Instance configuration record. Produced by an external configuration
// parser; the core only consumes it.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub struct Config {
    pub router_prefix: Name,
    pub site_name: Name,
    pub lsa_prefix: Name,
    pub lsa_refresh_interval: Duration,
    pub first_hello_interval: Duration,
    pub hello_interval: Duration,
    pub hello_retry_count: u32,
    pub interest_resend_time: Duration,
    pub routing_calc_interval: Duration,
    pub adj_lsa_build_interval: Duration,
    pub dv_round_interval: Duration,
    pub hyperbolic_state: HyperbolicState,
    pub hyperbolic_radius: f64,
    pub hyperbolic_angles: Vec<f64>,
    pub midst_state: MidstState,
    pub signing: SigningInfo,
    pub seq_file_dir: PathBuf,
    pub max_faces_per_prefix: usize,
    pub max_faces_tolerance: f64,
    pub neighbors: Vec<NeighborCfg>,
    pub advertised_prefixes: Vec<Name>,
}

// ===== impl HyperbolicState =====

impl fmt::Display for HyperbolicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperbolicState::Off => write!(f, "off"),
            HyperbolicState::DryRun => write!(f, "dry-run"),
            HyperbolicState::On => write!(f, "on"),
        }
    }
}

// ===== impl MidstState =====

impl fmt::Display for MidstState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidstState::Off => write!(f, "off"),
            MidstState::On => write!(f, "on"),
        }
    }
}

// ===== impl Config =====

impl Config {
    pub fn new(router_prefix: Name, signing: SigningInfo) -> Config {
        Config {
            router_prefix,
            site_name: Name::new(),
            lsa_prefix: Name::from("/ndn/nlsr/LSA"),
            lsa_refresh_interval: Duration::from_secs(1800),
            first_hello_interval: Duration::from_secs(10),
            hello_interval: Duration::from_secs(60),
            hello_retry_count: 3,
            interest_resend_time: Duration::from_secs(5),
            routing_calc_interval: Duration::from_secs(15),
            adj_lsa_build_interval: Duration::from_secs(5),
            dv_round_interval: Duration::from_secs(30),
            hyperbolic_state: HyperbolicState::Off,
            hyperbolic_radius: 0.0,
            hyperbolic_angles: vec![],
            midst_state: MidstState::Off,
            signing,
            seq_file_dir: PathBuf::from("/var/lib/nlsr"),
            max_faces_per_prefix: 0,
            max_faces_tolerance: 0.0,
            neighbors: vec![],
            advertised_prefixes: vec![],
        }
    }
}
