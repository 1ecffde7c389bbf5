//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

use crate::adjacency::AdjacencyStatus;
use crate::config::HyperbolicState;
use crate::name::Name;
use crate::packet::lsa::{Lsa, LsaKey};

// Debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Instance
    InstanceStart,
    InstanceStop,
    // Adjacencies
    AdjacencyStatusChange(&'a Name, AdjacencyStatus),
    // Hello protocol
    HelloTx(&'a Name),
    HelloRx(&'a Name),
    HelloTimeout(&'a Name, u32),
    // LSDB maintenance
    LsaInstall(&'a Lsa),
    LsaUpdate(&'a Lsa),
    LsaDiscard(&'a LsaKey, u64),
    LsaExpire(&'a LsaKey),
    LsaOriginate(&'a Lsa),
    LsaRequestTx(&'a Name),
    LsaDataTx(&'a Name),
    // Distance-vector exchange
    DvInterestTx(&'a Name, u64),
    DvInterestRx(&'a Name, u64),
    DvUpdateTable(&'a Name, u64),
    DvDataTx(&'a Name),
    DvTimeout(&'a Name),
    // Routing computation
    RoutingCalcScheduled,
    RoutingCalcStart(HyperbolicState),
    RoutingCalcDone(usize),
    RoutingCalcDryRun(usize),
    // FIB projection
    FibAdd(&'a Name, &'a str, f64),
    FibUpdate(&'a Name, &'a str, f64),
    FibRemove(&'a Name, &'a str),
    FibRefresh(&'a Name),
    // Sequencing manager
    SeqNoRestore(u64, u64, u64, u64),
    // Network
    PacketDrop(&'a Name),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceStart | Debug::InstanceStop => {
                debug!("{}", self);
            }
            Debug::AdjacencyStatusChange(name, status) => {
                debug_span!("adjacency", neighbor = %name).in_scope(|| {
                    debug!(%status, "{}", self);
                })
            }
            Debug::HelloTx(name) | Debug::HelloRx(name) => {
                debug_span!("hello").in_scope(|| {
                    debug!(neighbor = %name, "{}", self);
                })
            }
            Debug::HelloTimeout(name, timeouts) => {
                debug_span!("hello").in_scope(|| {
                    debug!(neighbor = %name, %timeouts, "{}", self);
                })
            }
            Debug::LsaInstall(lsa)
            | Debug::LsaUpdate(lsa)
            | Debug::LsaOriginate(lsa) => {
                debug!(origin = %lsa.hdr.origin, lsa_type = %lsa.lsa_type(),
                    seq_no = %lsa.hdr.seq_no, "{}", self);
            }
            Debug::LsaDiscard(key, seq_no) => {
                debug!(origin = %key.origin, lsa_type = %key.lsa_type,
                    %seq_no, "{}", self);
            }
            Debug::LsaExpire(key) => {
                debug!(origin = %key.origin, lsa_type = %key.lsa_type,
                    "{}", self);
            }
            Debug::LsaRequestTx(name) | Debug::LsaDataTx(name) => {
                debug!(name = %name, "{}", self);
            }
            Debug::DvInterestTx(name, seq_no)
            | Debug::DvInterestRx(name, seq_no)
            | Debug::DvUpdateTable(name, seq_no) => {
                debug_span!("dv").in_scope(|| {
                    debug!(neighbor = %name, %seq_no, "{}", self);
                })
            }
            Debug::DvDataTx(name) | Debug::DvTimeout(name) => {
                debug_span!("dv").in_scope(|| {
                    debug!(name = %name, "{}", self);
                })
            }
            Debug::RoutingCalcScheduled => {
                debug!("{}", self);
            }
            Debug::RoutingCalcStart(mode) => {
                debug!(hyperbolic = %mode, "{}", self);
            }
            Debug::RoutingCalcDone(destinations)
            | Debug::RoutingCalcDryRun(destinations) => {
                debug!(%destinations, "{}", self);
            }
            Debug::FibAdd(prefix, face_uri, cost)
            | Debug::FibUpdate(prefix, face_uri, cost) => {
                debug_span!("fib").in_scope(|| {
                    debug!(prefix = %prefix, %face_uri, %cost, "{}", self);
                })
            }
            Debug::FibRemove(prefix, face_uri) => {
                debug_span!("fib").in_scope(|| {
                    debug!(prefix = %prefix, %face_uri, "{}", self);
                })
            }
            Debug::FibRefresh(prefix) => {
                debug_span!("fib").in_scope(|| {
                    debug!(prefix = %prefix, "{}", self);
                })
            }
            Debug::SeqNoRestore(name_seq, adj_seq, cor_seq, midst_seq) => {
                debug!(%name_seq, %adj_seq, %cor_seq, %midst_seq, "{}", self);
            }
            Debug::PacketDrop(name) => {
                debug!(name = %name, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceStart => {
                write!(f, "instance starting")
            }
            Debug::InstanceStop => {
                write!(f, "instance stopping")
            }
            Debug::AdjacencyStatusChange(..) => {
                write!(f, "adjacency status change")
            }
            Debug::HelloTx(..) => {
                write!(f, "hello interest sent")
            }
            Debug::HelloRx(..) => {
                write!(f, "hello response received")
            }
            Debug::HelloTimeout(..) => {
                write!(f, "hello interest timed out")
            }
            Debug::LsaInstall(..) => {
                write!(f, "LSA installed")
            }
            Debug::LsaUpdate(..) => {
                write!(f, "LSA updated")
            }
            Debug::LsaDiscard(..) => {
                write!(f, "LSA discarded")
            }
            Debug::LsaExpire(..) => {
                write!(f, "LSA expired")
            }
            Debug::LsaOriginate(..) => {
                write!(f, "LSA originated")
            }
            Debug::LsaRequestTx(..) => {
                write!(f, "LSA interest sent")
            }
            Debug::LsaDataTx(..) => {
                write!(f, "LSA data sent")
            }
            Debug::DvInterestTx(..) => {
                write!(f, "DV interest sent")
            }
            Debug::DvInterestRx(..) => {
                write!(f, "DV interest received")
            }
            Debug::DvUpdateTable(..) => {
                write!(f, "DV update-table message detected")
            }
            Debug::DvDataTx(..) => {
                write!(f, "DV data sent")
            }
            Debug::DvTimeout(..) => {
                write!(f, "DV interest timed out")
            }
            Debug::RoutingCalcScheduled => {
                write!(f, "routing calculation scheduled")
            }
            Debug::RoutingCalcStart(..) => {
                write!(f, "routing calculation starting")
            }
            Debug::RoutingCalcDone(..) => {
                write!(f, "routing calculation finished")
            }
            Debug::RoutingCalcDryRun(..) => {
                write!(f, "dry-run hyperbolic routing table computed")
            }
            Debug::FibAdd(..) => {
                write!(f, "FIB entry installed")
            }
            Debug::FibUpdate(..) => {
                write!(f, "FIB entry updated")
            }
            Debug::FibRemove(..) => {
                write!(f, "FIB entry removed")
            }
            Debug::FibRefresh(..) => {
                write!(f, "FIB entry refreshed")
            }
            Debug::SeqNoRestore(..) => {
                write!(f, "sequence numbers restored")
            }
            Debug::PacketDrop(..) => {
                write!(f, "packet dropped")
            }
        }
    }
}
