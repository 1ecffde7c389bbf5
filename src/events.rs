//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use itertools::Itertools;
use tracing::debug;

use crate::adjacency::AdjacencyStatus;
use crate::config::HyperbolicState;
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;
use crate::lsdb::{self, LsdbEvent};
use crate::name::Name;
use crate::network::{Data, Interest};
use crate::packet::lsa::LsaType;
use crate::tasks::messages::input::{NetRxMsg, ProtocolMsg};
use crate::{dv, fib, hello, route, spf};

// Packet namespaces recognized by the instance.
enum PacketClass {
    Hello,
    Dv,
    Lsa,
    Unknown,
}

// ===== global functions =====

// Entry point for every protocol input message. Messages are processed
// strictly in arrival order.
pub fn process_protocol_msg(
    instance: &mut Instance,
    msg: ProtocolMsg,
) -> Result<(), Error> {
    match msg {
        ProtocolMsg::NetRx(msg) => process_net_rx(instance, msg),
        ProtocolMsg::HelloTick(_) => {
            hello::process_tick(instance);
            Ok(())
        }
        ProtocolMsg::DvTick(_) => {
            dv::process_round(instance);
            Ok(())
        }
        ProtocolMsg::AdjLsaBuild(_) => {
            lsdb::process_adj_lsa_build(instance);
            Ok(())
        }
        ProtocolMsg::LsaExpiry(msg) => {
            lsdb::process_lsa_expiry(instance, msg.key);
            Ok(())
        }
        ProtocolMsg::RoutingCalc(_) => {
            spf::process_routing_calc(instance);
            Ok(())
        }
        ProtocolMsg::FibRefresh(msg) => {
            fib::process_refresh(instance, msg.prefix);
            Ok(())
        }
    }
}

// Routes LSDB change notifications. Topology records feed the routing
// computation; prefix records re-project the name-prefix table onto the
// current routing table.
pub(crate) fn lsdb_event(instance: &mut Instance, event: LsdbEvent) {
    let key = match &event {
        LsdbEvent::LsaInstalled(key) | LsdbEvent::LsaExpired(key) => key,
        LsdbEvent::LsaUpdated(key, delta) => {
            if !delta.names_added.is_empty() {
                debug!(origin = %key.origin,
                    names = %delta.names_added.iter().join(", "),
                    "prefixes added");
            }
            if !delta.names_removed.is_empty() {
                debug!(origin = %key.origin,
                    names = %delta.names_removed.iter().join(", "),
                    "prefixes removed");
            }
            key
        }
    };

    match key.lsa_type {
        LsaType::Adjacency | LsaType::Coordinate => spf::schedule(instance),
        LsaType::Name | LsaType::Midst => route::project(instance),
    }
}

// ===== helper functions =====

fn process_net_rx(
    instance: &mut Instance,
    msg: NetRxMsg,
) -> Result<(), Error> {
    match msg {
        NetRxMsg::Interest(interest) => process_interest(instance, interest),
        NetRxMsg::Data(data) => process_data(instance, data),
        NetRxMsg::Timeout { name } => {
            process_timeout(instance, name);
            Ok(())
        }
        NetRxMsg::Nack { name, reason } => {
            // Negative acknowledgements are treated as timeouts.
            debug!(name = %name, %reason, "received Nack");
            process_timeout(instance, name);
            Ok(())
        }
        NetRxMsg::FaceDestroyed { face_id } => {
            process_face_destroyed(instance, face_id);
            Ok(())
        }
    }
}

fn classify(instance: &Instance, name: &Name) -> PacketClass {
    if let Some(position) = name.position_of(dv::NLSR_COMPONENT) {
        if let Some(component) =
            name.get(position + 1).and_then(|component| component.as_str())
        {
            match component {
                hello::INFO_COMPONENT => return PacketClass::Hello,
                dv::DIST_VECTOR_COMPONENT => return PacketClass::Dv,
                _ => (),
            }
        }
    }
    if name.starts_with(&instance.config.lsa_prefix) {
        return PacketClass::Lsa;
    }
    PacketClass::Unknown
}

fn process_interest(
    instance: &mut Instance,
    interest: Interest,
) -> Result<(), Error> {
    match classify(instance, &interest.name) {
        PacketClass::Hello => {
            hello::process_interest(instance, &interest);
            Ok(())
        }
        PacketClass::Dv => dv::process_interest(instance, &interest),
        PacketClass::Lsa => {
            lsdb::process_lsa_interest(instance, &interest);
            Ok(())
        }
        PacketClass::Unknown => {
            Debug::PacketDrop(&interest.name).log();
            Ok(())
        }
    }
}

fn process_data(instance: &mut Instance, data: Data) -> Result<(), Error> {
    // Signature validation happens before any dispatch; failures are
    // logged and the packet is discarded.
    if !data.verify(&instance.config.signing.key) {
        return Err(Error::ValidationFailed(data.name));
    }

    match classify(instance, &data.name) {
        PacketClass::Hello => {
            hello::process_data(instance, &data);
            Ok(())
        }
        PacketClass::Dv => dv::process_data(instance, &data),
        PacketClass::Lsa => lsdb::process_lsa_data(instance, &data),
        PacketClass::Unknown => {
            Debug::PacketDrop(&data.name).log();
            Ok(())
        }
    }
}

fn process_timeout(instance: &mut Instance, name: Name) {
    match classify(instance, &name) {
        PacketClass::Hello => hello::process_timeout(instance, &name),
        PacketClass::Dv => dv::process_timeout(&name),
        PacketClass::Lsa | PacketClass::Unknown => {
            Debug::PacketDrop(&name).log();
        }
    }
}

// A destroyed face kills the adjacency immediately; the retry counter is
// saturated so the neighbor stays down until a hello makes it through
// again.
fn process_face_destroyed(instance: &mut Instance, face_id: u64) {
    if face_id == 0 {
        return;
    }
    let retry_count = instance.config.hello_retry_count;
    let Some(adjacency) =
        instance.state.adjacencies.find_by_face_id_mut(face_id)
    else {
        return;
    };
    adjacency.face_id = 0;
    if !adjacency.is_active() {
        return;
    }
    adjacency.set_status(AdjacencyStatus::Inactive);
    adjacency.hello_timeouts = retry_count;

    if instance.config.hyperbolic_state != HyperbolicState::Off {
        spf::schedule(instance);
    } else {
        lsdb::schedule_adj_lsa_build(instance);
    }
}
