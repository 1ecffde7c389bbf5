//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use crate::adjacency::AdjacencyStatus;
use crate::config::MidstState;
use crate::debug::Debug;
use crate::dv::{self, NLSR_COMPONENT};
use crate::instance::Instance;
use crate::lsdb;
use crate::name::Name;
use crate::network::{Data, Interest};
use crate::tasks;
use crate::tasks::messages::output::NetTxMsg;

// Name component of the hello namespace:
// `/<router>/nlsr/INFO/<origin-as-component>`.
pub const INFO_COMPONENT: &str = "INFO";

// ===== global functions =====

pub fn build_interest_name(instance: &Instance, neighbor: &Name) -> Name {
    neighbor
        .clone()
        .append_str(NLSR_COMPONENT)
        .append_str(INFO_COMPONENT)
        .append_name(&instance.config.router_prefix)
}

pub fn express_interest(
    instance: &mut Instance,
    neighbor: &Name,
    lifetime: Duration,
) {
    Debug::HelloTx(neighbor).log();
    let name = build_interest_name(instance, neighbor);
    let interest = Interest::new(name, lifetime);
    let _ = instance.tx.net_tx.send(NetTxMsg::Interest(interest));
}

// Scheduled hello round: probe every configured neighbor. The first round
// also arms the periodic interval task.
pub(crate) fn process_tick(instance: &mut Instance) {
    instance.state.first_hello_timer = None;
    if instance.state.hello_interval_task.is_none() {
        instance.state.hello_interval_task = Some(tasks::hello_interval(
            instance.config.hello_interval,
            &instance.tx.protocol_input,
        ));
    }

    let neighbors = instance
        .state
        .adjacencies
        .iter()
        .map(|adjacency| adjacency.name.clone())
        .collect::<Vec<_>>();
    let lifetime = instance.config.interest_resend_time;
    for neighbor in neighbors {
        express_interest(instance, &neighbor, lifetime);
    }
}

// Incoming hello interest. Known neighbors get a signed response; if the
// requester is currently held inactive, a hello is expressed right back so
// both sides converge without waiting for the next round.
pub(crate) fn process_interest(instance: &mut Instance, interest: &Interest) {
    let name = &interest.name;
    let Some(neighbor) = name
        .get_back(0)
        .and_then(|component| component.to_name().ok())
    else {
        Debug::PacketDrop(name).log();
        return;
    };

    if !instance.state.adjacencies.is_neighbor(&neighbor) {
        Debug::PacketDrop(name).log();
        return;
    }

    let data = Data::sign(
        name.clone(),
        &b"info"[..],
        &instance.config.signing,
    );
    let _ = instance.tx.net_tx.send(NetTxMsg::Data(data));

    let inactive = instance
        .state
        .adjacencies
        .get(&neighbor)
        .is_some_and(|adjacency| !adjacency.is_active());
    if inactive {
        let lifetime = instance.config.interest_resend_time;
        express_interest(instance, &neighbor, lifetime);
    }
}

// Validated hello response: the neighbor is alive.
pub(crate) fn process_data(instance: &mut Instance, data: &Data) {
    let name = &data.name;
    let Some(position) = name.position_of(NLSR_COMPONENT) else {
        Debug::PacketDrop(name).log();
        return;
    };
    let neighbor = name.prefix(position);
    Debug::HelloRx(&neighbor).log();

    let Some(adjacency) = instance.state.adjacencies.get_mut(&neighbor) else {
        Debug::PacketDrop(name).log();
        return;
    };
    let was_active = adjacency.is_active();
    adjacency.hello_timeouts = 0;
    adjacency.set_status(AdjacencyStatus::Active);

    if !was_active {
        lsdb::schedule_adj_lsa_build(instance);
        lsdb::express_lsa_interests(instance, &neighbor);
        if instance.config.midst_state == MidstState::On {
            let lifetime = instance.config.interest_resend_time;
            dv::express_interest(instance, &neighbor, lifetime);
        }
    }
}

// Hello timeout: retry until the threshold, then declare the neighbor dead
// and rebuild the own adjacency LSA.
pub(crate) fn process_timeout(instance: &mut Instance, name: &Name) {
    let Some(position) = name.position_of(NLSR_COMPONENT) else {
        Debug::PacketDrop(name).log();
        return;
    };
    let neighbor = name.prefix(position);

    let Some(adjacency) = instance.state.adjacencies.get_mut(&neighbor) else {
        Debug::PacketDrop(name).log();
        return;
    };
    adjacency.hello_timeouts += 1;
    Debug::HelloTimeout(&neighbor, adjacency.hello_timeouts).log();

    if adjacency.hello_timeouts < instance.config.hello_retry_count {
        let lifetime = instance.config.interest_resend_time;
        express_interest(instance, &neighbor, lifetime);
    } else if adjacency.is_active() {
        adjacency.set_status(AdjacencyStatus::Inactive);
        lsdb::schedule_adj_lsa_build(instance);
    }
}
