//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::debug::Debug;
use crate::error::Error;
use crate::instance::Instance;
use crate::lsdb;
use crate::name::Name;
use crate::network::{Data, Interest};
use crate::packet::error::DecodeError;
use crate::packet::lsa::{LsaKey, LsaType};
use crate::tasks::messages::output::NetTxMsg;

// Name components of the distance-vector namespace:
// `/<router>/nlsr/DV/<seq_no>/<origin-as-component>`.
pub const NLSR_COMPONENT: &str = "nlsr";
pub const DIST_VECTOR_COMPONENT: &str = "DV";

// Per-neighbor record of the highest sequence number exchanged in either
// direction. At most one entry per neighbor.
#[derive(Debug, Default)]
pub struct ProcessedNeighbors {
    entries: Vec<(Name, u64)>,
}

// ===== impl ProcessedNeighbors =====

impl ProcessedNeighbors {
    // Upsert by neighbor name. The stored value never decreases.
    pub fn insert(&mut self, router: &Name, seq_no: u64) {
        match self.entries.iter().position(|(name, _)| name == router) {
            Some(index) => {
                let stored = &mut self.entries[index].1;
                if seq_no > *stored {
                    debug!(neighbor = %router, %seq_no,
                        "updated processed sequence number");
                    *stored = seq_no;
                }
            }
            None => self.entries.push((router.clone(), seq_no)),
        }
    }

    // Bumps the counter for a neighbor we just answered. Unknown neighbors
    // are left alone.
    pub fn increase(&mut self, router: &Name) {
        if let Some((_, stored)) =
            self.entries.iter_mut().find(|(name, _)| name == router)
        {
            *stored += 1;
            debug!(neighbor = %router, seq_no = %stored,
                "increased processed sequence number");
        }
    }

    pub fn last_seq(&self, router: &Name) -> Option<u64> {
        self.entries
            .iter()
            .find(|(name, _)| name == router)
            .map(|(_, seq_no)| *seq_no)
    }

    // An interest carrying a sequence number strictly greater than the
    // stored one announces that the neighbor's table advanced. An equal
    // sequence number does not.
    pub fn is_update_table_message(&self, router: &Name, seq_no: u64) -> bool {
        matches!(self.last_seq(router), Some(stored) if stored < seq_no)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Name, u64)> {
        self.entries.iter()
    }
}

// ===== global functions =====

// `/<neighbor>/nlsr/DV/<own midst seq>/<own router prefix>`.
pub fn build_interest_name(instance: &Instance, neighbor: &Name) -> Name {
    neighbor
        .clone()
        .append_str(NLSR_COMPONENT)
        .append_str(DIST_VECTOR_COMPONENT)
        .append_number(instance.state.seqno.seq(LsaType::Midst))
        .append_name(&instance.config.router_prefix)
}

// Issues a DV pull towards the neighbor. Terminal outcomes are data,
// negative acknowledgement or timeout; there is no retry at this layer.
pub fn express_interest(
    instance: &mut Instance,
    neighbor: &Name,
    lifetime: Duration,
) {
    let name = build_interest_name(instance, neighbor);
    Debug::DvInterestTx(neighbor, instance.state.seqno.seq(LsaType::Midst))
        .log();
    let interest = Interest::new(name, lifetime);
    let _ = instance.tx.net_tx.send(NetTxMsg::Interest(interest));
}

// Periodic round: pull from every active neighbor. This is the only retry
// mechanism at the DV layer.
pub(crate) fn process_round(instance: &mut Instance) {
    let neighbors = instance
        .state
        .adjacencies
        .iter()
        .filter(|adjacency| adjacency.is_active())
        .map(|adjacency| adjacency.name.clone())
        .collect::<Vec<_>>();
    let lifetime = instance.config.interest_resend_time;
    for neighbor in neighbors {
        express_interest(instance, &neighbor, lifetime);
    }
}

// Incoming DV interest:
// 1. attribute the request through the trailing origin component;
// 2. recursively pull back when the sender's sequence number advanced;
// 3. answer known neighbors with the relayed MIDST LSAs.
pub(crate) fn process_interest(
    instance: &mut Instance,
    interest: &Interest,
) -> Result<(), Error> {
    let name = &interest.name;
    let requester = name
        .get_back(0)
        .ok_or(Error::InvalidEncoding(DecodeError::MissingField(
            "OriginRouter",
        )))
        .and_then(|component| {
            component.to_name().map_err(Error::InvalidEncoding)
        })?;
    let seq_no = name
        .get_back(1)
        .and_then(|component| component.to_number().ok())
        .unwrap_or(0);

    Debug::DvInterestRx(&requester, seq_no).log();

    if instance
        .state
        .processed_neighbors
        .is_update_table_message(&requester, seq_no)
    {
        Debug::DvUpdateTable(&requester, seq_no).log();
        let lifetime = instance.config.interest_resend_time;
        express_interest(instance, &requester, lifetime);
    }

    if !instance.state.adjacencies.is_neighbor(&requester) {
        return Err(Error::UnknownNeighbor(requester));
    }

    let data_name = name
        .clone()
        .append_version(Utc::now().timestamp_millis() as u64)
        .append_segment(0);
    let content = lsdb::wire_encode_dv(instance, &requester);
    let data = Data::sign(data_name, content, &instance.config.signing);
    Debug::DvDataTx(&data.name).log();
    let _ = instance.tx.net_tx.send(NetTxMsg::Data(data));
    instance.state.processed_neighbors.increase(&requester);
    Ok(())
}

// Validated DV data: install the carried LSAs, record the origin's
// sequence number and gossip towards the remaining active neighbors.
pub(crate) fn process_data(
    instance: &mut Instance,
    data: &Data,
) -> Result<(), Error> {
    let name = &data.name;
    let Some(position) = name.position_of(DIST_VECTOR_COMPONENT) else {
        Debug::PacketDrop(name).log();
        return Ok(());
    };
    if position < 1 {
        Debug::PacketDrop(name).log();
        return Ok(());
    }
    let origin_router = name.prefix(position - 1);

    if data.content.is_empty() {
        Debug::PacketDrop(name).log();
        return Ok(());
    }

    let seq_no =
        lsdb::wire_decode_dv(instance, &origin_router, data.content.clone())?;
    if seq_no != 0 {
        instance
            .state
            .processed_neighbors
            .insert(&origin_router, seq_no);
        gossip(instance, &origin_router);
    }
    Ok(())
}

// Gossip step: pull from every active adjacency of the own adjacency LSA,
// except the router the data just came from.
pub(crate) fn gossip(instance: &mut Instance, origin_router: &Name) {
    let own_key =
        LsaKey::new(instance.config.router_prefix.clone(), LsaType::Adjacency);
    let Some(adj_lsa) = instance
        .state
        .lsdb
        .get(&own_key)
        .and_then(|entry| entry.data.body.as_adjacency())
    else {
        return;
    };

    let neighbors = adj_lsa
        .adjacencies
        .iter()
        .map(|adjacency| adjacency.neighbor.clone())
        .filter(|neighbor| neighbor != origin_router)
        .filter(|neighbor| {
            instance
                .state
                .adjacencies
                .get(neighbor)
                .is_some_and(|adjacency| adjacency.is_active())
        })
        .collect::<Vec<_>>();

    let lifetime = instance.config.interest_resend_time;
    for neighbor in neighbors {
        express_interest(instance, &neighbor, lifetime);
    }
}

// Timed-out DV interests are logged; the next scheduled round retries.
pub(crate) fn process_timeout(name: &Name) {
    Debug::DvTimeout(name).log();
}
