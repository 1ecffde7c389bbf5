//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use tracing::warn;

use crate::adjacency::AdjacencyStatus;
use crate::config::{HyperbolicState, MidstState};
use crate::debug::Debug;
use crate::error::Error;
use crate::events;
use crate::instance::Instance;
use crate::name::Name;
use crate::network::{Data, Interest};
use crate::packet::error::DecodeResult;
use crate::packet::lsa::{
    AdjacencyEntry, AdjacencyLsa, CoordinateLsa, Lsa, LsaBody, LsaHdr, LsaKey,
    LsaType, MidstLsa, MidstPrefix, MidstPrefixList, NameLsa,
};
use crate::tasks;
use crate::tasks::TimeoutTask;
use crate::tasks::messages::output::NetTxMsg;
use crate::{spf, southbound};

// LSDB entry: the stored LSA plus the timer armed for its expiration
// timepoint.
#[derive(Debug)]
pub struct LsaEntry {
    pub data: Lsa,
    pub expiry_timer: Option<TimeoutTask>,
}

// Link-State Database: at most one LSA per (origin router, type) pair.
#[derive(Debug, Default)]
pub struct Lsdb {
    entries: BTreeMap<LsaKey, LsaEntry>,
}

// Change notifications emitted by the install protocol.
#[derive(Debug)]
pub enum LsdbEvent {
    LsaInstalled(LsaKey),
    LsaUpdated(LsaKey, LsaDelta),
    LsaExpired(LsaKey),
}

// Prefix delta computed by the type-specific update of NameLSAs and
// MidstLSAs. Empty for the full-replacement types.
#[derive(Debug, Default)]
pub struct LsaDelta {
    pub names_added: Vec<Name>,
    pub names_removed: Vec<Name>,
}

// ===== impl Lsdb =====

impl Lsdb {
    pub fn get(&self, key: &LsaKey) -> Option<&LsaEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &LsaKey) -> Option<&mut LsaEntry> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &LsaKey) -> Option<LsaEntry> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LsaKey, &LsaEntry)> {
        self.entries.iter()
    }

    pub fn iter_type(
        &self,
        lsa_type: LsaType,
    ) -> impl Iterator<Item = &LsaEntry> {
        self.entries
            .iter()
            .filter(move |(key, _)| key.lsa_type == lsa_type)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: LsaKey, entry: LsaEntry) {
        self.entries.insert(key, entry);
    }
}

// ===== global functions =====

// Installs an LSA, enforcing strict sequence number supersession.
//
// Returns the accepted sequence number, or `None` when the LSA was
// discarded as stale or duplicate. Install itself never fails.
pub fn install(instance: &mut Instance, lsa: Lsa) -> Option<u64> {
    let key = lsa.key();
    let seq_no = lsa.hdr.seq_no;

    match instance.state.lsdb.get(&key).map(|entry| entry.data.hdr.seq_no) {
        None => {
            Debug::LsaInstall(&lsa).log();
            let expiry_timer = expiry_timer(instance, &key, &lsa.hdr);
            instance.state.lsdb.insert(
                key.clone(),
                LsaEntry {
                    data: lsa,
                    expiry_timer: Some(expiry_timer),
                },
            );
            events::lsdb_event(instance, LsdbEvent::LsaInstalled(key));
            Some(seq_no)
        }
        Some(stored_seq) if seq_no <= stored_seq => {
            if seq_no == stored_seq {
                if let Some(entry) = instance.state.lsdb.get(&key) {
                    if entry.data.body != lsa.body {
                        warn!(origin = %key.origin, lsa_type = %key.lsa_type,
                            %seq_no,
                            "conflicting LSA content under the same sequence \
                             number");
                    }
                }
            }
            Debug::LsaDiscard(&key, seq_no).log();
            None
        }
        Some(_) => {
            let (changed, delta) = update_entry(instance, &key, &lsa);
            let expiry_timer = expiry_timer(instance, &key, &lsa.hdr);
            if let Some(entry) = instance.state.lsdb.get_mut(&key) {
                entry.expiry_timer = Some(expiry_timer);
            }
            if changed {
                events::lsdb_event(
                    instance,
                    LsdbEvent::LsaUpdated(key, delta),
                );
            }
            Some(seq_no)
        }
    }
}

// Applies the type-specific update to the stored entry and refreshes its
// header. NameLSAs and MidstLSAs merge by prefix delta; the other types are
// replaced wholesale.
fn update_entry(
    instance: &mut Instance,
    key: &LsaKey,
    lsa: &Lsa,
) -> (bool, LsaDelta) {
    let Some(entry) = instance.state.lsdb.get_mut(key) else {
        return (false, LsaDelta::default());
    };

    let (changed, delta) = match (&mut entry.data.body, &lsa.body) {
        (LsaBody::Name(stored), LsaBody::Name(new)) => {
            let (changed, names_added, names_removed) = stored.update(new);
            (
                changed,
                LsaDelta {
                    names_added,
                    names_removed,
                },
            )
        }
        (LsaBody::Midst(stored), LsaBody::Midst(new)) => {
            let (changed, names_added, names_removed) = stored.update(new);
            (
                changed,
                LsaDelta {
                    names_added,
                    names_removed,
                },
            )
        }
        (LsaBody::Adjacency(stored), LsaBody::Adjacency(new)) => {
            let changed = stored != new;
            *stored = new.clone();
            (changed, LsaDelta::default())
        }
        (LsaBody::Coordinate(stored), LsaBody::Coordinate(new)) => {
            let changed = stored != new;
            *stored = new.clone();
            (changed, LsaDelta::default())
        }
        // The key carries the type, so stored and incoming bodies always
        // match.
        _ => (false, LsaDelta::default()),
    };

    entry.data.hdr = lsa.hdr.clone();
    if changed {
        Debug::LsaUpdate(&entry.data).log();
    }
    (changed, delta)
}

// Arms a timer for the LSA's expiration timepoint.
fn expiry_timer(
    instance: &Instance,
    key: &LsaKey,
    hdr: &LsaHdr,
) -> TimeoutTask {
    let timeout = (hdr.expiry - Utc::now()).to_std().unwrap_or_default();
    tasks::lsa_expiry_timer(
        key.clone(),
        timeout,
        &instance.tx.protocol_input,
    )
}

// Expiration timer fired: self-originated LSAs are rebuilt with the next
// sequence number, everything else is evicted.
pub(crate) fn process_lsa_expiry(instance: &mut Instance, key: LsaKey) {
    if key.origin == instance.config.router_prefix {
        match key.lsa_type {
            LsaType::Name => build_and_install_own_name_lsa(instance),
            LsaType::Adjacency => build_and_install_own_adj_lsa(instance),
            LsaType::Coordinate => build_and_install_own_cor_lsa(instance),
            LsaType::Midst => build_and_install_own_midst_lsa(instance),
        }
    } else if instance.state.lsdb.remove(&key).is_some() {
        Debug::LsaExpire(&key).log();
        events::lsdb_event(instance, LsdbEvent::LsaExpired(key));
    }
}

// Schedules a debounced rebuild of the own adjacency LSA. A pending rebuild
// is replaced rather than duplicated. With hyperbolic routing installed,
// adjacency changes feed the routing computation directly.
pub(crate) fn schedule_adj_lsa_build(instance: &mut Instance) {
    if instance.config.hyperbolic_state == HyperbolicState::On {
        spf::schedule(instance);
        return;
    }
    match &mut instance.state.adj_lsa_build_timer {
        Some(timer) => timer.reset(None),
        None => {
            instance.state.adj_lsa_build_timer =
                Some(tasks::adj_lsa_build_timer(
                    instance.config.adj_lsa_build_interval,
                    &instance.tx.protocol_input,
                ));
        }
    }
}

pub(crate) fn process_adj_lsa_build(instance: &mut Instance) {
    instance.state.adj_lsa_build_timer = None;
    build_and_install_own_adj_lsa(instance);
}

// ===== own-LSA origination =====

fn own_hdr(instance: &mut Instance, lsa_type: LsaType) -> LsaHdr {
    let seq_no = instance.state.seqno.increment(lsa_type);
    persist_seqno(instance);
    let refresh =
        chrono::Duration::from_std(instance.config.lsa_refresh_interval)
            .unwrap_or_else(|_| chrono::Duration::seconds(1800));
    LsaHdr::new(
        instance.config.router_prefix.clone(),
        seq_no,
        Utc::now() + refresh,
    )
}

pub fn build_and_install_own_name_lsa(instance: &mut Instance) {
    let hdr = own_hdr(instance, LsaType::Name);
    let body = NameLsa::new(instance.config.advertised_prefixes.clone());
    let lsa = Lsa::new(hdr, LsaBody::Name(body));
    Debug::LsaOriginate(&lsa).log();
    install(instance, lsa);
}

pub fn build_and_install_own_adj_lsa(instance: &mut Instance) {
    let adjacencies = instance
        .state
        .adjacencies
        .iter()
        .filter(|adjacency| adjacency.status == AdjacencyStatus::Active)
        .map(|adjacency| {
            AdjacencyEntry::new(
                adjacency.name.clone(),
                adjacency.face_uri.clone(),
                adjacency.link_cost,
            )
        })
        .collect();
    let hdr = own_hdr(instance, LsaType::Adjacency);
    let lsa = Lsa::new(hdr, LsaBody::Adjacency(AdjacencyLsa::new(adjacencies)));
    Debug::LsaOriginate(&lsa).log();
    install(instance, lsa);
}

pub fn build_and_install_own_cor_lsa(instance: &mut Instance) {
    let body = CoordinateLsa::new(
        instance.config.hyperbolic_radius,
        instance.config.hyperbolic_angles.clone(),
    );
    let hdr = own_hdr(instance, LsaType::Coordinate);
    let lsa = Lsa::new(hdr, LsaBody::Coordinate(body));
    Debug::LsaOriginate(&lsa).log();
    install(instance, lsa);
}

pub fn build_and_install_own_midst_lsa(instance: &mut Instance) {
    let hdr = own_hdr(instance, LsaType::Midst);
    let mut prefixes = MidstPrefixList::default();
    for name in &instance.config.advertised_prefixes {
        prefixes.insert(MidstPrefix::new(
            name.clone(),
            0.0,
            instance.config.router_prefix.clone(),
            hdr.seq_no,
        ));
    }
    prefixes.sort();
    let lsa = Lsa::new(hdr, LsaBody::Midst(MidstLsa::new(prefixes)));
    Debug::LsaOriginate(&lsa).log();
    install(instance, lsa);
}

fn persist_seqno(instance: &Instance) {
    if let Err(error) = instance.state.seqno.write_to_file() {
        Error::PersistenceFailed(error).log();
    }
}

// ===== LSA serving and fetch =====

// Requests the neighbor's LSAs, asking for anything newer than what the
// LSDB already holds.
pub(crate) fn express_lsa_interests(instance: &mut Instance, neighbor: &Name) {
    let mut lsa_types = vec![LsaType::Name, LsaType::Adjacency];
    if instance.config.hyperbolic_state != HyperbolicState::Off {
        lsa_types.push(LsaType::Coordinate);
    }
    if instance.config.midst_state != MidstState::Off {
        lsa_types.push(LsaType::Midst);
    }

    for lsa_type in lsa_types {
        let key = LsaKey::new(neighbor.clone(), lsa_type);
        let seq_no = instance
            .state
            .lsdb
            .get(&key)
            .map(|entry| entry.data.hdr.seq_no + 1)
            .unwrap_or(1);
        let name = lsa_name(instance, neighbor, lsa_type, seq_no);
        Debug::LsaRequestTx(&name).log();
        let interest =
            Interest::new(name, instance.config.interest_resend_time);
        let _ = instance.tx.net_tx.send(NetTxMsg::Interest(interest));
    }
}

// Answers an LSA interest for one of the own LSAs, provided the stored
// version is at least as new as the requested one.
pub(crate) fn process_lsa_interest(instance: &mut Instance, interest: &Interest) {
    let name = &interest.name;
    let prefix_len = instance.config.lsa_prefix.len();
    if name.len() < prefix_len + 3 {
        Debug::PacketDrop(name).log();
        return;
    }

    let lsa_type = name
        .get_back(1)
        .and_then(|component| component.as_str())
        .and_then(|value| value.parse::<LsaType>().ok());
    let seq_no = name
        .get_back(0)
        .and_then(|component| component.to_number().ok());
    let (Some(lsa_type), Some(seq_no)) = (lsa_type, seq_no) else {
        Debug::PacketDrop(name).log();
        return;
    };
    let origin = name.sub_name(prefix_len, name.len() - prefix_len - 2);

    if origin != instance.config.router_prefix {
        Debug::PacketDrop(name).log();
        return;
    }
    let key = LsaKey::new(origin, lsa_type);
    let Some(entry) = instance.state.lsdb.get(&key) else {
        Debug::PacketDrop(name).log();
        return;
    };
    if entry.data.hdr.seq_no < seq_no {
        Debug::PacketDrop(name).log();
        return;
    }

    let data_name = name
        .clone()
        .append_version(Utc::now().timestamp_millis() as u64)
        .append_segment(0);
    let content = entry.data.to_bytes();
    let data = Data::sign(data_name, content, &instance.config.signing);
    Debug::LsaDataTx(&data.name).log();
    let _ = instance.tx.net_tx.send(NetTxMsg::Data(data));
}

// Installs a validated LSA fetched from a neighbor.
pub(crate) fn process_lsa_data(
    instance: &mut Instance,
    data: &Data,
) -> Result<(), Error> {
    let mut buf = data.content.clone();
    let lsa = Lsa::decode(&mut buf)?;
    install(instance, lsa);
    Ok(())
}

fn lsa_name(
    instance: &Instance,
    origin: &Name,
    lsa_type: LsaType,
    seq_no: u64,
) -> Name {
    let mut name = instance.config.lsa_prefix.clone();
    for component in origin.iter() {
        name.push(component.clone());
    }
    name.append_str(&lsa_type.to_string()).append_number(seq_no)
}

// ===== distance-vector wire encoding =====

// Produces the block a neighbor receives in response to its DV interest:
// every MIDST LSA in the database, own LSA first, each with the link cost
// towards that neighbor added to all contained distances.
pub fn wire_encode_dv(instance: &Instance, neighbor: &Name) -> Bytes {
    let link_cost = instance
        .state
        .adjacencies
        .get(neighbor)
        .map(|adjacency| adjacency.link_cost)
        .unwrap_or_default();

    let own_key =
        LsaKey::new(instance.config.router_prefix.clone(), LsaType::Midst);
    let mut buf = BytesMut::new();
    if let Some(entry) = instance.state.lsdb.get(&own_key) {
        if let Some(midst_lsa) = entry.data.body.as_midst() {
            midst_lsa.encode(&entry.data.hdr, &mut buf, link_cost);
        }
    }
    for entry in instance
        .state
        .lsdb
        .iter()
        .filter(|(key, _)| key.lsa_type == LsaType::Midst && **key != own_key)
        .map(|(_, entry)| entry)
    {
        if let Some(midst_lsa) = entry.data.body.as_midst() {
            midst_lsa.encode(&entry.data.hdr, &mut buf, link_cost);
        }
    }
    buf.freeze()
}

// Decodes and installs the LSAs carried by a DV data packet. Returns the
// accepted sequence number of the origin router's own MIDST LSA, or zero
// when nothing new was learned from the origin itself.
pub fn wire_decode_dv(
    instance: &mut Instance,
    origin: &Name,
    content: Bytes,
) -> DecodeResult<u64> {
    let mut buf = content;
    let mut origin_seq = 0;
    while !buf.is_empty() {
        let lsa = Lsa::decode(&mut buf)?;
        let from_origin = lsa.lsa_type() == LsaType::Midst
            && lsa.hdr.origin == *origin;
        if let Some(seq_no) = install(instance, lsa) {
            if from_origin {
                origin_seq = seq_no;
            }
        }
    }
    Ok(origin_seq)
}

// Requests the multicast strategy for the LSA namespace so flooded records
// reach all neighbors.
pub(crate) fn request_lsa_strategy(instance: &Instance) {
    southbound::tx::set_strategy(
        &instance.tx.southbound,
        &instance.config.lsa_prefix,
        southbound::MULTICAST_STRATEGY,
    );
}
