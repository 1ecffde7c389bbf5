//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;
use std::str::FromStr;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::name::Name;
use crate::packet::consts::TlvType;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::tlv::{self, TlvElement};

// LSA type tag. Together with the origin router it forms the LSDB key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaType {
    Name,
    Adjacency,
    Coordinate,
    Midst,
}

// LSDB primary key.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LsaKey {
    pub origin: Name,
    pub lsa_type: LsaType,
}

// Header shared by all LSA types.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LsaHdr {
    pub origin: Name,
    pub seq_no: u64,
    pub expiry: DateTime<Utc>,
}

// Typed LSA payload.
#[derive(Clone, Debug, PartialEq)]
#[derive(EnumAsInner)]
#[derive(Deserialize, Serialize)]
pub enum LsaBody {
    Name(NameLsa),
    Adjacency(AdjacencyLsa),
    Coordinate(CoordinateLsa),
    Midst(MidstLsa),
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Lsa {
    pub hdr: LsaHdr,
    pub body: LsaBody,
}

// Application name prefixes advertised by the origin.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NameLsa {
    pub name_list: Vec<Name>,
}

// Active adjacencies of the origin.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AdjacencyLsa {
    pub adjacencies: Vec<AdjacencyEntry>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct AdjacencyEntry {
    pub neighbor: Name,
    pub face_uri: String,
    pub cost: f64,
}

// Hyperbolic coordinates of the origin.
#[derive(Clone, Debug, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct CoordinateLsa {
    pub radius: f64,
    pub angles: Vec<f64>,
}

// Distance-vector payload: reachable prefixes with accumulated distances.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct MidstLsa {
    pub prefixes: MidstPrefixList,
}

// Ordered list of `(name, distance, anchor, seq_no)` tuples, upserted by
// name.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct MidstPrefixList {
    entries: Vec<MidstPrefix>,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct MidstPrefix {
    pub name: Name,
    pub distance: f64,
    pub anchor: Name,
    pub seq_no: u64,
}

// ===== impl LsaType =====

impl fmt::Display for LsaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LsaType::Name => write!(f, "NAME"),
            LsaType::Adjacency => write!(f, "ADJACENCY"),
            LsaType::Coordinate => write!(f, "COORDINATE"),
            LsaType::Midst => write!(f, "MIDST"),
        }
    }
}

impl FromStr for LsaType {
    type Err = ();

    fn from_str(s: &str) -> Result<LsaType, ()> {
        match s {
            "NAME" => Ok(LsaType::Name),
            "ADJACENCY" => Ok(LsaType::Adjacency),
            "COORDINATE" => Ok(LsaType::Coordinate),
            "MIDST" => Ok(LsaType::Midst),
            _ => Err(()),
        }
    }
}

// ===== impl LsaHdr =====

impl LsaHdr {
    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        let mut value = BytesMut::new();

        let mut origin = BytesMut::new();
        self.origin.encode(&mut origin);
        tlv::put_block(&mut value, TlvType::OriginRouter, &origin);

        tlv::put_number_block(&mut value, TlvType::SequenceNumber, self.seq_no);
        let millis = self.expiry.timestamp_millis().max(0) as u64;
        tlv::put_number_block(&mut value, TlvType::ExpirationTime, millis);

        tlv::put_block(buf, TlvType::Lsa, &value);
    }

    pub(crate) fn decode(element: &TlvElement) -> DecodeResult<LsaHdr> {
        element.expect_type(TlvType::Lsa)?;
        let mut value = element.value.clone();

        let origin_element = TlvElement::decode(&mut value)
            .map_err(|_| DecodeError::MissingField("OriginRouter"))?;
        origin_element.expect_type(TlvType::OriginRouter)?;
        let mut origin_value = origin_element.value.clone();
        let origin = Name::decode(&mut origin_value)?;

        let seq_element = TlvElement::decode(&mut value)
            .map_err(|_| DecodeError::MissingField("SequenceNumber"))?;
        seq_element.expect_type(TlvType::SequenceNumber)?;
        let seq_no = seq_element.as_number()?;

        let expiry_element = TlvElement::decode(&mut value)
            .map_err(|_| DecodeError::MissingField("ExpirationTime"))?;
        expiry_element.expect_type(TlvType::ExpirationTime)?;
        let millis = expiry_element.as_number()?;
        let expiry = DateTime::<Utc>::from_timestamp_millis(millis as i64)
            .ok_or(DecodeError::InvalidTimestamp(millis))?;

        // Trailing unknown sub-TLVs are tolerated.
        Ok(LsaHdr {
            origin,
            seq_no,
            expiry,
        })
    }
}

// ===== impl Lsa =====

impl Lsa {
    pub fn new(hdr: LsaHdr, body: LsaBody) -> Lsa {
        Lsa { hdr, body }
    }

    pub fn lsa_type(&self) -> LsaType {
        match self.body {
            LsaBody::Name(..) => LsaType::Name,
            LsaBody::Adjacency(..) => LsaType::Adjacency,
            LsaBody::Coordinate(..) => LsaType::Coordinate,
            LsaBody::Midst(..) => LsaType::Midst,
        }
    }

    pub fn key(&self) -> LsaKey {
        LsaKey::new(self.hdr.origin.clone(), self.lsa_type())
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match &self.body {
            LsaBody::Name(name_lsa) => {
                let mut value = BytesMut::new();
                self.hdr.encode(&mut value);
                for name in &name_lsa.name_list {
                    name.encode(&mut value);
                }
                tlv::put_block(buf, TlvType::NameLsa, &value);
            }
            LsaBody::Adjacency(adj_lsa) => {
                let mut value = BytesMut::new();
                self.hdr.encode(&mut value);
                for adjacency in &adj_lsa.adjacencies {
                    adjacency.encode(&mut value);
                }
                tlv::put_block(buf, TlvType::AdjacencyLsa, &value);
            }
            LsaBody::Coordinate(cor_lsa) => {
                let mut value = BytesMut::new();
                self.hdr.encode(&mut value);
                tlv::put_double_block(
                    &mut value,
                    TlvType::HyperbolicRadius,
                    cor_lsa.radius,
                );
                for angle in &cor_lsa.angles {
                    tlv::put_double_block(
                        &mut value,
                        TlvType::HyperbolicAngle,
                        *angle,
                    );
                }
                tlv::put_block(buf, TlvType::CoordinateLsa, &value);
            }
            LsaBody::Midst(midst_lsa) => {
                midst_lsa.encode(&self.hdr, buf, 0.0);
            }
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    // Decodes one LSA block from the front of the buffer. Unknown top-level
    // types are rejected.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Lsa> {
        let element = TlvElement::decode(buf)?;
        let mut value = element.value.clone();

        if element.is_type(TlvType::NameLsa) {
            let hdr = Lsa::decode_hdr(&mut value)?;
            let body = NameLsa::decode_body(value)?;
            Ok(Lsa::new(hdr, LsaBody::Name(body)))
        } else if element.is_type(TlvType::AdjacencyLsa) {
            let hdr = Lsa::decode_hdr(&mut value)?;
            let body = AdjacencyLsa::decode_body(value)?;
            Ok(Lsa::new(hdr, LsaBody::Adjacency(body)))
        } else if element.is_type(TlvType::CoordinateLsa) {
            let hdr = Lsa::decode_hdr(&mut value)?;
            let body = CoordinateLsa::decode_body(value)?;
            Ok(Lsa::new(hdr, LsaBody::Coordinate(body)))
        } else if element.is_type(TlvType::MidstLsa) {
            let hdr = Lsa::decode_hdr(&mut value)?;
            let body = MidstLsa::decode_body(value)?;
            Ok(Lsa::new(hdr, LsaBody::Midst(body)))
        } else {
            Err(DecodeError::UnknownTopLevelType(element.tlv_type))
        }
    }

    fn decode_hdr(value: &mut Bytes) -> DecodeResult<LsaHdr> {
        let element = TlvElement::decode(value)
            .map_err(|_| DecodeError::MissingField("Lsa"))?;
        LsaHdr::decode(&element)
    }
}

// ===== impl NameLsa =====

impl NameLsa {
    pub fn new(mut name_list: Vec<Name>) -> NameLsa {
        name_list.sort();
        NameLsa { name_list }
    }

    fn decode_body(mut value: Bytes) -> DecodeResult<NameLsa> {
        let mut name_list = vec![];
        while !value.is_empty() {
            let element = TlvElement::decode(&mut value)?;
            if element.is_type(TlvType::Name) {
                name_list.push(Name::decode_element(&element)?);
            }
            // Unknown sub-TLVs are skipped.
        }
        Ok(NameLsa { name_list })
    }

    // Applies a newer version of this LSA, returning whether the content
    // changed plus the prefix delta.
    pub fn update(&mut self, new: &NameLsa) -> (bool, Vec<Name>, Vec<Name>) {
        let names_to_add = new
            .name_list
            .iter()
            .filter(|name| !self.name_list.contains(name))
            .cloned()
            .collect::<Vec<_>>();
        for name in &names_to_add {
            self.name_list.push(name.clone());
        }
        self.name_list.sort();

        let names_to_remove = self
            .name_list
            .iter()
            .filter(|name| !new.name_list.contains(name))
            .cloned()
            .collect::<Vec<_>>();
        for name in &names_to_remove {
            self.name_list.retain(|entry| entry != name);
        }

        let updated = !names_to_add.is_empty() || !names_to_remove.is_empty();
        (updated, names_to_add, names_to_remove)
    }
}

// ===== impl AdjacencyLsa =====

impl AdjacencyLsa {
    pub fn new(adjacencies: Vec<AdjacencyEntry>) -> AdjacencyLsa {
        AdjacencyLsa { adjacencies }
    }

    fn decode_body(mut value: Bytes) -> DecodeResult<AdjacencyLsa> {
        let mut adjacencies = vec![];
        while !value.is_empty() {
            let element = TlvElement::decode(&mut value)?;
            if element.is_type(TlvType::Adjacency) {
                adjacencies.push(AdjacencyEntry::decode(element.value)?);
            }
        }
        Ok(AdjacencyLsa { adjacencies })
    }
}

// ===== impl AdjacencyEntry =====

impl AdjacencyEntry {
    fn encode(&self, buf: &mut BytesMut) {
        let mut value = BytesMut::new();
        self.neighbor.encode(&mut value);
        tlv::put_string_block(&mut value, TlvType::Uri, &self.face_uri);
        tlv::put_double_block(&mut value, TlvType::Cost, self.cost);
        tlv::put_block(buf, TlvType::Adjacency, &value);
    }

    fn decode(mut value: Bytes) -> DecodeResult<AdjacencyEntry> {
        let element = TlvElement::decode(&mut value)
            .map_err(|_| DecodeError::MissingField("Name"))?;
        element.expect_type(TlvType::Name)?;
        let neighbor = Name::decode_element(&element)?;

        let element = TlvElement::decode(&mut value)
            .map_err(|_| DecodeError::MissingField("Uri"))?;
        element.expect_type(TlvType::Uri)?;
        let face_uri = element.as_string()?;

        let element = TlvElement::decode(&mut value)
            .map_err(|_| DecodeError::MissingField("Cost"))?;
        element.expect_type(TlvType::Cost)?;
        let cost = element.as_double()?;

        Ok(AdjacencyEntry {
            neighbor,
            face_uri,
            cost,
        })
    }
}

// ===== impl CoordinateLsa =====

impl CoordinateLsa {
    fn decode_body(mut value: Bytes) -> DecodeResult<CoordinateLsa> {
        let element = TlvElement::decode(&mut value)
            .map_err(|_| DecodeError::MissingField("HyperbolicRadius"))?;
        element.expect_type(TlvType::HyperbolicRadius)?;
        let radius = element.as_double()?;

        let mut angles = vec![];
        while !value.is_empty() {
            let element = TlvElement::decode(&mut value)?;
            if element.is_type(TlvType::HyperbolicAngle) {
                angles.push(element.as_double()?);
            }
        }
        Ok(CoordinateLsa { radius, angles })
    }
}

// ===== impl MidstLsa =====

impl MidstLsa {
    pub fn new(prefixes: MidstPrefixList) -> MidstLsa {
        MidstLsa { prefixes }
    }

    // Full encode: the outer MidstLsa block wrapping the base-LSA header and
    // the prefix list, with `extra_distance` added to every distance.
    pub fn encode(&self, hdr: &LsaHdr, buf: &mut BytesMut, extra_distance: f64) {
        let mut value = BytesMut::new();
        hdr.encode(&mut value);
        self.prefixes.encode(&mut value, extra_distance);
        tlv::put_block(buf, TlvType::MidstLsa, &value);
    }

    // Relay encode: only the prefix-list portion, with `extra_distance`
    // added to every distance.
    pub fn encode_forward(&self, buf: &mut BytesMut, extra_distance: f64) {
        self.prefixes.encode(buf, extra_distance);
    }

    fn decode_body(mut value: Bytes) -> DecodeResult<MidstLsa> {
        let mut prefixes = MidstPrefixList::default();
        while !value.is_empty() {
            let element = TlvElement::decode(&mut value)?;
            if element.is_type(TlvType::MidstPrefixList) {
                prefixes.decode_merge(element.value)?;
            }
        }
        Ok(MidstLsa { prefixes })
    }

    // Applies a newer version of this LSA. Prefixes present on both sides
    // keep their stored tuples; only additions and removals count as change.
    pub fn update(&mut self, new: &MidstLsa) -> (bool, Vec<Name>, Vec<Name>) {
        let names_to_add = new
            .prefixes
            .iter()
            .filter(|entry| self.prefixes.get(&entry.name).is_none())
            .cloned()
            .collect::<Vec<_>>();
        for entry in &names_to_add {
            self.prefixes.insert(entry.clone());
        }
        self.prefixes.sort();

        let names_to_remove = self
            .prefixes
            .names()
            .filter(|name| new.prefixes.get(name).is_none())
            .cloned()
            .collect::<Vec<_>>();
        for name in &names_to_remove {
            self.prefixes.remove(name);
        }

        let updated = !names_to_add.is_empty() || !names_to_remove.is_empty();
        (
            updated,
            names_to_add.into_iter().map(|entry| entry.name).collect(),
            names_to_remove,
        )
    }
}

// ===== impl MidstPrefixList =====

impl MidstPrefixList {
    // Upsert by name. Returns whether the name was newly added.
    pub fn insert(&mut self, prefix: MidstPrefix) -> bool {
        match self
            .entries
            .iter()
            .position(|entry| entry.name == prefix.name)
        {
            Some(index) => {
                self.entries[index] = prefix;
                false
            }
            None => {
                self.entries.push(prefix);
                true
            }
        }
    }

    pub fn remove(&mut self, name: &Name) -> bool {
        let len = self.entries.len();
        self.entries.retain(|entry| entry.name != *name);
        self.entries.len() != len
    }

    pub fn get(&self, name: &Name) -> Option<&MidstPrefix> {
        self.entries.iter().find(|entry| entry.name == *name)
    }

    pub fn distance(&self, name: &Name) -> Option<f64> {
        self.get(name).map(|entry| entry.distance)
    }

    pub fn anchor(&self, name: &Name) -> Option<&Name> {
        self.get(name).map(|entry| &entry.anchor)
    }

    pub fn seq_no(&self, name: &Name) -> Option<u64> {
        self.get(name).map(|entry| entry.seq_no)
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.entries.iter().map(|entry| &entry.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MidstPrefix> {
        self.entries.iter()
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self, buf: &mut BytesMut, extra_distance: f64) {
        let mut value = BytesMut::new();
        for entry in &self.entries {
            entry.name.encode(&mut value);
            tlv::put_double_block(
                &mut value,
                TlvType::Distance,
                entry.distance + extra_distance,
            );
            entry.anchor.encode(&mut value);
            tlv::put_double_block(
                &mut value,
                TlvType::SeqNo,
                entry.seq_no as f64,
            );
        }
        tlv::put_block(buf, TlvType::MidstPrefixList, &value);
    }

    // Decodes one prefix-list block from the front of the buffer.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<MidstPrefixList> {
        let element = TlvElement::decode(buf)?;
        element.expect_type(TlvType::MidstPrefixList)?;
        let mut list = MidstPrefixList::default();
        list.decode_merge(element.value)?;
        Ok(list)
    }

    // Each entry requires Name, Distance, Anchor and SeqNo in exactly that
    // order; a missing field is an encoding error.
    fn decode_merge(&mut self, mut value: Bytes) -> DecodeResult<()> {
        while !value.is_empty() {
            let element = TlvElement::decode(&mut value)
                .map_err(|_| DecodeError::MissingField("Name"))?;
            element.expect_type(TlvType::Name)?;
            let name = Name::decode_element(&element)?;

            let element = TlvElement::decode(&mut value)
                .map_err(|_| DecodeError::MissingField("Distance"))?;
            element.expect_type(TlvType::Distance)?;
            let distance = element.as_double()?;

            let element = TlvElement::decode(&mut value)
                .map_err(|_| DecodeError::MissingField("Anchor"))?;
            element.expect_type(TlvType::Name)?;
            let anchor = Name::decode_element(&element)?;

            let element = TlvElement::decode(&mut value)
                .map_err(|_| DecodeError::MissingField("SeqNo"))?;
            element.expect_type(TlvType::SeqNo)?;
            // The sequence number travels as a double; in memory it is an
            // integer (lossless below 2^53).
            let seq_no = element.as_double()? as u64;

            self.insert(MidstPrefix::new(name, distance, anchor, seq_no));
        }
        Ok(())
    }
}
