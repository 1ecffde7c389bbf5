//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::packet::consts::TlvType;
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::tlv::{self, TlvElement};

// A single name component. Most components are generic; version and segment
// components carry their own type codes per the NDN naming conventions.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct NameComponent {
    pub tlv_type: u64,
    pub value: Bytes,
}

// A hierarchical NDN name: an ordered sequence of components.
//
// Names are plain value types, ordered and hashable, so they can serve as
// keys across component boundaries without back-references.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

// ===== impl NameComponent =====

impl NameComponent {
    pub fn generic(value: impl Into<Bytes>) -> NameComponent {
        NameComponent {
            tlv_type: TlvType::GenericNameComponent.to_u64().unwrap(),
            value: value.into(),
        }
    }

    // Generic component holding a non-negative integer.
    pub fn number(num: u64) -> NameComponent {
        let mut value = BytesMut::new();
        tlv::put_nonneg_int(&mut value, num);
        NameComponent::generic(value.freeze())
    }

    pub fn version(num: u64) -> NameComponent {
        let mut value = BytesMut::new();
        tlv::put_nonneg_int(&mut value, num);
        NameComponent {
            tlv_type: TlvType::VersionNameComponent.to_u64().unwrap(),
            value: value.freeze(),
        }
    }

    pub fn segment(num: u64) -> NameComponent {
        let mut value = BytesMut::new();
        tlv::put_nonneg_int(&mut value, num);
        NameComponent {
            tlv_type: TlvType::SegmentNameComponent.to_u64().unwrap(),
            value: value.freeze(),
        }
    }

    // Decodes the component value as a non-negative integer.
    pub fn to_number(&self) -> DecodeResult<u64> {
        let element = TlvElement {
            tlv_type: self.tlv_type,
            value: self.value.clone(),
        };
        element.as_number()
    }

    // Decodes the component value as an embedded wire-encoded name.
    pub fn to_name(&self) -> DecodeResult<Name> {
        let mut buf = self.value.clone();
        Name::decode(&mut buf)
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    fn encode(&self, buf: &mut BytesMut) {
        tlv::put_varnum(buf, self.tlv_type);
        tlv::put_varnum(buf, self.value.len() as u64);
        buf.put_slice(&self.value);
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.value.iter() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_'
                | b'~' => {
                    write!(f, "{}", *byte as char)?;
                }
                _ => {
                    write!(f, "%{:02X}", byte)?;
                }
            }
        }
        Ok(())
    }
}

// ===== impl Name =====

impl Name {
    pub fn new() -> Name {
        Name::default()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn push(&mut self, component: NameComponent) {
        self.components.push(component);
    }

    pub fn append(mut self, component: NameComponent) -> Name {
        self.components.push(component);
        self
    }

    pub fn append_str(self, value: &str) -> Name {
        self.append(NameComponent::generic(value.as_bytes().to_vec()))
    }

    pub fn append_number(self, num: u64) -> Name {
        self.append(NameComponent::number(num))
    }

    pub fn append_version(self, num: u64) -> Name {
        self.append(NameComponent::version(num))
    }

    pub fn append_segment(self, num: u64) -> Name {
        self.append(NameComponent::segment(num))
    }

    // Appends a component wrapping the wire encoding of another name.
    pub fn append_name(self, name: &Name) -> Name {
        self.append(NameComponent::generic(name.to_bytes()))
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    // Component counted from the end of the name (0 is the last one).
    pub fn get_back(&self, index: usize) -> Option<&NameComponent> {
        self.components.len().checked_sub(index + 1).and_then(|i| {
            self.components.get(i)
        })
    }

    // Name formed by `count` components starting at `start`.
    pub fn sub_name(&self, start: usize, count: usize) -> Name {
        Name {
            components: self
                .components
                .iter()
                .skip(start)
                .take(count)
                .cloned()
                .collect(),
        }
    }

    // Name formed by the first `count` components.
    pub fn prefix(&self, count: usize) -> Name {
        Name {
            components: self
                .components
                .iter()
                .take(count)
                .cloned()
                .collect(),
        }
    }

    pub fn starts_with(&self, other: &Name) -> bool {
        self.components.len() >= other.components.len()
            && self.components[..other.components.len()] == other.components[..]
    }

    // Position of the first component whose value equals the given string.
    pub fn position_of(&self, value: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|component| component.value.as_ref() == value.as_bytes())
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        let mut value = BytesMut::new();
        for component in &self.components {
            component.encode(&mut value);
        }
        tlv::put_block(buf, TlvType::Name, &value);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    // Decodes a wire-encoded name from the front of the buffer.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Name> {
        let element = TlvElement::decode(buf)?;
        Name::decode_element(&element)
    }

    // Decodes a name from an already-parsed TLV element.
    pub fn decode_element(element: &TlvElement) -> DecodeResult<Name> {
        element.expect_type(TlvType::Name)?;
        Name::decode_value(element.value.clone())
    }

    fn decode_value(mut value: Bytes) -> DecodeResult<Name> {
        let mut components = vec![];
        while !value.is_empty() {
            let element = TlvElement::decode(&mut value)?;
            match TlvType::from_u64(element.tlv_type) {
                Some(
                    TlvType::GenericNameComponent
                    | TlvType::SegmentNameComponent
                    | TlvType::VersionNameComponent,
                ) => {
                    components.push(NameComponent {
                        tlv_type: element.tlv_type,
                        value: element.value,
                    });
                }
                _ => {
                    return Err(DecodeError::UnexpectedType {
                        expected: TlvType::GenericNameComponent
                            .to_u64()
                            .unwrap(),
                        actual: element.tlv_type,
                    });
                }
            }
        }
        Ok(Name { components })
    }
}

impl From<&str> for Name {
    fn from(uri: &str) -> Name {
        Name {
            components: uri
                .split('/')
                .filter(|label| !label.is_empty())
                .map(|label| NameComponent::generic(label.as_bytes().to_vec()))
                .collect(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}
