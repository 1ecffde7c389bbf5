//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_traits::ToPrimitive;

use crate::packet::consts::TlvType;
use crate::packet::error::{DecodeError, DecodeResult};

// A single decoded TLV element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlvElement {
    pub tlv_type: u64,
    pub value: Bytes,
}

// ===== impl TlvElement =====

impl TlvElement {
    // Decodes one element from the front of the buffer.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<TlvElement> {
        let tlv_type = get_varnum(buf)?;
        let length = get_varnum(buf)? as usize;
        if buf.remaining() < length {
            return Err(DecodeError::ReadOutOfBounds);
        }
        let value = buf.copy_to_bytes(length);
        Ok(TlvElement { tlv_type, value })
    }

    pub fn is_type(&self, tlv_type: TlvType) -> bool {
        self.tlv_type == tlv_type.to_u64().unwrap()
    }

    pub fn expect_type(&self, tlv_type: TlvType) -> DecodeResult<()> {
        if !self.is_type(tlv_type) {
            return Err(DecodeError::UnexpectedType {
                expected: tlv_type.to_u64().unwrap(),
                actual: self.tlv_type,
            });
        }
        Ok(())
    }

    // Interprets the value as a non-negative integer (1, 2, 4 or 8 octets).
    pub fn as_number(&self) -> DecodeResult<u64> {
        let mut value = self.value.clone();
        match value.len() {
            1 => Ok(value.get_u8() as u64),
            2 => Ok(value.get_u16() as u64),
            4 => Ok(value.get_u32() as u64),
            8 => Ok(value.get_u64()),
            len => Err(DecodeError::InvalidNumberLength(len)),
        }
    }

    // Interprets the value as an IEEE-754 double in network byte order.
    pub fn as_double(&self) -> DecodeResult<f64> {
        let mut value = self.value.clone();
        match value.len() {
            8 => Ok(value.get_f64()),
            len => Err(DecodeError::InvalidDoubleLength(len)),
        }
    }

    pub fn as_string(&self) -> DecodeResult<String> {
        std::str::from_utf8(&self.value)
            .map(|s| s.to_owned())
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}

// ===== global functions =====

// Encodes an NDN variable-length number (1, 3, 5 or 9 octets).
pub fn put_varnum(buf: &mut BytesMut, num: u64) {
    match num {
        0..=252 => buf.put_u8(num as u8),
        253..=0xffff => {
            buf.put_u8(253);
            buf.put_u16(num as u16);
        }
        0x1_0000..=0xffff_ffff => {
            buf.put_u8(254);
            buf.put_u32(num as u32);
        }
        _ => {
            buf.put_u8(255);
            buf.put_u64(num);
        }
    }
}

// Decodes an NDN variable-length number.
pub fn get_varnum(buf: &mut Bytes) -> DecodeResult<u64> {
    let first = buf.try_get_u8()?;
    match first {
        0..=252 => Ok(first as u64),
        253 => Ok(buf.try_get_u16()? as u64),
        254 => Ok(buf.try_get_u32()? as u64),
        255 => Ok(buf.try_get_u64()?),
    }
}

// Writes a complete TLV block.
pub fn put_block(buf: &mut BytesMut, tlv_type: TlvType, value: &[u8]) {
    put_varnum(buf, tlv_type.to_u64().unwrap());
    put_varnum(buf, value.len() as u64);
    buf.put_slice(value);
}

// Writes the shortest non-negative integer encoding of the value.
pub fn put_nonneg_int(buf: &mut BytesMut, num: u64) {
    if num <= 0xff {
        buf.put_u8(num as u8);
    } else if num <= 0xffff {
        buf.put_u16(num as u16);
    } else if num <= 0xffff_ffff {
        buf.put_u32(num as u32);
    } else {
        buf.put_u64(num);
    }
}

// Writes a TLV block holding a non-negative integer.
pub fn put_number_block(buf: &mut BytesMut, tlv_type: TlvType, num: u64) {
    let mut value = BytesMut::new();
    put_nonneg_int(&mut value, num);
    put_block(buf, tlv_type, &value);
}

// Writes a TLV block holding a double in network byte order.
pub fn put_double_block(buf: &mut BytesMut, tlv_type: TlvType, value: f64) {
    let mut bytes = BytesMut::with_capacity(8);
    bytes.put_f64(value);
    put_block(buf, tlv_type, &bytes);
}

// Writes a TLV block holding a UTF-8 string.
pub fn put_string_block(buf: &mut BytesMut, tlv_type: TlvType, value: &str) {
    put_block(buf, tlv_type, value.as_bytes());
}
