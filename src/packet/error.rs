//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::TryGetError;
use tracing::warn;

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// Wire decoding errors.
//
// Every variant maps to the `InvalidEncoding` failure class: the offending
// block is logged and discarded, never retried.
#[derive(Debug, Eq, PartialEq)]
pub enum DecodeError {
    ReadOutOfBounds,
    InvalidVarNumber,
    UnexpectedType { expected: u64, actual: u64 },
    UnknownTopLevelType(u64),
    MissingField(&'static str),
    InvalidNumberLength(usize),
    InvalidDoubleLength(usize),
    InvalidTimestamp(u64),
    InvalidUtf8,
}

// ===== impl DecodeError =====

impl DecodeError {
    pub(crate) fn log(&self) {
        match self {
            DecodeError::UnexpectedType { expected, actual } => {
                warn!(%expected, %actual, "{}", self);
            }
            DecodeError::UnknownTopLevelType(tlv_type) => {
                warn!(%tlv_type, "{}", self);
            }
            DecodeError::MissingField(field) => {
                warn!(%field, "{}", self);
            }
            DecodeError::InvalidNumberLength(len)
            | DecodeError::InvalidDoubleLength(len) => {
                warn!(%len, "{}", self);
            }
            DecodeError::InvalidTimestamp(millis) => {
                warn!(%millis, "{}", self);
            }
            _ => {
                warn!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            DecodeError::InvalidVarNumber => {
                write!(f, "invalid TLV variable-length number")
            }
            DecodeError::UnexpectedType { .. } => {
                write!(f, "unexpected TLV type")
            }
            DecodeError::UnknownTopLevelType(..) => {
                write!(f, "unknown top-level TLV type")
            }
            DecodeError::MissingField(..) => {
                write!(f, "missing required field")
            }
            DecodeError::InvalidNumberLength(..) => {
                write!(f, "invalid non-negative integer length")
            }
            DecodeError::InvalidDoubleLength(..) => {
                write!(f, "invalid double-precision value length")
            }
            DecodeError::InvalidTimestamp(..) => {
                write!(f, "expiration timepoint out of range")
            }
            DecodeError::InvalidUtf8 => {
                write!(f, "invalid UTF-8 string")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(_error: TryGetError) -> DecodeError {
        DecodeError::ReadOutOfBounds
    }
}
