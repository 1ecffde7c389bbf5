//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{error, warn};

use crate::name::Name;
use crate::packet::error::DecodeError;

// Protocol errors.
//
// Protocol errors are recovered locally: the offending packet is dropped
// and never retried. Local I/O errors are logged and the in-memory state
// keeps going. Only prefix registration failure at startup is fatal.
#[derive(Debug)]
pub enum Error {
    InvalidEncoding(DecodeError),
    UnknownNeighbor(Name),
    ValidationFailed(Name),
    PrefixRegistrationFailed(Name),
    FaceDestroyFailed(String),
    PersistenceFailed(std::io::Error),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::InvalidEncoding(error) => {
                error.log();
            }
            Error::UnknownNeighbor(name) => {
                warn!(neighbor = %name, "{}", self);
            }
            Error::ValidationFailed(name) => {
                warn!(name = %name, "{}", self);
            }
            Error::PrefixRegistrationFailed(name) => {
                error!(prefix = %name, "{}", self);
            }
            Error::FaceDestroyFailed(face_uri) => {
                warn!(%face_uri, "{}", self);
            }
            Error::PersistenceFailed(error) => {
                warn!(error = %error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidEncoding(error) => error.fmt(f),
            Error::UnknownNeighbor(..) => {
                write!(f, "DV interest from non-adjacent router")
            }
            Error::ValidationFailed(..) => {
                write!(f, "data packet failed validation")
            }
            Error::PrefixRegistrationFailed(..) => {
                write!(f, "failed to register prefix")
            }
            Error::FaceDestroyFailed(..) => {
                write!(f, "failed to destroy face")
            }
            Error::PersistenceFailed(..) => {
                write!(f, "failed to write sequence number file")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidEncoding(error) => Some(error),
            Error::PersistenceFailed(error) => Some(error),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Error {
        Error::InvalidEncoding(error)
    }
}
