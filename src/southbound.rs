//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

use crate::name::Name;

// Forwarding strategy requested for the LSA namespace.
pub const MULTICAST_STRATEGY: &str = "/localhost/nfd/strategy/multicast";

// Abstract forwarder management commands. A forwarder client outside the
// core turns these into the concrete management RPC.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum ForwarderCmd {
    RibInstall {
        prefix: Name,
        face_uri: String,
        cost: f64,
    },
    RibUpdate {
        prefix: Name,
        face_uri: String,
        cost: f64,
    },
    RibRemove {
        prefix: Name,
        face_uri: String,
    },
    FaceDestroy {
        face_uri: String,
    },
    SetStrategy {
        prefix: Name,
        strategy: String,
    },
}

// Forwarder command transmission.
pub(crate) mod tx {
    use tokio::sync::mpsc::UnboundedSender;

    use super::ForwarderCmd;
    use crate::name::Name;

    pub(crate) fn rib_install(
        sb_tx: &UnboundedSender<ForwarderCmd>,
        prefix: &Name,
        face_uri: &str,
        cost: f64,
    ) {
        let _ = sb_tx.send(ForwarderCmd::RibInstall {
            prefix: prefix.clone(),
            face_uri: face_uri.to_owned(),
            cost,
        });
    }

    pub(crate) fn rib_update(
        sb_tx: &UnboundedSender<ForwarderCmd>,
        prefix: &Name,
        face_uri: &str,
        cost: f64,
    ) {
        let _ = sb_tx.send(ForwarderCmd::RibUpdate {
            prefix: prefix.clone(),
            face_uri: face_uri.to_owned(),
            cost,
        });
    }

    pub(crate) fn rib_remove(
        sb_tx: &UnboundedSender<ForwarderCmd>,
        prefix: &Name,
        face_uri: &str,
    ) {
        let _ = sb_tx.send(ForwarderCmd::RibRemove {
            prefix: prefix.clone(),
            face_uri: face_uri.to_owned(),
        });
    }

    // Returns whether the command could be handed to the forwarder client.
    pub(crate) fn face_destroy(
        sb_tx: &UnboundedSender<ForwarderCmd>,
        face_uri: &str,
    ) -> bool {
        sb_tx
            .send(ForwarderCmd::FaceDestroy {
                face_uri: face_uri.to_owned(),
            })
            .is_ok()
    }

    pub(crate) fn set_strategy(
        sb_tx: &UnboundedSender<ForwarderCmd>,
        prefix: &Name,
        strategy: &str,
    ) {
        let _ = sb_tx.send(ForwarderCmd::SetStrategy {
            prefix: prefix.clone(),
            strategy: strategy.to_owned(),
        });
    }
}
