//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(dead_code)]

use bytes::Bytes;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use midst::config::{Config, NeighborCfg, SigningInfo};
use midst::instance::Instance;
use midst::name::Name;
use midst::network::{Data, Interest};
use midst::southbound::ForwarderCmd;
use midst::tasks::messages::input::{NetRxMsg, ProtocolMsg};
use midst::tasks::messages::output::NetTxMsg;

// All test routers share one network key so signed packets validate
// everywhere.
pub const TEST_KEY: &[u8] = b"midst-test-key";

// An instance wired to captive face and forwarder channels.
pub struct TestRouter {
    pub instance: Instance,
    pub net_rx: UnboundedReceiver<NetTxMsg>,
    pub sb_rx: UnboundedReceiver<ForwarderCmd>,
    _seq_dir: TempDir,
}

pub fn new_router(
    router: &str,
    neighbors: &[(&str, &str, f64)],
    configure: impl FnOnce(&mut Config),
) -> TestRouter {
    let seq_dir = tempfile::tempdir().unwrap();
    let signing = SigningInfo {
        signer: Name::from(router),
        key: Bytes::from_static(TEST_KEY),
    };

    let mut config = Config::new(Name::from(router), signing);
    config.seq_file_dir = seq_dir.path().to_path_buf();
    config.neighbors = neighbors
        .iter()
        .map(|(name, face_uri, link_cost)| NeighborCfg {
            name: Name::from(*name),
            face_uri: (*face_uri).to_owned(),
            link_cost: *link_cost,
        })
        .collect();
    configure(&mut config);

    let (net_tx, net_rx) = mpsc::unbounded_channel();
    let (sb_tx, sb_rx) = mpsc::unbounded_channel();
    let instance = Instance::new(config, net_tx, sb_tx);

    TestRouter {
        instance,
        net_rx,
        sb_rx,
        _seq_dir: seq_dir,
    }
}

impl TestRouter {
    pub fn feed_interest(&mut self, interest: Interest) {
        self.instance
            .process_message(ProtocolMsg::NetRx(NetRxMsg::Interest(interest)));
    }

    pub fn feed_data(&mut self, data: Data) {
        self.instance
            .process_message(ProtocolMsg::NetRx(NetRxMsg::Data(data)));
    }

    pub fn feed_timeout(&mut self, name: Name) {
        self.instance
            .process_message(ProtocolMsg::NetRx(NetRxMsg::Timeout { name }));
    }

    pub fn drain_net(&mut self) -> Vec<NetTxMsg> {
        let mut msgs = vec![];
        while let Ok(msg) = self.net_rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    pub fn drain_sb(&mut self) -> Vec<ForwarderCmd> {
        let mut cmds = vec![];
        while let Ok(cmd) = self.sb_rx.try_recv() {
            cmds.push(cmd);
        }
        cmds
    }
}

// Filters the captured face output down to interests.
pub fn interests(msgs: &[NetTxMsg]) -> Vec<&Interest> {
    msgs.iter()
        .filter_map(|msg| match msg {
            NetTxMsg::Interest(interest) => Some(interest),
            _ => None,
        })
        .collect()
}

// Filters the captured face output down to data packets.
pub fn datas(msgs: &[NetTxMsg]) -> Vec<&Data> {
    msgs.iter()
        .filter_map(|msg| match msg {
            NetTxMsg::Data(data) => Some(data),
            _ => None,
        })
        .collect()
}
