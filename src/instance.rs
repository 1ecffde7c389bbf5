//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

use crate::adjacency::{AdjacencyStatus, AdjacencyTable};
use crate::config::{Config, HyperbolicState, MidstState};
use crate::debug::Debug;
use crate::dv::ProcessedNeighbors;
use crate::error::Error;
use crate::fib::Fib;
use crate::lsdb::{self, Lsdb};
use crate::name::Name;
use crate::route::{NexthopList, RoutingTable};
use crate::seqno::SequencingManager;
use crate::southbound::ForwarderCmd;
use crate::tasks::messages::input::ProtocolMsg;
use crate::tasks::messages::output::NetTxMsg;
use crate::tasks::{IntervalTask, TimeoutTask};
use crate::{events, fib, southbound, tasks};

// Senders towards the instance, the face and the forwarder client.
#[derive(Clone, Debug)]
pub struct InstanceChannelsTx {
    pub protocol_input: UnboundedSender<ProtocolMsg>,
    pub net_tx: UnboundedSender<NetTxMsg>,
    pub southbound: UnboundedSender<ForwarderCmd>,
}

// Instance state data. All of it is owned and mutated by the main event
// loop only; child tasks communicate exclusively through messages.
#[derive(Debug)]
pub struct InstanceState {
    // Link-State Database.
    pub lsdb: Lsdb,
    // Neighbor table.
    pub adjacencies: AdjacencyTable,
    // Sequence number counters.
    pub seqno: SequencingManager,
    // Distance-vector processed-neighbors vector.
    pub processed_neighbors: ProcessedNeighbors,
    // Last computed routing table.
    pub routing_table: RoutingTable,
    // Name-prefix table projected from the routing table.
    pub prefix_table: BTreeMap<Name, NexthopList>,
    // Forwarder shadow state.
    pub fib: Fib,
    // Protocol timers.
    pub first_hello_timer: Option<TimeoutTask>,
    pub hello_interval_task: Option<IntervalTask>,
    pub dv_round_task: Option<IntervalTask>,
    pub adj_lsa_build_timer: Option<TimeoutTask>,
    pub routing_calc_timer: Option<TimeoutTask>,
}

#[derive(Debug)]
pub struct Instance {
    pub config: Config,
    pub state: InstanceState,
    pub tx: InstanceChannelsTx,
    rx: Option<UnboundedReceiver<ProtocolMsg>>,
}

// ===== impl Instance =====

impl Instance {
    // Builds an instance wired to the given face and forwarder channels.
    // Components are constructed in dependency order from the configuration
    // record alone.
    pub fn new(
        config: Config,
        net_tx: UnboundedSender<NetTxMsg>,
        southbound: UnboundedSender<ForwarderCmd>,
    ) -> Instance {
        let (protocol_input, rx) = mpsc::unbounded_channel();

        let state = InstanceState {
            lsdb: Lsdb::default(),
            adjacencies: AdjacencyTable::from_config(&config),
            seqno: SequencingManager::new(&config.seq_file_dir),
            processed_neighbors: ProcessedNeighbors::default(),
            routing_table: RoutingTable::default(),
            prefix_table: BTreeMap::new(),
            fib: Fib::default(),
            first_hello_timer: None,
            hello_interval_task: None,
            dv_round_task: None,
            adj_lsa_build_timer: None,
            routing_calc_timer: None,
        };

        Instance {
            config,
            state,
            tx: InstanceChannelsTx {
                protocol_input,
                net_tx,
                southbound,
            },
            rx: Some(rx),
        }
    }

    // Sender the face task uses to deliver packets and events.
    pub fn input(&self) -> UnboundedSender<ProtocolMsg> {
        self.tx.protocol_input.clone()
    }

    // Brings the instance up: recovers sequence numbers, registers the
    // protocol prefixes, originates the own LSAs and arms the protocol
    // timers. Prefix registration failure here is fatal.
    pub fn start(&mut self) -> Result<(), Error> {
        Debug::InstanceStart.log();

        // Hyperbolic routing forces direct neighbor costs to zero.
        if self.config.hyperbolic_state == HyperbolicState::On {
            for adjacency in self.state.adjacencies.iter_mut() {
                adjacency.link_cost = 0.0;
            }
        }

        self.state
            .seqno
            .initiate(self.config.hyperbolic_state, self.config.midst_state);

        for prefix in
            [&self.config.router_prefix, &self.config.lsa_prefix]
        {
            self.tx
                .net_tx
                .send(NetTxMsg::RegisterPrefix {
                    prefix: prefix.clone(),
                })
                .map_err(|_| {
                    Error::PrefixRegistrationFailed(prefix.clone())
                })?;
        }
        lsdb::request_lsa_strategy(self);

        lsdb::build_and_install_own_name_lsa(self);
        if self.config.hyperbolic_state != HyperbolicState::Off {
            lsdb::build_and_install_own_cor_lsa(self);
        }
        if self.config.midst_state != MidstState::Off {
            lsdb::build_and_install_own_midst_lsa(self);
        }

        self.state.first_hello_timer = Some(tasks::first_hello_timer(
            self.config.first_hello_interval,
            &self.tx.protocol_input,
        ));
        if self.config.midst_state == MidstState::On {
            self.state.dv_round_task = Some(tasks::dv_interval(
                self.config.dv_round_interval,
                &self.tx.protocol_input,
            ));
        }

        Ok(())
    }

    // Main event loop. Runs until the shutdown signal fires, then tears
    // the instance down. All state mutation happens here, one message at a
    // time, in arrival order.
    pub async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        break;
                    };
                    if let Err(error) =
                        events::process_protocol_msg(&mut self, msg)
                    {
                        error.log();
                    }
                }
                _ = &mut shutdown_rx => {
                    break;
                }
            }
        }
        self.shutdown();
    }

    // Processes one input message synchronously. Errors are logged, never
    // propagated.
    pub fn process_message(&mut self, msg: ProtocolMsg) {
        if let Err(error) = events::process_protocol_msg(self, msg) {
            error.log();
        }
    }

    // Uninstalls the projected FIB state and destroys the neighbor faces.
    fn shutdown(&mut self) {
        Debug::InstanceStop.log();
        fib::clear(self);

        let face_uris = self
            .state
            .adjacencies
            .iter()
            .map(|adjacency| adjacency.face_uri.clone())
            .collect::<Vec<_>>();
        for face_uri in face_uris {
            if !southbound::tx::face_destroy(&self.tx.southbound, &face_uri) {
                Error::FaceDestroyFailed(face_uri.clone()).log();
            }
        }
        for adjacency in self.state.adjacencies.iter_mut() {
            adjacency.set_status(AdjacencyStatus::Inactive);
        }
    }
}
