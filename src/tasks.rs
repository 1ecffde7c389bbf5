//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::Instant;
use tokio::{task, time};
use tracing::Instrument;

use crate::name::Name;
use crate::packet::lsa::LsaKey;
use crate::tasks::messages::input::{
    AdjLsaBuildMsg, DvTickMsg, FibRefreshMsg, HelloTickMsg, LsaExpiryMsg,
    ProtocolMsg, RoutingCalcMsg,
};

//
// Task diagram:
//
//                                      +--------------+
//                          face (Nx) -> |              | -> (Nx) face
//           first_hello_timer (1x) ->  |              |
//              hello_interval (1x) ->  |              |
//                 dv_interval (1x) ->  |   instance   | -> (Nx) forwarder
//          adj_lsa_build_timer (1x) -> |              |
//            lsa_expiry_timer (Nx) ->  |              |
//           routing_calc_timer (1x) -> |              |
//            fib_refresh_timer (Nx) -> |              |
//                                      +--------------+
//

// Inter-task message types.
pub mod messages {
    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;
    pub type ProtocolOutputMsg = output::NetTxMsg;

    // Input messages (child task or face -> main task).
    pub mod input {
        use serde::{Deserialize, Serialize};

        use crate::name::Name;
        use crate::network::{Data, Interest};
        use crate::packet::lsa::LsaKey;

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub enum ProtocolMsg {
            NetRx(NetRxMsg),
            HelloTick(HelloTickMsg),
            DvTick(DvTickMsg),
            AdjLsaBuild(AdjLsaBuildMsg),
            LsaExpiry(LsaExpiryMsg),
            RoutingCalc(RoutingCalcMsg),
            FibRefresh(FibRefreshMsg),
        }

        // Events delivered by the face: packets, interest timeouts and
        // face lifecycle notifications.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub enum NetRxMsg {
            Interest(Interest),
            Data(Data),
            Nack { name: Name, reason: String },
            Timeout { name: Name },
            FaceDestroyed { face_id: u64 },
        }

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct HelloTickMsg {}

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct DvTickMsg {}

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct AdjLsaBuildMsg {}

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct LsaExpiryMsg {
            pub key: LsaKey,
        }

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct RoutingCalcMsg {}

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct FibRefreshMsg {
            pub prefix: Name,
        }
    }

    // Output messages (main task -> face task).
    pub mod output {
        use serde::{Deserialize, Serialize};

        use crate::name::Name;
        use crate::network::{Data, Interest};

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub enum NetTxMsg {
            Interest(Interest),
            Data(Data),
            RegisterPrefix { prefix: Name },
        }
    }
}

/// A handle which can be used to manipulate the task created by
/// [`Task::spawn`]. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct Task<T> {
    join_handle: task::JoinHandle<T>,
}

/// A handle for a one-shot timer task created by [`TimeoutTask::new`].
///
/// Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct TimeoutTask {
    _task: Task<()>,
    control: UnboundedSender<TimerMessage>,
}

/// A handle for a periodic timer task created by [`IntervalTask::new`].
///
/// Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct IntervalTask {
    _task: Task<()>,
}

#[derive(Debug)]
enum TimerMessage {
    Reset(Option<Duration>),
}

// ===== impl Task =====

impl<T> Task<T> {
    /// Spawns a new asynchronous task, returning a handle for it.
    pub fn spawn<Fut>(future: Fut) -> Task<T>
    where
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Task {
            join_handle: task::spawn(future.in_current_span()),
        }
    }
}

impl<T> Drop for Task<T> {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

// ===== impl TimeoutTask =====

impl TimeoutTask {
    /// Spawns a task that calls the provided async closure when the timeout
    /// expires.
    pub fn new<F, Fut>(timeout: Duration, cb: F) -> TimeoutTask
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (control_tx, mut control_rx) = mpsc::unbounded_channel();

        let task = Task::spawn(async move {
            let timeout_fut = time::sleep(timeout);
            tokio::pin!(timeout_fut);

            loop {
                tokio::select! {
                    // Timeout has expired.
                    _ = &mut timeout_fut => {
                        (cb)().await;
                        break;
                    }
                    message = control_rx.recv() => {
                        match message {
                            // Timeout has been refreshed/updated.
                            Some(TimerMessage::Reset(new_timeout)) => {
                                let next = Instant::now()
                                    + new_timeout.unwrap_or(timeout);
                                timeout_fut.as_mut().reset(next);
                            }
                            // Timeout has been aborted.
                            None => break,
                        }
                    }
                }
            }
        });

        TimeoutTask {
            _task: task,
            control: control_tx,
        }
    }

    /// Resets the timeout, regardless if it has already expired or not.
    ///
    /// If a new timeout value isn't specified, the last value is reused.
    pub fn reset(&mut self, timeout: Option<Duration>) {
        let _ = self.control.send(TimerMessage::Reset(timeout));
    }
}

// ===== impl IntervalTask =====

impl IntervalTask {
    /// Spawns a task that calls the provided async closure on every tick of
    /// the interval timer.
    pub fn new<F, Fut>(
        interval: Duration,
        tick_on_start: bool,
        mut cb: F,
    ) -> IntervalTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let task = Task::spawn(async move {
            let mut interval_fut = if tick_on_start {
                time::interval(interval)
            } else {
                time::interval_at(Instant::now() + interval, interval)
            };

            loop {
                interval_fut.tick().await;
                (cb)().await;
            }
        });

        IntervalTask { _task: task }
    }
}

// ===== protocol timer tasks =====

// First-hello delay before the periodic hello rounds start.
pub(crate) fn first_hello_timer(
    timeout: Duration,
    proto_tx: &UnboundedSender<ProtocolMsg>,
) -> TimeoutTask {
    let proto_tx = proto_tx.clone();
    TimeoutTask::new(timeout, move || async move {
        let _ = proto_tx.send(ProtocolMsg::HelloTick(HelloTickMsg {}));
    })
}

// Periodic hello round.
pub(crate) fn hello_interval(
    interval: Duration,
    proto_tx: &UnboundedSender<ProtocolMsg>,
) -> IntervalTask {
    let proto_tx = proto_tx.clone();
    IntervalTask::new(interval, false, move || {
        let proto_tx = proto_tx.clone();
        async move {
            let _ = proto_tx.send(ProtocolMsg::HelloTick(HelloTickMsg {}));
        }
    })
}

// Periodic distance-vector round.
pub(crate) fn dv_interval(
    interval: Duration,
    proto_tx: &UnboundedSender<ProtocolMsg>,
) -> IntervalTask {
    let proto_tx = proto_tx.clone();
    IntervalTask::new(interval, false, move || {
        let proto_tx = proto_tx.clone();
        async move {
            let _ = proto_tx.send(ProtocolMsg::DvTick(DvTickMsg {}));
        }
    })
}

// Debounced rebuild of the own adjacency LSA.
pub(crate) fn adj_lsa_build_timer(
    timeout: Duration,
    proto_tx: &UnboundedSender<ProtocolMsg>,
) -> TimeoutTask {
    let proto_tx = proto_tx.clone();
    TimeoutTask::new(timeout, move || async move {
        let _ = proto_tx.send(ProtocolMsg::AdjLsaBuild(AdjLsaBuildMsg {}));
    })
}

// Triggered when an LSA reaches its expiration timepoint.
pub(crate) fn lsa_expiry_timer(
    key: LsaKey,
    timeout: Duration,
    proto_tx: &UnboundedSender<ProtocolMsg>,
) -> TimeoutTask {
    let proto_tx = proto_tx.clone();
    TimeoutTask::new(timeout, move || async move {
        let _ = proto_tx.send(ProtocolMsg::LsaExpiry(LsaExpiryMsg { key }));
    })
}

// Debounced routing recomputation.
pub(crate) fn routing_calc_timer(
    timeout: Duration,
    proto_tx: &UnboundedSender<ProtocolMsg>,
) -> TimeoutTask {
    let proto_tx = proto_tx.clone();
    TimeoutTask::new(timeout, move || async move {
        let _ = proto_tx.send(ProtocolMsg::RoutingCalc(RoutingCalcMsg {}));
    })
}

// Periodic re-registration of an installed FIB entry.
pub(crate) fn fib_refresh_timer(
    prefix: Name,
    timeout: Duration,
    proto_tx: &UnboundedSender<ProtocolMsg>,
) -> TimeoutTask {
    let proto_tx = proto_tx.clone();
    TimeoutTask::new(timeout, move || async move {
        let _ = proto_tx.send(ProtocolMsg::FibRefresh(FibRefreshMsg { prefix }));
    })
}
