//
// Copyright (c) The Midst Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod adjacency;
pub mod config;
pub mod debug;
pub mod dv;
pub mod error;
pub mod events;
pub mod fib;
pub mod hello;
pub mod instance;
pub mod lsdb;
pub mod name;
pub mod network;
pub mod packet;
pub mod route;
pub mod seqno;
pub mod southbound;
pub mod spf;
pub mod tasks;
