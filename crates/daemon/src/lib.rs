// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Household bell daemon (belld) library: configuration, wire protocol and
//! request handling shared by the daemon binary and the CLI

pub mod config;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use config::{Config, ConfigError};
pub use protocol::{Request, Response};
