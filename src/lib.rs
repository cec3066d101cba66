//! # kia-uvo - Kia UVO vehicle status poller
//!
//! Polls the Kia UVO telematics backend on a wall-clock aligned schedule,
//! caches the latest vehicle list per account and notifies subscribed
//! adapters (binary sensors) after every successful refresh.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration and validation
//! - `logging`: Structured logging and tracing
//! - `vehicle`: Vehicle snapshot model and the remote client trait
//! - `uvo`: HTTP client for the UVO API
//! - `account`: One account, its session handle and its update listeners
//! - `registry`: The fixed set of configured accounts
//! - `schedule`: Aligned refresh schedule and ticker
//! - `service`: Refresh loop and the `update_state` command
//! - `sensor`: Binary sensor adapters
//! - `bootstrap`: Startup wiring
//! - `web`: HTTP status and command surface

pub mod account;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod schedule;
pub mod sensor;
pub mod service;
pub mod uvo;
pub mod vehicle;
#[cfg(feature = "web")]
pub mod web;


// Re-export commonly used types
pub use account::{Account, UpdateListener};
pub use config::Config;
pub use error::{Result, UvoError};
pub use registry::{Registry, SharedRegistry};
