//! UVO backend integration
//!
//! HTTP implementation of [`VehicleClient`](crate::vehicle::VehicleClient)
//! against the UVO API gateway.

pub mod client;
pub mod types;

pub use client::UvoHttpClient;

/// Header carrying the session id returned by login
pub const SESSION_HEADER: &str = "sid";

/// Login endpoint, relative to the configured base URL
pub const LOGIN_PATH: &str = "/prof/authUser";

/// Vehicle list endpoint, relative to the configured base URL
pub const VEHICLE_LIST_PATH: &str = "/ownr/gvl";
