//! UniFi controller adapter.
//!
//! [`UnifiClient`] speaks the controller's JSON API over a cookie session and
//! implements the [`Inventory`](hostsync_core::inventory::Inventory) port.

pub mod client;
pub mod error;
pub mod models;

pub use client::UnifiClient;
pub use error::ControllerError;
