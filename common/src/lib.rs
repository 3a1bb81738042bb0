//! Shared types for the hostsync workspace: the entry model the reconciliation
//! engine works on, the raw inventory tuples the controller reports, and the
//! configuration file.

pub mod config;
pub mod network;
