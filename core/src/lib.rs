//! # Hostsync Core
//!
//! The reconciliation engine. Pure Rust, no network or disk IO of its own.
//!
//! ## Layout
//! * **[`pipeline`]**: Merges live observations, static hosts and the previous
//!   result into the next result set.
//!     * *Center of the Hexagon*.
//! * **[`filters`]**: The conflict and policy passes the pipeline runs, in order.
//! * **[`qualifier`]**: Expands short names into fully qualified names.
//! * **[`projection`]**: Hosts text and record diffs built from a result set.
//! * **[`inventory`]**, [`projection::hosts_file::HostsSink`],
//!   [`projection::records::RecordStore`]: Ports implemented by the adapter crates.
//!     * *Boundaries of the Hexagon*.
//! * **[`sync`]**: Orchestrates one fetch-reconcile-publish cycle over the ports.
//! * **[`report`]**: Events the engine emits and the observers that receive them.

pub mod filters;
pub mod inventory;
pub mod pipeline;
pub mod projection;
pub mod qualifier;
pub mod report;
pub mod sync;

#[cfg(test)]
mod testutil;
