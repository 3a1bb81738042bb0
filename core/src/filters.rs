//! # Conflict & Policy Filters
//!
//! Independent passes over the candidate set. The merge pipeline runs them in
//! a fixed order:
//!
//! 1. [`mac`]: strip or rewrite names that are really MAC addresses.
//! 2. [`blocklist`]: remove hosts matching a configured block rule.
//! 3. [`exclusivity`]: reserve names of exclusive static hosts.
//! 4. [`duplicates`]: one entry per address, then retire stale names.
//! 5. [`staleness`]: age out entries not seen recently.
//!
//! Passes never skip entries that an earlier pass already removed, so the
//! per-pass counts describe the whole candidate set. Only the projections
//! filter by disposition.

pub mod blocklist;
pub mod duplicates;
pub mod exclusivity;
pub mod mac;
pub mod staleness;
