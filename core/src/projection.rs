//! # Output Projection
//!
//! Read-only views over a reconciled result set. Only entries whose
//! disposition is `Kept` are ever projected.
//!
//! - [`hosts_file`] renders the classic `/etc/hosts` text.
//! - [`records`] diffs the result against PowerDNS-style records held by a
//!   [`records::RecordStore`].

pub mod hosts_file;
pub mod records;
