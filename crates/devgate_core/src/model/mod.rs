//! Domain model for users, category items and feed entries.
//!
//! # Responsibility
//! - Define the canonical records read from per-user partitions.
//! - Define the transient feed entry shape produced by aggregation.
//!
//! # Invariants
//! - Users are identified by a unique `username`.
//! - Sentinel placeholder documents never become domain records.

pub mod activity;
pub mod user;
