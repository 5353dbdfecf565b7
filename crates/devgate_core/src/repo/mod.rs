//! Record store abstractions and the SQLite implementation.
//!
//! # Responsibility
//! - Define the gateway contracts the feed and profile services depend on.
//! - Isolate SQLite query details from aggregation and validation logic.
//!
//! # Invariants
//! - Store APIs return semantic errors (`UserNotFound`, `UsernameTaken`) in
//!   addition to transport errors.

pub mod record_store;
pub mod sqlite_store;
