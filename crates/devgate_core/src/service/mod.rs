//! Core use-case services.
//!
//! # Responsibility
//! - Validate form input before it reaches the record store.
//! - Keep FFI and CLI layers decoupled from storage details.

pub mod profile_service;
