//! Flutter bridge for DevGate core.

pub mod api;
