//! Shared domain types, error taxonomy, and pure generation-policy
//! functions used across the Atelier workspace.
//!
//! This crate has no I/O. Everything here is callable from both the API
//! server and the polling client without pulling in a runtime.

pub mod error;
pub mod generation;
pub mod prompt;
pub mod types;
