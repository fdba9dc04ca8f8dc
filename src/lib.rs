// ABOUTME: Library root for ecrbuildpush - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod reconcile;
pub mod registry;
pub mod runtime;
pub mod store;
pub mod types;
