//! `termplan-worker` library crate.
//!
//! Re-exports the job and configuration modules for integration testing.
//! The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod job;
