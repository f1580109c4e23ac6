//! # Remedy Application Library
//!
//! The server, CLI and deployment loading behind the `remedy` binary.
//! Exposed as a library so integration tests can build routers and
//! troubleshooters without spawning the process.

pub mod api;
pub mod cli;
pub mod config;
