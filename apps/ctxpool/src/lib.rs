//! # ctxpool
//!
//! Host-side tooling for the context broker: configuration loading and the
//! CLI commands. Exposed as a library so the integration tests can drive the
//! commands without spawning the binary.

pub mod cli;
pub mod config;
