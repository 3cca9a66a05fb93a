//! Sentinel Configuration Module
//!
//! Loaded once in `main()` and passed to the constructors that need it.
//! There is no process-wide config global: stages and collaborators receive
//! their section explicitly so tests can build pipelines side by side.
//!
//! ## Loading Order
//!
//! 1. `SENTINEL_CONFIG` environment variable (path to TOML file)
//! 2. `sentinel.toml` in the current working directory
//! 3. Built-in defaults (the reference scenario)

mod sentinel_config;
pub mod defaults;

pub use sentinel_config::*;
