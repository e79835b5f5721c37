//! Settings module for batchform
//!
//! Handles loading settings from TOML files and environment variable overrides.

pub mod settings;

pub use settings::*;
