//! Common types and utilities for uecore
//!
//! This crate provides the shared types, configuration structures and
//! logging helpers used across the uecore UE authentication crates.

pub mod config;
pub mod logging;
pub mod octets;
pub mod types;

pub use config::{ConfigError, OpType, UeConfig};
pub use logging::{format_hex_compact, init_logging, LogLevel};
pub use types::{Guti5g, Plmn, Supi, SupiType, Tai};
