//! # Coverdesk Common Library
//!
//! Shared code for the Coverdesk crates:
//! - Error type shared by all crates
//! - TOML configuration model and configuration file resolution
//! - Standard user-agent string for HTTP clients

pub mod config;
pub mod error;

pub use error::{Error, Result};
