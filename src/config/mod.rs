//! Configuration module for the link checker
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ckan_link_checker::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("checker.toml")).unwrap();
//! println!("HTTP timeout: {}s", config.checker.http_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CheckerConfig, Config, OutputConfig, UnknownSchemePolicy, UserAgentConfig};

// Re-export parser functions
pub use parser::{config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
