//! CKAN link checker: audits the resource links of an open-data catalog
//!
//! This crate walks every dataset published by a CKAN version 3 endpoint,
//! probes each attached resource URL over HTTP(S) or FTP, records the
//! failures as CSV and produces failure statistics per domain and per dataset.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for link checker operations
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog API error: {kind}: {message}")]
    Catalog { kind: String, message: String },

    #[error("Unexpected catalog response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("The supplied URL does not seem to be a CKAN version 3 endpoint: {0}")]
    NotCkanEndpoint(String),
}

/// Errors raised while aggregating a results directory
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("The specified folder does not exist: {0}")]
    MissingFolder(String),

    #[error("Missing input file: {0}")]
    MissingInput(String),

    #[error("Input file contains no data rows: {0}")]
    EmptyInput(String),

    #[error("Cannot compute {0} percentage: total is zero")]
    DivisionByZero(&'static str),

    #[error("Invalid row {line} in {file}: {message}")]
    InvalidRow {
        file: String,
        line: u64,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for link checker operations
pub type Result<T> = std::result::Result<T, CheckerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for aggregation operations
pub type AggregationResult<T> = std::result::Result<T, AggregationError>;

// Re-export commonly used types
pub use catalog::{CkanClient, Package, Resource};
pub use config::Config;
pub use crawler::{Coordinator, ProbeOutcome, RunSummary};
pub use output::{aggregate, RunStatistics};
