//! Catalog module: access to the CKAN action API
//!
//! This module contains:
//! - The dataset/resource data model
//! - The API client with endpoint discovery
//! - The retry backoff policy for dataset fetches

mod backoff;
mod client;
mod types;

pub use backoff::{next_delay, AttemptOutcome, Backoff};
pub use client::CkanClient;
pub use types::{error_details, is_version_3_body, DatasetFetch, DatasetList, Package, Resource};
