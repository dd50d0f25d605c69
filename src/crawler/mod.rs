//! Crawler module for walking the catalog and probing links
//!
//! This module contains the core checking logic, including:
//! - HTTP and FTP reachability probes
//! - Per-dataset and per-run counters
//! - Overall run coordination

mod coordinator;
mod ftp;
mod prober;
mod state;

pub use coordinator::{run_check, Coordinator, RunSummary};
pub use ftp::probe_ftp;
pub use prober::{build_http_client, probe_http, ProbeOutcome, Prober};
pub use state::{DatasetTally, RunCounters};
