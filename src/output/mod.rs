//! Output module for results files and reports
//!
//! This module handles:
//! - Appending UTF-8 CSV rows
//! - Laying out the per-run results directory
//! - Aggregating a results directory into failure statistics

mod aggregate;
mod results_dir;
pub mod stats;
mod writer;

pub use aggregate::aggregate;
pub use results_dir::{
    folder_name, FailedResourceRow, PackageSummaryRow, ResultsDir, FAILED_DOMAIN_COUNT_CSV,
    FAILED_PACKAGES_CSV, FAILED_RESOURCES_CSV, PACKAGES_CSV, PACKAGES_CSV_HEADER,
    PACKAGES_JSON_DIR, PACKAGE_LIST_FILE, STATISTICS_FILE,
};
pub use stats::{print_statistics, DomainCount, RunStatistics};
pub use writer::append_row;
