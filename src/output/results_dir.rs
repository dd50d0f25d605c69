//! The per-run results directory
//!
//! Each run writes into a fresh `results_<host>_<timestamp>` folder:
//!
//! ```text
//! package_list.json
//! packages_json/<dataset>.json
//! packages.csv
//! failed_resources.csv
//! failed_packages.csv
//! failed_domain_count.csv   (aggregator)
//! statistics.txt            (aggregator)
//! ```

use crate::output::writer::append_row;
use crate::CheckerError;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const PACKAGE_LIST_FILE: &str = "package_list.json";
pub const PACKAGES_JSON_DIR: &str = "packages_json";
pub const PACKAGES_CSV: &str = "packages.csv";
pub const FAILED_RESOURCES_CSV: &str = "failed_resources.csv";
pub const FAILED_PACKAGES_CSV: &str = "failed_packages.csv";
pub const FAILED_DOMAIN_COUNT_CSV: &str = "failed_domain_count.csv";
pub const STATISTICS_FILE: &str = "statistics.txt";

pub const PACKAGES_CSV_HEADER: [&str; 5] =
    ["ok_resources", "num_resources", "id", "name", "maintainer"];

/// One line of `packages.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummaryRow {
    pub ok_resources: u64,
    pub num_resources: u64,
    pub id: String,
    pub name: String,
    pub maintainer: String,
}

/// One line of `failed_resources.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResourceRow {
    pub dataset_name: String,
    pub url: String,
    pub status_code: u16,
    pub reason: String,
}

/// Builds the folder name for a run against `host` started at `started_at`
///
/// Colons in `host:port` are replaced so the name is valid on every
/// filesystem.
pub fn folder_name(host: &str, started_at: &NaiveDateTime) -> String {
    format!(
        "results_{}_{}",
        host.replace(':', "_"),
        started_at.format("%Y-%m-%d_%H-%M-%S")
    )
}

/// Makes a dataset name usable as a file name
fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => format!("_{}", cleaned),
        _ => cleaned,
    }
}

/// Sink for everything a run writes
#[derive(Debug, Clone)]
pub struct ResultsDir {
    path: PathBuf,
}

impl ResultsDir {
    /// Creates a fresh results directory under `root`
    ///
    /// An existing folder is never reused: if the name is taken, a `-N`
    /// suffix is appended. The `packages.csv` header is written immediately.
    pub fn create(
        root: &Path,
        host: &str,
        started_at: &NaiveDateTime,
    ) -> Result<Self, CheckerError> {
        fs::create_dir_all(root)?;

        let base = folder_name(host, started_at);
        let mut suffix = 0u32;
        let path = loop {
            let candidate = if suffix == 0 {
                root.join(&base)
            } else {
                root.join(format!("{}-{}", base, suffix))
            };

            match fs::create_dir(&candidate) {
                Ok(()) => break candidate,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        };

        fs::create_dir(path.join(PACKAGES_JSON_DIR))?;
        append_row(&path.join(PACKAGES_CSV), PACKAGES_CSV_HEADER)?;

        tracing::info!("Writing results to {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the raw `package_list` response
    pub fn write_package_list(&self, document: &Value) -> Result<(), CheckerError> {
        write_json(&self.path.join(PACKAGE_LIST_FILE), document)
    }

    /// Saves the fetched document (or error body) of one dataset
    pub fn write_dataset_document(&self, name: &str, document: &Value) -> Result<(), CheckerError> {
        let file = self
            .path
            .join(PACKAGES_JSON_DIR)
            .join(format!("{}.json", file_safe(name)));
        write_json(&file, document)
    }

    pub fn append_package_summary(&self, row: &PackageSummaryRow) -> Result<(), CheckerError> {
        append_row(
            &self.path.join(PACKAGES_CSV),
            [
                row.ok_resources.to_string().as_str(),
                row.num_resources.to_string().as_str(),
                &row.id,
                &row.name,
                &row.maintainer,
            ],
        )?;
        Ok(())
    }

    pub fn append_failed_resource(&self, row: &FailedResourceRow) -> Result<(), CheckerError> {
        append_row(
            &self.path.join(FAILED_RESOURCES_CSV),
            [
                row.dataset_name.as_str(),
                &row.url,
                row.status_code.to_string().as_str(),
                &row.reason,
            ],
        )?;
        Ok(())
    }

    pub fn append_failed_package(&self, dataset_name: &str) -> Result<(), CheckerError> {
        append_row(&self.path.join(FAILED_PACKAGES_CSV), [dataset_name])?;
        Ok(())
    }
}

fn write_json(path: &Path, document: &Value) -> Result<(), CheckerError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.flush()?;
    Ok(())
}
