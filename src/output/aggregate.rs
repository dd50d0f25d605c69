//! Result aggregation over a results directory
//!
//! Reads `failed_resources.csv` and `packages.csv`, then writes
//! `failed_domain_count.csv` and `statistics.txt`. Works on any results
//! directory, so it can be rerun on the output of an earlier check.

use crate::output::results_dir::{
    FAILED_DOMAIN_COUNT_CSV, FAILED_RESOURCES_CSV, PACKAGES_CSV, STATISTICS_FILE,
};
use crate::output::stats::{DomainCount, RunStatistics};
use crate::output::writer::append_row;
use crate::url::network_location;
use crate::{AggregationError, AggregationResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Summed content of `packages.csv`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PackageTotals {
    ok_resources: u64,
    total_resources: u64,
    failed_packages: u64,
    total_packages: u64,
}

/// Aggregates the results in `dir`
///
/// Both inputs are validated before anything is written, so a failing
/// aggregation leaves no partial report behind. Running it twice over the
/// same directory produces identical files.
///
/// # Errors
///
/// * `MissingFolder` - `dir` does not exist
/// * `MissingInput` / `EmptyInput` - `packages.csv` is absent or has no rows
/// * `DivisionByZero` - no resources were checked at all
/// * `InvalidRow` - a row cannot be interpreted
pub fn aggregate(dir: &Path) -> AggregationResult<RunStatistics> {
    if !dir.is_dir() {
        return Err(AggregationError::MissingFolder(dir.display().to_string()));
    }

    let domain_counts = count_failed_domains(&dir.join(FAILED_RESOURCES_CSV))?;
    let totals = sum_packages(&dir.join(PACKAGES_CSV))?;

    let statistics = RunStatistics::from_totals(
        totals.ok_resources,
        totals.total_resources,
        totals.failed_packages,
        totals.total_packages,
        domain_counts,
    )?;

    write_domain_counts(&dir.join(FAILED_DOMAIN_COUNT_CSV), &statistics.domain_counts)?;
    fs::write(dir.join(STATISTICS_FILE), statistics.report())?;

    tracing::info!(
        "Aggregated {}: {} of {} links failed",
        dir.display(),
        statistics.failed_resources,
        statistics.total_resources
    );

    Ok(statistics)
}

/// Counts failed resources per network location
///
/// A missing file means no resource failed. Ties are ordered by domain so
/// the output is deterministic.
fn count_failed_domains(path: &Path) -> AggregationResult<Vec<DomainCount>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut counts: HashMap<String, u64> = HashMap::new();
    for result in reader.records() {
        let record = result?;
        let url = record.get(1).ok_or_else(|| AggregationError::InvalidRow {
            file: FAILED_RESOURCES_CSV.to_string(),
            line: record.position().map(|p| p.line()).unwrap_or(0),
            message: "missing url column".to_string(),
        })?;
        *counts.entry(network_location(url)).or_insert(0) += 1;
    }

    let mut domain_counts: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount { domain, count })
        .collect();
    domain_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));

    Ok(domain_counts)
}

/// Sums the per-dataset rows of `packages.csv`
fn sum_packages(path: &Path) -> AggregationResult<PackageTotals> {
    if !path.exists() {
        return Err(AggregationError::MissingInput(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut totals = PackageTotals::default();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let invalid = |message: String| AggregationError::InvalidRow {
            file: PACKAGES_CSV.to_string(),
            line,
            message,
        };

        let parse_count = |index: usize, column: &str| -> AggregationResult<u64> {
            let raw = record
                .get(index)
                .ok_or_else(|| invalid(format!("missing {} column", column)))?;
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid(format!("{} '{}': {}", column, raw, e)))
        };

        let ok = parse_count(0, "ok_resources")?;
        let total = parse_count(1, "num_resources")?;
        if ok > total {
            return Err(invalid(format!(
                "ok_resources ({}) exceeds num_resources ({})",
                ok, total
            )));
        }

        totals.ok_resources += ok;
        totals.total_resources += total;
        totals.total_packages += 1;
        if ok == 0 {
            totals.failed_packages += 1;
        }
    }

    if totals.total_packages == 0 {
        return Err(AggregationError::EmptyInput(path.display().to_string()));
    }

    Ok(totals)
}

/// Rewrites `failed_domain_count.csv` from scratch
fn write_domain_counts(path: &Path, domain_counts: &[DomainCount]) -> AggregationResult<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    // An empty file still signals that the aggregation ran
    fs::File::create(path)?;

    for entry in domain_counts {
        append_row(path, [entry.count.to_string().as_str(), &entry.domain])?;
    }
    Ok(())
}
