//! Check coordinator - main orchestration logic
//!
//! This module contains the main loop of a link check run:
//! - Retrieving the dataset list
//! - Fetching each dataset through the catalog client
//! - Probing every resource and recording failures
//! - Writing one summary row per dataset
//! - Aggregating the results directory at the end

use crate::catalog::{CkanClient, DatasetFetch, Package};
use crate::config::Config;
use crate::crawler::prober::{ProbeOutcome, Prober};
use crate::crawler::state::{DatasetTally, RunCounters};
use crate::output::{aggregate, FailedResourceRow, PackageSummaryRow, ResultsDir, RunStatistics};
use crate::CheckerError;
use chrono::Local;
use std::path::PathBuf;

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Folder holding every file written by the run
    pub results_dir: PathBuf,
    pub counters: RunCounters,
    pub statistics: RunStatistics,
}

/// Main check coordinator structure
pub struct Coordinator {
    client: CkanClient,
    prober: Prober,
    results_root: PathBuf,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `client` - A connected catalog client
    /// * `config` - The checker configuration
    pub fn new(client: CkanClient, config: &Config) -> Result<Self, CheckerError> {
        Ok(Self {
            client,
            prober: Prober::new(config)?,
            results_root: PathBuf::from(&config.output.results_root),
        })
    }

    /// Runs the check over the whole catalog
    ///
    /// The results directory is only created once the dataset list has
    /// been retrieved, so a catalog that refuses to list anything leaves
    /// no empty folder behind.
    pub async fn run(&mut self) -> Result<RunSummary, CheckerError> {
        let list = self.client.list_dataset_names().await?;
        tracing::info!("Catalog lists {} datasets", list.names.len());

        let results = ResultsDir::create(
            &self.results_root,
            &self.client.host(),
            &Local::now().naive_local(),
        )?;
        results.write_package_list(&list.document)?;

        let mut counters = RunCounters::default();
        let start_time = std::time::Instant::now();

        for (index, name) in list.names.iter().enumerate() {
            self.check_dataset(name, &results, &mut counters).await?;

            if (index + 1) % 50 == 0 {
                tracing::info!(
                    "Progress: {}/{} datasets, {} links checked, {} failed, {:?} elapsed",
                    index + 1,
                    list.names.len(),
                    counters.resources_probed,
                    counters.resources_failed,
                    start_time.elapsed()
                );
            }
        }

        tracing::info!(
            "Checked {} links in {} datasets in {:?}",
            counters.resources_probed,
            counters.datasets,
            start_time.elapsed()
        );

        let statistics = aggregate(results.path())?;

        Ok(RunSummary {
            results_dir: results.path().to_path_buf(),
            counters,
            statistics,
        })
    }

    /// Fetches one dataset, probes its resources and writes its rows
    async fn check_dataset(
        &mut self,
        name: &str,
        results: &ResultsDir,
        counters: &mut RunCounters,
    ) -> Result<(), CheckerError> {
        tracing::info!("Checking dataset {}", name);

        let (tally, id, maintainer) = match self.client.fetch_dataset(name).await {
            DatasetFetch::Failed { document, reason } => {
                tracing::warn!("Skipping dataset {}: {}", name, reason);
                results.write_dataset_document(name, &document)?;
                counters.add_skipped_dataset();
                (DatasetTally::default(), String::new(), String::new())
            }
            DatasetFetch::Found { package, document } => {
                results.write_dataset_document(name, &document)?;
                let tally = self.probe_resources(name, &package, results).await?;
                counters.add_dataset(&tally);
                (tally, package.id.clone(), package.maintainer().to_string())
            }
        };

        results.append_package_summary(&PackageSummaryRow {
            ok_resources: tally.ok_resources,
            num_resources: tally.num_resources,
            id,
            name: name.to_string(),
            maintainer,
        })?;

        if tally.has_no_working_links() {
            tracing::info!("Found no working resources for {}", name);
            results.append_failed_package(name)?;
        }

        Ok(())
    }

    /// Probes every resource of `package` in order
    async fn probe_resources(
        &self,
        dataset_name: &str,
        package: &Package,
        results: &ResultsDir,
    ) -> Result<DatasetTally, CheckerError> {
        if let Some(declared) = package.num_resources {
            if declared != package.resources.len() as u64 {
                tracing::warn!(
                    "Dataset {} declares {} resources but lists {}",
                    dataset_name,
                    declared,
                    package.resources.len()
                );
            }
        }

        let mut tally = DatasetTally::default();

        for resource in &package.resources {
            let outcome = self.prober.probe(resource).await;
            tally.record(&outcome);

            match outcome {
                ProbeOutcome::Ok => {
                    tracing::debug!("OK: {}", resource.url());
                }
                ProbeOutcome::Failed {
                    status_code,
                    reason,
                } => {
                    tracing::warn!("Failed ({} {}): {}", status_code, reason, resource.url());
                    results.append_failed_resource(&FailedResourceRow {
                        dataset_name: dataset_name.to_string(),
                        url: resource.url().to_string(),
                        status_code,
                        reason,
                    })?;
                }
            }
        }

        Ok(tally)
    }
}

/// Runs a complete check against a catalog endpoint
///
/// This function orchestrates the entire run:
///
/// 1. Verify the endpoint is a CKAN version 3 API
/// 2. Retrieve the dataset list and create the results directory
/// 3. Fetch every dataset and probe each of its resources
/// 4. Aggregate the results directory
///
/// # Example
///
/// ```no_run
/// use ckan_link_checker::config::Config;
/// use ckan_link_checker::crawler::run_check;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_check("https://data.example.org/api/3", &Config::default()).await?;
/// println!("{}", summary.statistics.failed_links_line());
/// # Ok(())
/// # }
/// ```
pub async fn run_check(endpoint: &str, config: &Config) -> Result<RunSummary, CheckerError> {
    let client = CkanClient::connect(endpoint, config).await?;
    let mut coordinator = Coordinator::new(client, config)?;
    coordinator.run().await
}
