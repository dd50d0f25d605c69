//! Run statistics
//!
//! This module provides the statistics computed over a results directory
//! and their textual renderings.

use crate::output::results_dir::FAILED_DOMAIN_COUNT_CSV;
use crate::{AggregationError, AggregationResult};

/// Number of failed resources at one network location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCount {
    pub domain: String,
    pub count: u64,
}

/// Failure statistics of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    pub failed_resources: u64,
    pub total_resources: u64,
    /// Datasets without a single working link
    pub failed_packages: u64,
    pub total_packages: u64,

    /// Failed resources per domain, descending by count
    pub domain_counts: Vec<DomainCount>,
}

impl RunStatistics {
    /// Builds statistics from summed counts
    ///
    /// Fails instead of producing a meaningless percentage when either
    /// denominator is zero.
    pub fn from_totals(
        ok_resources: u64,
        total_resources: u64,
        failed_packages: u64,
        total_packages: u64,
        domain_counts: Vec<DomainCount>,
    ) -> AggregationResult<Self> {
        if total_packages == 0 {
            return Err(AggregationError::DivisionByZero("dataset"));
        }
        if total_resources == 0 {
            return Err(AggregationError::DivisionByZero("link"));
        }

        Ok(Self {
            failed_resources: total_resources.saturating_sub(ok_resources),
            total_resources,
            failed_packages,
            total_packages,
            domain_counts,
        })
    }

    pub fn ok_resources(&self) -> u64 {
        self.total_resources - self.failed_resources
    }

    pub fn failed_resource_percentage(&self) -> f64 {
        (self.failed_resources as f64 / self.total_resources as f64) * 100.0
    }

    pub fn failed_package_percentage(&self) -> f64 {
        (self.failed_packages as f64 / self.total_packages as f64) * 100.0
    }

    pub fn failed_links_line(&self) -> String {
        format!(
            "{} out of {} links failed ({:.2}%)",
            self.failed_resources,
            self.total_resources,
            self.failed_resource_percentage()
        )
    }

    pub fn failed_packages_line(&self) -> String {
        format!(
            "{} out of {} datasets contained no working links ({:.2}%)",
            self.failed_packages,
            self.total_packages,
            self.failed_package_percentage()
        )
    }

    /// Content of `statistics.txt`
    pub fn report(&self) -> String {
        format!(
            "{}\n{}\n\nAlso take a look at {} to identify domains with many failed links",
            self.failed_links_line(),
            self.failed_packages_line(),
            FAILED_DOMAIN_COUNT_CSV
        )
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("\nFAILED LINKS PER DOMAIN:");
    for entry in &stats.domain_counts {
        println!("{}: {}", entry.count, entry.domain);
    }

    println!("\nSTATISTICS:");
    println!("{}", stats.failed_links_line());
    println!("{}", stats.failed_packages_line());
}
