//! Counters carried through a run
//!
//! A [`DatasetTally`] lives for the duration of one dataset; [`RunCounters`]
//! accumulates the tallies of the whole run.

use crate::crawler::prober::ProbeOutcome;

/// Probe results for one dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetTally {
    pub ok_resources: u64,
    pub num_resources: u64,
}

impl DatasetTally {
    /// Counts one probed resource
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.num_resources += 1;
        if outcome.is_ok() {
            self.ok_resources += 1;
        }
    }

    pub fn failed_resources(&self) -> u64 {
        self.num_resources - self.ok_resources
    }

    /// True when not a single resource of the dataset could be reached
    pub fn has_no_working_links(&self) -> bool {
        self.ok_resources == 0
    }
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Datasets with a summary row (including skipped ones)
    pub datasets: u64,
    /// Datasets whose fetch ended in an error body
    pub datasets_skipped: u64,
    pub resources_probed: u64,
    pub resources_failed: u64,
}

impl RunCounters {
    pub fn add_dataset(&mut self, tally: &DatasetTally) {
        self.datasets += 1;
        self.resources_probed += tally.num_resources;
        self.resources_failed += tally.failed_resources();
    }

    pub fn add_skipped_dataset(&mut self) {
        self.datasets += 1;
        self.datasets_skipped += 1;
    }
}
