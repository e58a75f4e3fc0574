//! Parallel conversion of independent file sets.
//!
//! Jobs share the format registry and nothing else: each runs its own
//! resolution and export, so results never depend on which jobs ran
//! alongside.

use rayon::prelude::*;

use crate::config::ConvertOptions;
use crate::convert::{convert_with_registry, ConversionResult};
use crate::registry::FormatRegistry;
use crate::source::FileStore;

/// One conversion request in a batch.
#[derive(Clone, Debug)]
pub struct BatchJob {
    pub files: FileStore,
    pub target: String,
    pub options: ConvertOptions,
}

impl BatchJob {
    /// A job with the eager defaults.
    pub fn new(files: FileStore, target: impl Into<String>) -> Self {
        Self {
            files,
            target: target.into(),
            options: ConvertOptions::eager(),
        }
    }

    /// Replace the job's options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }
}

/// Run every job on the rayon pool. Results are in job order.
pub fn convert_batch(jobs: &[BatchJob]) -> Vec<ConversionResult> {
    let registry = FormatRegistry::standard();
    log::debug!("Converting batch of {} job(s)", jobs.len());

    jobs.par_iter()
        .map(|job| convert_with_registry(&registry, &job.files, &job.target, &job.options))
        .collect()
}
