//! End-to-end dataset construction.
//!
//! Stage A walks the requested time range window by window, converts each window's raw events into
//! dataset records, and hands the finished window to a sink (typically a [`JsonlWriter`]).
//! Stage B feeds dataset records into a [`DatasetPool`], draws the stratified subset, and returns it
//! sorted by id. [`DatasetPipeline::run`] chains both stages in memory.

use rand::Rng;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::{IngestConfig, SubsetConfig};
use crate::data::ProgramRecord;
use crate::errors::DatasetError;
use crate::ingestion::{DatasetBuilder, DatasetPool, IngestStats};
use crate::sampler::{SamplingOutcome, SubsetSampler};
use crate::source::{EventSource, TimeWindow};
use crate::transport::fs::JsonlWriter;

/// Result of stage A.
#[derive(Clone, Debug, Default)]
pub struct CollectSummary {
    /// Windows requested from the source.
    pub windows: usize,
    /// Windows the source could not serve; they contribute no records.
    pub failed_windows: usize,
    /// Records handed to the sink.
    pub records: usize,
    pub stats: IngestStats,
}

/// Result of stage B.
#[derive(Clone, Debug)]
pub struct SubsetOutput {
    /// Final subset, sorted by id with unique ids.
    pub records: Vec<ProgramRecord>,
    /// Records that survived pool filtering.
    pub pool_size: usize,
    pub pool_stats: IngestStats,
    pub sampling: SamplingOutcome,
}

/// Result of a full in-memory run.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub collect: CollectSummary,
    pub subset: SubsetOutput,
}

/// Validated settings for both stages.
#[derive(Clone, Debug, Default)]
pub struct DatasetPipeline {
    ingest: IngestConfig,
    subset: SubsetConfig,
}

impl DatasetPipeline {
    pub fn new(ingest: IngestConfig, subset: SubsetConfig) -> Result<Self, DatasetError> {
        Ok(Self {
            ingest: ingest.validated()?,
            subset: subset.validated()?,
        })
    }

    pub fn subset_config(&self) -> &SubsetConfig {
        &self.subset
    }

    /// Stage A: acquire `range` in windows and pass each finished window to `sink`.
    ///
    /// A window is fully built (and sorted by id) before the sink sees any of it. Upstream failures
    /// are logged and the window is skipped; sink errors abort the run.
    pub fn collect_windows<S, F>(
        &self,
        source: &S,
        range: &TimeWindow,
        mut sink: F,
    ) -> Result<CollectSummary, DatasetError>
    where
        S: EventSource + ?Sized,
        F: FnMut(&TimeWindow, Vec<ProgramRecord>) -> Result<(), DatasetError>,
    {
        let mut builder = DatasetBuilder::new(&self.ingest);
        let mut summary = CollectSummary::default();
        // Events without a usable start time belong to no window; count them once up front.
        let unplaceable = source.unplaceable();
        if !unplaceable.is_empty() {
            builder.build_window(&unplaceable);
        }
        for window in range.split(self.ingest.window) {
            summary.windows += 1;
            info!("fetching {} .. {} from {}", window.start, window.end, source.id());
            let services = match source.fetch(&window) {
                Ok(services) => services,
                Err(err) => {
                    warn!("skipping window {} .. {}: {err}", window.start, window.end);
                    summary.failed_windows += 1;
                    continue;
                }
            };
            let records = builder.build_window(&services);
            summary.records += records.len();
            info!("window {} .. {}: {} records", window.start, window.end, records.len());
            sink(&window, records)?;
        }
        summary.stats = builder.stats().clone();
        info!("collected dataset: {}", summary.stats);
        Ok(summary)
    }

    /// Stage A into a JSONL file, one batch per window.
    pub fn write_dataset<S>(
        &self,
        source: &S,
        range: &TimeWindow,
        writer: &mut JsonlWriter,
    ) -> Result<CollectSummary, DatasetError>
    where
        S: EventSource + ?Sized,
    {
        self.collect_windows(source, range, |_, records| writer.write_batch(&records))
    }

    /// Stage B: filter, deduplicate, weight, sample, and order `records`.
    pub fn build_subset<I, R>(&self, records: I, rng: &mut R) -> SubsetOutput
    where
        I: IntoIterator<Item = ProgramRecord>,
        R: Rng + ?Sized,
    {
        let mut pool = DatasetPool::new(&self.subset);
        pool.extend(records);
        info!("pool: {}", pool.stats());
        let sampling = SubsetSampler::new(&self.subset).sample(&pool, rng);
        let records = finalize_subset(pool.select(&sampling.selected));
        SubsetOutput {
            records,
            pool_size: pool.len(),
            pool_stats: pool.stats().clone(),
            sampling,
        }
    }

    /// Both stages in memory over `range`.
    pub fn run<S, R>(
        &self,
        source: &S,
        range: &TimeWindow,
        rng: &mut R,
    ) -> Result<PipelineOutput, DatasetError>
    where
        S: EventSource + ?Sized,
        R: Rng + ?Sized,
    {
        let mut dataset = Vec::new();
        let collect = self.collect_windows(source, range, |_, records| {
            dataset.extend(records);
            Ok(())
        })?;
        let subset = self.build_subset(dataset, rng);
        Ok(PipelineOutput { collect, subset })
    }
}

/// Sort by id and drop any repeated id with a warning.
pub fn finalize_subset(mut records: Vec<ProgramRecord>) -> Vec<ProgramRecord> {
    records.sort_by(|a, b| a.id.cmp(&b.id));
    let mut seen = HashSet::with_capacity(records.len());
    records.retain(|record| {
        let fresh = seen.insert(record.id.clone());
        if !fresh {
            warn!("duplicate id in subset: {}", record.id);
        }
        fresh
    });
    records
}
