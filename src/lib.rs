#![doc = include_str!("../README.md")]

/// Series title / episode / subtitle annotation workflows.
pub mod annotation;
/// Command-line runners shared by the bundled binaries.
pub mod apps;
/// Channel category classification.
pub mod channel;
/// Ingestion and subset configuration types.
pub mod config;
/// Centralized constants used across ingestion, weighting, and sampling.
pub mod constants;
/// Program record type.
pub mod data;
/// Program id assignment.
pub mod identity;
/// Raw event admission and the subset candidate pool.
pub mod ingestion;
/// Subset composition reports.
pub mod metrics;
/// Guide text normalization.
pub mod normalize;
/// Stage orchestration.
pub mod pipeline;
/// Weighted, stratified subset sampling.
pub mod sampler;
/// Event source trait and built-in sources.
pub mod source;
/// Output transports (JSONL files today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Recency and genre weighting.
pub mod weight;

mod errors;

pub use annotation::{Annotation, AnnotationProvider, AnnotationSession};
pub use channel::ChannelCategory;
pub use config::{CategoryProportions, GenreFloor, GenreSelector, IngestConfig, SubsetConfig};
pub use data::ProgramRecord;
pub use errors::DatasetError;
pub use ingestion::{DatasetBuilder, DatasetPool, IngestStats, RejectReason};
pub use metrics::{SubsetComposition, category_drift, subset_composition};
pub use pipeline::{DatasetPipeline, PipelineOutput, SubsetOutput};
pub use sampler::{DeterministicRng, SubsetSampler};
pub use source::{EventSource, InMemoryEventSource, JsonlEventSource, TimeWindow};
pub use transport::JsonlWriter;
pub use types::{GenreId, NetworkId, ProgramId, ServiceId, SourceId};
