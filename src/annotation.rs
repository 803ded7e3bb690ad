//! Series title / episode number / subtitle annotation of subset records.
//!
//! `AnnotationSession` is the manual workflow: walk a subset file record by record, apply what the
//! annotator entered, and persist the whole file after every accepted record. `AnnotationProvider`
//! is the automatic one: a completion service that proposes the same fields from title and
//! description.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::data::ProgramRecord;
use crate::errors::DatasetError;
use crate::transport::fs::{read_jsonl, rewrite_jsonl};

/// Annotation fields for one record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotation {
    pub series_title: String,
    pub episode_number: Option<String>,
    pub subtitle: Option<String>,
}

impl Annotation {
    /// Build from raw form input: every field is trimmed and blank optional fields become absent.
    pub fn from_input(series_title: &str, episode_number: &str, subtitle: &str) -> Self {
        Self {
            series_title: series_title.trim().to_string(),
            episode_number: non_blank(episode_number),
            subtitle: non_blank(subtitle),
        }
    }

    pub fn apply_to(&self, record: &mut ProgramRecord) {
        record.series_title = self.series_title.clone();
        record.episode_number = self.episode_number.clone();
        record.subtitle = self.subtitle.clone();
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Input sent to a completion service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub title: String,
    pub description: String,
}

impl From<&ProgramRecord> for AnnotationRequest {
    fn from(record: &ProgramRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
        }
    }
}

/// Output expected from a completion service; `null` means the field is not present in the guide text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationResponse {
    pub series_title: String,
    #[serde(default)]
    pub episode_number: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

impl From<AnnotationResponse> for Annotation {
    fn from(response: AnnotationResponse) -> Self {
        Annotation::from_input(
            &response.series_title,
            response.episode_number.as_deref().unwrap_or(""),
            response.subtitle.as_deref().unwrap_or(""),
        )
    }
}

/// Completion service that proposes annotations.
pub trait AnnotationProvider {
    fn annotate(&self, request: &AnnotationRequest) -> Result<AnnotationResponse, DatasetError>;
}

/// Counters from [`enrich_records`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub annotated: usize,
    pub failed: usize,
}

/// Ask `provider` for every record; failures are logged and leave the record untouched.
pub fn enrich_records<P>(records: &mut [ProgramRecord], provider: &P) -> EnrichSummary
where
    P: AnnotationProvider + ?Sized,
{
    let mut summary = EnrichSummary::default();
    for record in records.iter_mut() {
        let request = AnnotationRequest::from(&*record);
        match provider.annotate(&request) {
            Ok(response) => {
                let annotation = Annotation::from(response);
                debug!(
                    "{}: series={:?} episode={:?} subtitle={:?}",
                    record.id, annotation.series_title, annotation.episode_number, annotation.subtitle
                );
                annotation.apply_to(record);
                summary.annotated += 1;
            }
            Err(err) => {
                warn!("annotation failed for {}: {err}", record.id);
                summary.failed += 1;
            }
        }
    }
    info!(
        "enriched {} records ({} failed)",
        summary.annotated, summary.failed
    );
    summary
}

/// Manual annotation over a subset file.
///
/// The cursor only moves forward; `submit` persists before advancing so an interrupted session can
/// resume from the last saved index.
pub struct AnnotationSession {
    path: PathBuf,
    records: Vec<ProgramRecord>,
    index: usize,
}

impl AnnotationSession {
    /// Load `path` and position the cursor at `start_index`.
    pub fn open(path: impl AsRef<Path>, start_index: usize) -> Result<Self, DatasetError> {
        let path = path.as_ref().to_path_buf();
        let records: Vec<ProgramRecord> = read_jsonl(&path)?;
        info!("loaded {} records from {}", records.len(), path.display());
        Ok(Self {
            path,
            records,
            index: start_index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProgramRecord] {
        &self.records
    }

    /// Records after the current one.
    pub fn remaining(&self) -> usize {
        self.records.len().saturating_sub(self.index + 1)
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.records.len()
    }

    pub fn current(&self) -> Option<&ProgramRecord> {
        self.records.get(self.index)
    }

    /// Starting values for the form: every field prefilled with the symbol-free title.
    pub fn draft(&self) -> Option<Annotation> {
        self.current().map(|record| Annotation {
            series_title: record.title_clean.clone(),
            episode_number: Some(record.title_clean.clone()),
            subtitle: Some(record.title_clean.clone()),
        })
    }

    /// Apply `annotation` to the current record, rewrite the file, and advance.
    pub fn submit(&mut self, annotation: Annotation) -> Result<(), DatasetError> {
        let index = self.index;
        let record = self.records.get_mut(index).ok_or_else(|| {
            DatasetError::Annotation(format!("no record at index {index}; session is complete"))
        })?;
        annotation.apply_to(record);
        rewrite_jsonl(&self.path, &self.records)?;
        info!(
            "annotated {} ({} remaining)",
            self.records[index].id,
            self.remaining()
        );
        self.index += 1;
        Ok(())
    }

    /// Advance without changing the current record.
    pub fn skip(&mut self) {
        if !self.is_complete() {
            self.index += 1;
        }
    }
}
