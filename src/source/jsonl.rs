use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::DatasetError;
use crate::source::{EventCatalog, EventSource, ServiceEvents, TimeWindow};
use crate::types::SourceId;

/// Event source backed by a JSONL dump with one `ServiceEvents` group per line.
///
/// The dump is parsed once on open; unparseable lines are logged and skipped.
pub struct JsonlEventSource {
    id: SourceId,
    catalog: EventCatalog,
}

impl JsonlEventSource {
    /// Load `path`, using its file name as the source id.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| DatasetError::SourceUnavailable {
            source_id: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let mut services = Vec::new();
        for (line_idx, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<ServiceEvents>(trimmed) {
                Ok(service) => services.push(service),
                Err(err) => warn!(
                    "skipping unparseable line {} in {}: {err}",
                    line_idx + 1,
                    path.display()
                ),
            }
        }
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let groups = services.len();
        let catalog = EventCatalog::new(services);
        info!(
            "loaded {} events in {groups} service groups from {}",
            catalog.event_count(),
            path.display()
        );
        Ok(Self { id, catalog })
    }
}

impl EventSource for JsonlEventSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&self, window: &TimeWindow) -> Result<Vec<ServiceEvents>, DatasetError> {
        Ok(self.catalog.in_window(window))
    }

    fn unplaceable(&self) -> Vec<ServiceEvents> {
        self.catalog.unplaceable().to_vec()
    }
}
