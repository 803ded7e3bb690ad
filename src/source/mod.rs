//! Raw event records and the acquisition interface.
//!
//! Ownership model:
//! - `EventSource` is the pipeline-facing interface that returns one time window of raw
//!   service/event records per call. Network clients and file dumps both implement it.
//! - `TimeWindow` bounds each acquisition so source-side pagination limits are respected.
//! - Raw types mirror the guide-data wire shape and are validated once by ingestion into
//!   strongly typed `ProgramRecord`s.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

use crate::constants::ingestion::JST_OFFSET_SECONDS;
use crate::errors::DatasetError;
use crate::types::{EventId, NetworkId, ServiceId, SourceId, TransportStreamId};

/// JSONL file-backed event source.
pub mod jsonl;

pub use jsonl::JsonlEventSource;

/// Fixed UTC+9 offset used for every guide timestamp.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECONDS).expect("UTC+9 is a valid offset")
}

/// Parse a guide timestamp.
///
/// RFC 3339 inputs keep their offset; naive inputs (`YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`) are taken as already in UTC+9, not converted.
pub fn parse_jst_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    jst().from_local_datetime(&naive).single()
}

/// Half-open acquisition window `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    /// `true` when `instant` falls in `[start, end)`.
    pub fn contains(&self, instant: &DateTime<FixedOffset>) -> bool {
        *instant >= self.start && *instant < self.end
    }

    /// Split into consecutive windows no longer than `step`; the last one is clipped to `end`.
    pub fn split(&self, step: TimeDelta) -> Vec<TimeWindow> {
        let mut windows = Vec::new();
        if step <= TimeDelta::zero() {
            return windows;
        }
        let mut current = self.start;
        while current < self.end {
            let next = (current + step).min(self.end);
            windows.push(TimeWindow::new(current, next));
            current = next;
        }
        windows
    }
}

/// Service-level metadata attached to a group of events.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub onid: Option<NetworkId>,
    #[serde(default)]
    pub tsid: Option<TransportStreamId>,
    #[serde(default)]
    pub sid: Option<ServiceId>,
    /// ARIB service type; `0x01` is a regular digital TV service.
    pub service_type: u8,
    #[serde(default)]
    pub service_name: Option<String>,
}

/// Short event descriptor: program name and summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortInfo {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub text_char: String,
}

/// One content (genre) classification entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNibble {
    pub content_nibble: u16,
    #[serde(default)]
    pub user_nibble: u16,
}

/// Content descriptor holding genre nibbles in broadcast order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfo {
    #[serde(default)]
    pub nibble_list: Vec<ContentNibble>,
}

/// One raw guide event as delivered by the source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub onid: NetworkId,
    pub tsid: TransportStreamId,
    pub sid: ServiceId,
    pub eid: EventId,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub duration_sec: Option<u32>,
    #[serde(default)]
    pub short_info: Option<ShortInfo>,
    #[serde(default)]
    pub content_info: Option<ContentInfo>,
}

impl RawEvent {
    /// Short label for logs, e.g. `NID32742-SID01072-EID27730`.
    pub fn label(&self) -> String {
        format!("NID{:05}-SID{:05}-EID{:05}", self.onid, self.sid, self.eid)
    }

    /// Parsed start time, or `MalformedRecord` when missing or unparseable.
    pub fn parsed_start_time(&self) -> Result<DateTime<FixedOffset>, DatasetError> {
        let raw = self
            .start_time
            .as_deref()
            .ok_or_else(|| DatasetError::MalformedRecord {
                record: self.label(),
                reason: "missing start_time".to_string(),
            })?;
        parse_jst_datetime(raw).ok_or_else(|| DatasetError::MalformedRecord {
            record: self.label(),
            reason: format!("unparseable start_time '{raw}'"),
        })
    }

    /// Duration in seconds, or `MalformedRecord` when missing.
    pub fn required_duration(&self) -> Result<u32, DatasetError> {
        self.duration_sec
            .ok_or_else(|| DatasetError::MalformedRecord {
                record: self.label(),
                reason: "missing duration_sec".to_string(),
            })
    }

    /// First content nibble, when the event carries a content descriptor.
    pub fn first_content_nibble(&self) -> Option<u16> {
        self.content_info
            .as_ref()
            .and_then(|info| info.nibble_list.first())
            .map(|entry| entry.content_nibble)
    }
}

/// Events of one service, as grouped by the guide-data source.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceEvents {
    pub service_info: ServiceInfo,
    #[serde(default)]
    pub event_list: Vec<RawEvent>,
}

impl ServiceEvents {
    /// Copy of this service group keeping only events that start inside `window`.
    ///
    /// Events without a usable start time are never inside a window.
    pub fn restricted_to(&self, window: &TimeWindow) -> ServiceEvents {
        let event_list = self
            .event_list
            .iter()
            .filter(|event| {
                event
                    .parsed_start_time()
                    .is_ok_and(|start| window.contains(&start))
            })
            .cloned()
            .collect();
        ServiceEvents {
            service_info: self.service_info.clone(),
            event_list,
        }
    }
}

/// Service groups held in memory, split once into events that can be placed in a window and
/// events whose start time is missing or unparseable.
#[derive(Clone, Debug, Default)]
pub struct EventCatalog {
    placeable: Vec<ServiceEvents>,
    unplaceable: Vec<ServiceEvents>,
}

impl EventCatalog {
    pub fn new(services: Vec<ServiceEvents>) -> Self {
        let mut catalog = Self::default();
        for service in services {
            let (placeable, unplaceable): (Vec<RawEvent>, Vec<RawEvent>) = service
                .event_list
                .into_iter()
                .partition(|event| event.parsed_start_time().is_ok());
            if !unplaceable.is_empty() {
                catalog.unplaceable.push(ServiceEvents {
                    service_info: service.service_info.clone(),
                    event_list: unplaceable,
                });
            }
            if !placeable.is_empty() {
                catalog.placeable.push(ServiceEvents {
                    service_info: service.service_info,
                    event_list: placeable,
                });
            }
        }
        catalog
    }

    /// Total raw events held, placeable or not.
    pub fn event_count(&self) -> usize {
        self.placeable
            .iter()
            .chain(&self.unplaceable)
            .map(|service| service.event_list.len())
            .sum()
    }

    /// Non-empty service groups restricted to `window`.
    pub fn in_window(&self, window: &TimeWindow) -> Vec<ServiceEvents> {
        self.placeable
            .iter()
            .map(|service| service.restricted_to(window))
            .filter(|service| !service.event_list.is_empty())
            .collect()
    }

    pub fn unplaceable(&self) -> &[ServiceEvents] {
        &self.unplaceable
    }
}

/// Pipeline-facing acquisition interface.
///
/// For a fixed upstream state, `fetch` must be deterministic for a given window.
pub trait EventSource {
    /// Stable source identifier used in logs and errors.
    fn id(&self) -> &str;

    /// Return every service/event group with events starting in `window`.
    ///
    /// Return `SourceUnavailable` when the upstream cannot serve the window; the pipeline logs it
    /// and moves on to the next window.
    fn fetch(&self, window: &TimeWindow) -> Result<Vec<ServiceEvents>, DatasetError>;

    /// Events held by the source that belong to no window because their start time is missing or
    /// unparseable. The pipeline offers them to ingestion once per run so they are counted as
    /// malformed. Sources that only ever return per-window responses keep the default.
    fn unplaceable(&self) -> Vec<ServiceEvents> {
        Vec::new()
    }
}

/// In-memory source, handy for tests and for replaying already-loaded dumps.
pub struct InMemoryEventSource {
    id: SourceId,
    catalog: EventCatalog,
}

impl InMemoryEventSource {
    pub fn new(id: impl Into<SourceId>, services: Vec<ServiceEvents>) -> Self {
        Self {
            id: id.into(),
            catalog: EventCatalog::new(services),
        }
    }
}

impl EventSource for InMemoryEventSource {
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
