//! Raw events to dataset records, and dataset records to the deduplicated sampling pool.
//!
//! Two gates, applied in order:
//! - `DatasetBuilder` validates raw events, keeps regular TV services on allowed networks that carry
//!   short text, assigns ids, drops repeated ids, and normalizes text and genre.
//! - `DatasetPool` drops records that are unusable for training (shopping, unknown or absent genre,
//!   empty title, outside the date range, repeated title/description), then weights and classifies the
//!   rest.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

use crate::channel::ChannelCategory;
use crate::config::{IngestConfig, SubsetConfig};
use crate::constants::genre::{FIRST_UNKNOWN_MAJOR, INFORMATION, INFORMATION_SHOPPING};
use crate::constants::ingestion::DIGITAL_TV_SERVICE_TYPE;
use crate::data::{ProgramRecord, genre_ids};
use crate::errors::DatasetError;
use crate::identity::assign_id;
use crate::normalize::{clean_text, format_text};
use crate::source::{RawEvent, ServiceEvents, ServiceInfo, jst};
use crate::types::{NetworkId, ProgramId, TextKey};
use crate::weight::weight;

/// Why a record did not make it into the dataset or the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    /// Missing or unparseable start time or duration.
    Malformed,
    /// Service is not a regular digital TV service (one-seg, data broadcasting).
    NotDigitalTv,
    /// Network is outside the configured allow-list.
    NetworkExcluded,
    /// Event carries no short text descriptor.
    MissingShortInfo,
    DuplicateId,
    Shopping,
    /// Major genre is `0xC` or above.
    UnknownGenre,
    /// Source carried no content descriptor.
    GenreAbsent,
    EmptyTitle,
    OutOfDateRange,
    /// Same formatted title and description as an earlier record.
    DuplicateText,
}

impl RejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed",
            RejectReason::NotDigitalTv => "not_digital_tv",
            RejectReason::NetworkExcluded => "network_excluded",
            RejectReason::MissingShortInfo => "missing_short_info",
            RejectReason::DuplicateId => "duplicate_id",
            RejectReason::Shopping => "shopping",
            RejectReason::UnknownGenre => "unknown_genre",
            RejectReason::GenreAbsent => "genre_absent",
            RejectReason::EmptyTitle => "empty_title",
            RejectReason::OutOfDateRange => "out_of_date_range",
            RejectReason::DuplicateText => "duplicate_text",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of offering one record to a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Rejected(RejectReason),
}

/// Counters for one gate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub seen: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl IngestStats {
    fn note(&mut self, admission: Admission) {
        self.seen += 1;
        match admission {
            Admission::Accepted => self.accepted += 1,
            Admission::Rejected(reason) => *self.rejected.entry(reason).or_default() += 1,
        }
    }

    pub fn rejected_for(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }
}

impl fmt::Display for IngestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seen={} accepted={}", self.seen, self.accepted)?;
        for (reason, count) in &self.rejected {
            write!(f, " {reason}={count}")?;
        }
        Ok(())
    }
}

/// Converts raw guide events into dataset records, one acquisition window at a time.
///
/// Seen ids persist across windows so an event repeated by the source is kept once.
pub struct DatasetBuilder {
    include_network_ids: HashSet<NetworkId>,
    seen_ids: HashSet<ProgramId>,
    stats: IngestStats,
}

impl DatasetBuilder {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            include_network_ids: config.include_network_ids.iter().copied().collect(),
            seen_ids: HashSet::new(),
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Build every usable record of one window, sorted by id.
    ///
    /// Malformed events are logged and skipped; they never abort the window.
    pub fn build_window(&mut self, services: &[ServiceEvents]) -> Vec<ProgramRecord> {
        let mut records = Vec::new();
        for service in services {
            for event in &service.event_list {
                match self.build_record(&service.service_info, event) {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {}
                    Err(err) => {
                        warn!("skipping malformed event: {err}");
                        self.stats.note(Admission::Rejected(RejectReason::Malformed));
                    }
                }
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Convert one event. `Ok(None)` means the event was filtered out (and counted).
    pub fn build_record(
        &mut self,
        service_info: &ServiceInfo,
        event: &RawEvent,
    ) -> Result<Option<ProgramRecord>, DatasetError> {
        let start_time = event.parsed_start_time()?.with_timezone(&jst());
        let duration_seconds = event.required_duration()?;

        if service_info.service_type != DIGITAL_TV_SERVICE_TYPE {
            return Ok(self.reject(RejectReason::NotDigitalTv, event));
        }
        if !self.include_network_ids.contains(&event.onid) {
            return Ok(self.reject(RejectReason::NetworkExcluded, event));
        }
        let Some(short_info) = &event.short_info else {
            return Ok(self.reject(RejectReason::MissingShortInfo, event));
        };

        let id = assign_id(&start_time, event.onid, event.sid, event.eid);
        if !self.seen_ids.insert(id.clone()) {
            debug!("duplicate program id: {id}");
            self.stats.note(Admission::Rejected(RejectReason::DuplicateId));
            return Ok(None);
        }

        let title = format_text(&short_info.event_name);
        let description = format_text(&short_info.text_char);
        let (major_genre_id, middle_genre_id) = genre_ids(event.first_content_nibble());
        self.stats.note(Admission::Accepted);
        Ok(Some(ProgramRecord {
            id,
            network_id: event.onid,
            service_id: event.sid,
            transport_stream_id: event.tsid,
            event_id: event.eid,
            start_time,
            duration_seconds,
            title_clean: clean_text(&title),
            title,
            description_clean: clean_text(&description),
            description,
            major_genre_id,
            middle_genre_id,
            series_title: String::new(),
            episode_number: None,
            subtitle: None,
            raw: Some(event.clone()),
            weight: 0.0,
        }))
    }

    fn reject(&mut self, reason: RejectReason, event: &RawEvent) -> Option<ProgramRecord> {
        debug!("filtered {} ({reason})", event.label());
        self.stats.note(Admission::Rejected(reason));
        None
    }
}

/// Training-eligibility check: shopping, unknown or absent genres, and blank titles are rejected.
pub fn eligibility(record: &ProgramRecord) -> Option<RejectReason> {
    if record.major_genre_id == INFORMATION && record.middle_genre_id == INFORMATION_SHOPPING {
        Some(RejectReason::Shopping)
    } else if record.major_genre_id >= FIRST_UNKNOWN_MAJOR {
        Some(RejectReason::UnknownGenre)
    } else if record.genre_absent() {
        Some(RejectReason::GenreAbsent)
    } else if record.title.trim().is_empty() {
        Some(RejectReason::EmptyTitle)
    } else {
        None
    }
}

/// Deduplicated, weighted, classified candidate pool.
///
/// Records keep admission order; per-category candidate lists hold positions into that order.
/// Unclassified records stay in the pool but in no candidate list.
#[derive(Debug, Default)]
pub struct DatasetPool {
    records: IndexMap<ProgramId, ProgramRecord>,
    text_keys: HashSet<TextKey>,
    candidates: BTreeMap<ChannelCategory, Vec<usize>>,
    start_date: Option<DateTime<FixedOffset>>,
    end_date: Option<DateTime<FixedOffset>>,
    stats: IngestStats,
}

impl DatasetPool {
    /// Empty pool honouring the date range of `config`.
    pub fn new(config: &SubsetConfig) -> Self {
        Self {
            start_date: config.start_date,
            end_date: config.end_date,
            ..Self::default()
        }
    }

    /// Offer one record; accepted records get their weight set and lose their raw event.
    pub fn admit(&mut self, mut record: ProgramRecord) -> Admission {
        let admission = match self.screen(&record) {
            Some(reason) => {
                debug!("skipping {} ({reason})", record.id);
                Admission::Rejected(reason)
            }
            None => {
                self.text_keys.insert(record.text_key());
                record.weight = weight(&record);
                record.raw = None;
                let category = record.channel();
                let (position, _) = self.records.insert_full(record.id.clone(), record);
                if category != ChannelCategory::Unclassified {
                    self.candidates.entry(category).or_default().push(position);
                }
                Admission::Accepted
            }
        };
        self.stats.note(admission);
        admission
    }

    pub fn extend<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = ProgramRecord>,
    {
        for record in records {
            self.admit(record);
        }
    }

    fn screen(&self, record: &ProgramRecord) -> Option<RejectReason> {
        if let Some(reason) = eligibility(record) {
            return Some(reason);
        }
        if self.start_date.is_some_and(|start| record.start_time < start)
            || self.end_date.is_some_and(|end| record.start_time > end)
        {
            return Some(RejectReason::OutOfDateRange);
        }
        if self.records.contains_key(&record.id) {
            return Some(RejectReason::DuplicateId);
        }
        if self.text_keys.contains(&record.text_key()) {
            return Some(RejectReason::DuplicateText);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `position` in admission order.
    pub fn get(&self, position: usize) -> Option<&ProgramRecord> {
        self.records.get_index(position).map(|(_, record)| record)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgramRecord> {
        self.records.values()
    }

    /// Candidate positions for `category`, in admission order.
    pub fn candidates(&self, category: ChannelCategory) -> &[usize] {
        self.candidates
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Clone the records at `positions`; unknown positions are ignored.
    pub fn select(&self, positions: &[usize]) -> Vec<ProgramRecord> {
        positions
            .iter()
            .filter_map(|&position| self.get(position))
            .cloned()
            .collect()
    }
}
