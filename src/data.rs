use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelCategory;
use crate::constants::genre;
use crate::source::RawEvent;

pub use crate::types::{
    EventId, GenreId, NetworkId, ProgramId, ServiceId, TextKey, TransportStreamId,
};

/// Canonical program record produced by ingestion and written to dataset files.
///
/// `title`/`description` hold the formatted text and the `*_clean` fields the symbol-free text.
/// Annotation fields stay empty until a downstream annotator fills them in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// Stable, sortable program identifier (see [`crate::identity::assign_id`]).
    pub id: ProgramId,
    pub network_id: NetworkId,
    pub service_id: ServiceId,
    pub transport_stream_id: TransportStreamId,
    pub event_id: EventId,
    /// Broadcast start in UTC+9 civil time.
    pub start_time: DateTime<FixedOffset>,
    /// Duration in seconds.
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
    /// Formatted title.
    pub title: String,
    /// Formatted title with enclosed characters, marks, and branding removed.
    #[serde(rename = "title_without_symbols")]
    pub title_clean: String,
    /// Formatted description.
    pub description: String,
    /// Formatted description with enclosed characters, marks, and branding removed.
    #[serde(rename = "description_without_symbols")]
    pub description_clean: String,
    /// Major genre nibble, `-1` when absent.
    pub major_genre_id: GenreId,
    /// Middle genre nibble, `-1` when absent.
    pub middle_genre_id: GenreId,
    #[serde(default)]
    pub series_title: String,
    #[serde(default)]
    pub episode_number: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Source event the record was built from; kept in the dataset, dropped from subsets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawEvent>,
    /// Sampling weight; only meaningful inside a pool and never serialized.
    #[serde(skip)]
    pub weight: f64,
}

impl ProgramRecord {
    /// Channel category derived from the network/service ids.
    pub fn channel(&self) -> ChannelCategory {
        ChannelCategory::classify(self.network_id, self.service_id)
    }

    /// Key used to suppress re-broadcasts that carry different ids.
    pub fn text_key(&self) -> TextKey {
        (self.title.clone(), self.description.clone())
    }

    /// `true` when the source carried no content descriptor.
    pub fn genre_absent(&self) -> bool {
        self.major_genre_id == genre::ABSENT || self.middle_genre_id == genre::ABSENT
    }

    /// Year and month of the civil start time.
    pub fn start_month(&self) -> (i32, u32) {
        (self.start_time.year(), self.start_time.month())
    }

    /// Civil hour (0-23) of the start time.
    pub fn start_hour(&self) -> u32 {
        self.start_time.hour()
    }
}

/// Split the first content nibble into `(major, middle)` genre ids.
pub fn genre_ids(content_nibble: Option<u16>) -> (GenreId, GenreId) {
    match content_nibble {
        Some(nibble) => ((nibble >> 8) as GenreId, (nibble & 0xf) as GenreId),
        None => (genre::ABSENT, genre::ABSENT),
    }
}
