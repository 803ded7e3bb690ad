use chrono::{DateTime, FixedOffset, TimeDelta};
use std::fmt;
use std::str::FromStr;

use crate::channel::ChannelCategory;
use crate::constants::ingestion::{DEFAULT_INCLUDE_NETWORK_IDS, DEFAULT_WINDOW_DAYS};
use crate::constants::sampler::{
    DEFAULT_SEED, DEFAULT_SUBSET_SIZE, FREE_SATELLITE_PROPORTION,
    PAID_SATELLITE_OR_CABLE_PROPORTION, TERRESTRIAL_PROPORTION,
};
use crate::data::ProgramRecord;
use crate::errors::DatasetError;
use crate::types::{GenreId, NetworkId};

/// Controls which raw events become dataset records and how acquisition is windowed.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Original network ids accepted during ingestion.
    pub include_network_ids: Vec<NetworkId>,
    /// Maximum span of a single acquisition window.
    pub window: TimeDelta,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_network_ids: DEFAULT_INCLUDE_NETWORK_IDS.to_vec(),
            window: TimeDelta::days(DEFAULT_WINDOW_DAYS),
        }
    }
}

impl IngestConfig {
    /// Reject empty allow-lists and non-positive windows.
    pub fn validated(self) -> Result<Self, DatasetError> {
        if self.include_network_ids.is_empty() {
            return Err(DatasetError::Configuration(
                "include_network_ids must not be empty".to_string(),
            ));
        }
        if self.window <= TimeDelta::zero() {
            return Err(DatasetError::Configuration(
                "acquisition window must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Target share of the subset drawn from each sampled channel category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryProportions {
    pub terrestrial: f64,
    pub free_satellite: f64,
    pub paid_satellite_or_cable: f64,
}

impl Default for CategoryProportions {
    fn default() -> Self {
        Self {
            terrestrial: TERRESTRIAL_PROPORTION,
            free_satellite: FREE_SATELLITE_PROPORTION,
            paid_satellite_or_cable: PAID_SATELLITE_OR_CABLE_PROPORTION,
        }
    }
}

impl CategoryProportions {
    /// Proportion for `category`; unclassified channels are never sampled.
    pub fn for_category(&self, category: ChannelCategory) -> f64 {
        match category {
            ChannelCategory::Terrestrial => self.terrestrial,
            ChannelCategory::FreeSatellite => self.free_satellite,
            ChannelCategory::PaidSatelliteOrCable => self.paid_satellite_or_cable,
            ChannelCategory::Unclassified => 0.0,
        }
    }

    /// Per-category target count, `floor(subset_size * proportion)`.
    pub fn target_count(&self, category: ChannelCategory, subset_size: usize) -> usize {
        (subset_size as f64 * self.for_category(category)).floor() as usize
    }

    /// Validate that every proportion is within `[0, 1]` and the sum does not exceed `1.0`.
    pub fn validated(self) -> Result<Self, DatasetError> {
        let values = [
            self.terrestrial,
            self.free_satellite,
            self.paid_satellite_or_cable,
        ];
        if values.iter().any(|value| !(0.0..=1.0).contains(value)) {
            return Err(DatasetError::Configuration(
                "category proportions must be within [0, 1]".to_string(),
            ));
        }
        if values.iter().sum::<f64>() > 1.0 + 1e-6 {
            return Err(DatasetError::Configuration(
                "category proportions must not sum above 1.0".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Selects a major genre, optionally narrowed to one middle genre.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GenreSelector {
    pub major: GenreId,
    pub middle: Option<GenreId>,
}

impl GenreSelector {
    pub fn matches(&self, record: &ProgramRecord) -> bool {
        record.major_genre_id == self.major
            && self
                .middle
                .is_none_or(|middle| record.middle_genre_id == middle)
    }
}

impl FromStr for GenreSelector {
    type Err = String;

    /// Parse `MAJOR` or `MAJOR:MIDDLE` (decimal or `0x` hex).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (major, middle) = match raw.split_once(':') {
            Some((major, middle)) => (major, Some(middle)),
            None => (raw, None),
        };
        let major = parse_genre_id(major)?;
        let middle = middle.map(parse_genre_id).transpose()?;
        Ok(Self { major, middle })
    }
}

impl fmt::Display for GenreSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.middle {
            Some(middle) => write!(f, "{}:{}", self.major, middle),
            None => write!(f, "{}", self.major),
        }
    }
}

fn parse_genre_id(raw: &str) -> Result<GenreId, String> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(hex) => GenreId::from_str_radix(hex, 16),
        None => trimmed.parse::<GenreId>(),
    };
    match parsed {
        Ok(value) if (0..=0xF).contains(&value) => Ok(value),
        _ => Err(format!("invalid genre id '{trimmed}': expected 0-15")),
    }
}

/// Minimum share of the subset reserved for one genre (best-effort).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenreFloor {
    pub genre: GenreSelector,
    /// Fraction of `subset_size`; the floor is `floor(subset_size * fraction)` records.
    pub fraction: f64,
}

impl GenreFloor {
    pub fn target_count(&self, subset_size: usize) -> usize {
        (subset_size as f64 * self.fraction).floor() as usize
    }
}

/// Subset construction settings.
#[derive(Clone, Debug)]
pub struct SubsetConfig {
    /// Overall number of records in the subset.
    pub subset_size: usize,
    /// Channel-category split of `subset_size`.
    pub proportions: CategoryProportions,
    /// Genres whose representation is topped up after the initial draw; empty disables correction.
    pub genre_floors: Vec<GenreFloor>,
    /// Drop records starting before this instant.
    pub start_date: Option<DateTime<FixedOffset>>,
    /// Drop records starting after this instant.
    pub end_date: Option<DateTime<FixedOffset>>,
    /// RNG seed used by the pipeline and CLI.
    pub seed: u64,
}

impl Default for SubsetConfig {
    fn default() -> Self {
        Self {
            subset_size: DEFAULT_SUBSET_SIZE,
            proportions: CategoryProportions::default(),
            genre_floors: Vec::new(),
            start_date: None,
            end_date: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl SubsetConfig {
    /// Validate proportions, floors, and the date range.
    pub fn validated(mut self) -> Result<Self, DatasetError> {
        self.proportions = self.proportions.validated()?;
        if self
            .genre_floors
            .iter()
            .any(|floor| !(0.0..=1.0).contains(&floor.fraction))
        {
            return Err(DatasetError::Configuration(
                "genre floor fractions must be within [0, 1]".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(DatasetError::Configuration(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok(self)
    }
}
