use chrono::Datelike;
use std::collections::BTreeMap;
use std::fmt;

use crate::channel::ChannelCategory;
use crate::config::CategoryProportions;
use crate::constants::genre::MAJOR_GENRE_NAMES;
use crate::data::ProgramRecord;
use crate::types::{GenreId, MonthKey};

/// Count and share of one bucket in a composition report.
#[derive(Clone, Debug, PartialEq)]
pub struct Share<K> {
    pub key: K,
    pub count: usize,
    /// `count / total`, `0.0` for an empty subset.
    pub share: f64,
}

/// Breakdown of a finished subset, buckets sorted by key.
#[derive(Clone, Debug, PartialEq)]
pub struct SubsetComposition {
    pub total: usize,
    /// Sampled categories only; all three are always present.
    pub channels: Vec<Share<ChannelCategory>>,
    pub years: Vec<Share<i32>>,
    pub months: Vec<Share<MonthKey>>,
    pub major_genres: Vec<Share<GenreId>>,
    pub middle_genres: Vec<Share<(GenreId, GenreId)>>,
}

/// Compute channel, year, month, and genre composition of `records`.
pub fn subset_composition(records: &[ProgramRecord]) -> SubsetComposition {
    let total = records.len();
    let mut channels: BTreeMap<ChannelCategory, usize> = ChannelCategory::SAMPLED
        .iter()
        .map(|category| (*category, 0))
        .collect();
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    let mut months: BTreeMap<MonthKey, usize> = BTreeMap::new();
    let mut major_genres: BTreeMap<GenreId, usize> = BTreeMap::new();
    let mut middle_genres: BTreeMap<(GenreId, GenreId), usize> = BTreeMap::new();
    for record in records {
        if let Some(count) = channels.get_mut(&record.channel()) {
            *count += 1;
        }
        *years.entry(record.start_time.year()).or_default() += 1;
        *months
            .entry(record.start_time.format("%Y-%m").to_string())
            .or_default() += 1;
        *major_genres.entry(record.major_genre_id).or_default() += 1;
        *middle_genres
            .entry((record.major_genre_id, record.middle_genre_id))
            .or_default() += 1;
    }
    SubsetComposition {
        total,
        channels: shares(channels, total),
        years: shares(years, total),
        months: shares(months, total),
        major_genres: shares(major_genres, total),
        middle_genres: shares(middle_genres, total),
    }
}

fn shares<K>(counts: BTreeMap<K, usize>, total: usize) -> Vec<Share<K>> {
    counts
        .into_iter()
        .map(|(key, count)| Share {
            key,
            count,
            share: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            },
        })
        .collect()
}

/// ARIB major genre name, or `"不明"` outside `0..=15`.
pub fn major_genre_name(genre: GenreId) -> &'static str {
    usize::try_from(genre)
        .ok()
        .and_then(|idx| MAJOR_GENRE_NAMES.get(idx).copied())
        .unwrap_or("不明")
}

/// Difference between the realised and the configured share per sampled category.
///
/// Positive values mean the category is over-represented in the subset.
pub fn category_drift(
    composition: &SubsetComposition,
    proportions: &CategoryProportions,
) -> Vec<(ChannelCategory, f64)> {
    composition
        .channels
        .iter()
        .map(|entry| (entry.key, entry.share - proportions.for_category(entry.key)))
        .collect()
}

impl fmt::Display for SubsetComposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(80);
        writeln!(f, "{rule}")?;
        writeln!(f, "subset size: {}", self.total)?;
        writeln!(f, "{rule}")?;
        for entry in &self.channels {
            writeln!(
                f,
                "{}: {: >4} ({:.2}%)",
                entry.key,
                entry.count,
                entry.share * 100.0
            )?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "by year:")?;
        for entry in &self.years {
            writeln!(f, "  {}: {: >4} ({:.2}%)", entry.key, entry.count, entry.share * 100.0)?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "by month:")?;
        for entry in &self.months {
            writeln!(f, "  {}: {: >4} ({:.2}%)", entry.key, entry.count, entry.share * 100.0)?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "by major genre:")?;
        for entry in &self.major_genres {
            writeln!(
                f,
                "  {}: {: >4} ({:.2}%)",
                major_genre_name(entry.key),
                entry.count,
                entry.share * 100.0
            )?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f, "by middle genre:")?;
        for entry in &self.middle_genres {
            let (major, middle) = entry.key;
            writeln!(
                f,
                "  {} - 0x{:X}: {: >4} ({:.2}%)",
                major_genre_name(major),
                middle,
                entry.count,
                entry.share * 100.0
            )?;
        }
        Ok(())
    }
}
