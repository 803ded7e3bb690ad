use rand::Rng;
use rand::seq::index;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::channel::ChannelCategory;
use crate::config::{GenreFloor, SubsetConfig};
use crate::ingestion::DatasetPool;

/// Seeded generator behind every random choice of subset construction.
///
/// One instance seeded from `--seed` drives every weighted draw of a run, genre-floor top-ups
/// included, so the same dataset and seed always give the same subset.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl rand::RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64_internal() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64_internal().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Draw up to `k` distinct indices of `weights` without replacement.
///
/// Each draw picks a remaining index with probability proportional to its weight, so the
/// probability of an ordered result is the product of `w_i / remaining_total` over its draws.
/// Implemented with exponential keys (`-ln(1 - u) / w`, smallest first) in `O(n log n)`.
///
/// Indices with zero, negative, or non-finite weight are never drawn; the result is shorter than
/// `k` when fewer positive weights exist.
pub fn weighted_sample_without_replacement<R: Rng + ?Sized>(
    weights: &[f64],
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    if k == 0 {
        return Vec::new();
    }
    let mut keyed: Vec<(f64, usize)> = weights
        .iter()
        .enumerate()
        .filter(|(_, weight)| weight.is_finite() && **weight > 0.0)
        .map(|(idx, weight)| {
            let u: f64 = rng.random();
            (-(1.0 - u).ln() / weight, idx)
        })
        .collect();
    if keyed.len() > k {
        keyed.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0));
        keyed.truncate(k);
    }
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, idx)| idx).collect()
}

/// Pool positions chosen by one sampling run, plus how they were obtained.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SamplingOutcome {
    /// Initial stratified draw size per sampled category.
    pub initial: BTreeMap<ChannelCategory, usize>,
    /// Records added by genre-floor correction.
    pub supplemented: usize,
    /// Records removed when the corrected subset exceeded the target size.
    pub downsampled: usize,
    /// Selected pool positions, in draw order (categories concatenated, then supplements).
    pub selected: Vec<usize>,
}

impl SamplingOutcome {
    /// Size of the stratified draw before correction.
    pub fn initial_total(&self) -> usize {
        self.initial.values().sum()
    }
}

/// Stratified weighted sampler over a [`DatasetPool`].
///
/// One weighted draw without replacement per sampled channel category, sized
/// `floor(subset_size * proportion)`, followed by the optional genre-floor correction.
pub struct SubsetSampler<'a> {
    config: &'a SubsetConfig,
}

impl<'a> SubsetSampler<'a> {
    pub fn new(config: &'a SubsetConfig) -> Self {
        Self { config }
    }

    pub fn sample<R: Rng + ?Sized>(&self, pool: &DatasetPool, rng: &mut R) -> SamplingOutcome {
        let mut outcome = SamplingOutcome::default();
        for category in ChannelCategory::SAMPLED {
            let target = self
                .config
                .proportions
                .target_count(category, self.config.subset_size);
            let drawn = self.draw(pool, pool.candidates(category), target, rng);
            info!(
                "sampled {} of {} {} candidates (target {target})",
                drawn.len(),
                pool.candidates(category).len(),
                category
            );
            outcome.initial.insert(category, drawn.len());
            outcome.selected.extend(drawn);
        }

        for floor in &self.config.genre_floors {
            outcome.supplemented += self.apply_floor(pool, floor, &mut outcome.selected, rng);
        }

        if outcome.selected.len() > self.config.subset_size {
            let before = outcome.selected.len();
            let mut keep = index::sample(rng, before, self.config.subset_size).into_vec();
            keep.sort_unstable();
            let kept: Vec<usize> = keep.into_iter().map(|pos| outcome.selected[pos]).collect();
            outcome.selected = kept;
            outcome.downsampled = before - outcome.selected.len();
            info!(
                "downsampled corrected subset from {before} to {}",
                outcome.selected.len()
            );
        }
        outcome
    }

    /// Weighted draw of up to `target` positions from `candidates`.
    fn draw<R: Rng + ?Sized>(
        &self,
        pool: &DatasetPool,
        candidates: &[usize],
        target: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&position| pool.get(position).map_or(0.0, |record| record.weight))
            .collect();
        weighted_sample_without_replacement(&weights, target, rng)
            .into_iter()
            .map(|idx| candidates[idx])
            .collect()
    }

    /// Top up `selected` toward the floor of one genre; returns how many records were added.
    ///
    /// The deficit is split across categories by their proportions (rounded up) and drawn from
    /// records of that genre not yet selected. Small pools contribute what they have.
    fn apply_floor<R: Rng + ?Sized>(
        &self,
        pool: &DatasetPool,
        floor: &GenreFloor,
        selected: &mut Vec<usize>,
        rng: &mut R,
    ) -> usize {
        let target = floor.target_count(self.config.subset_size);
        let present = selected
            .iter()
            .filter_map(|&position| pool.get(position))
            .filter(|record| floor.genre.matches(record))
            .count();
        if present >= target {
            debug!("genre {} already at {present}/{target}", floor.genre);
            return 0;
        }
        let deficit = target - present;
        let chosen: HashSet<usize> = selected.iter().copied().collect();
        let mut added = 0;
        for category in ChannelCategory::SAMPLED {
            let extra = (deficit as f64 * self.config.proportions.for_category(category)).ceil()
                as usize;
            if extra == 0 {
                continue;
            }
            let unused: Vec<usize> = pool
                .candidates(category)
                .iter()
                .copied()
                .filter(|position| !chosen.contains(position))
                .filter(|&position| {
                    pool.get(position)
                        .is_some_and(|record| floor.genre.matches(record))
                })
                .collect();
            let drawn = self.draw(pool, &unused, extra, rng);
            added += drawn.len();
            selected.extend(drawn);
        }
        info!(
            "genre {} below floor ({present}/{target}); added {added}",
            floor.genre
        );
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryProportions, GenreSelector};
    use crate::data::ProgramRecord;
    use crate::source::jst;
    use chrono::TimeZone;

    fn record(seq: usize, network_id: u16, major: i16) -> ProgramRecord {
        ProgramRecord {
            id: format!("202401010000-NID{network_id:05}-SID01024-EID{seq:05}"),
            network_id,
            service_id: 1024,
            transport_stream_id: network_id,
            event_id: seq as u16,
            start_time: jst().with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            duration_seconds: 1800,
            title: format!("番組{seq}"),
            title_clean: format!("番組{seq}"),
            description: String::new(),
            description_clean: String::new(),
            major_genre_id: major,
            middle_genre_id: 0,
            series_title: String::new(),
            episode_number: None,
            subtitle: None,
            raw: None,
            weight: 0.0,
        }
    }

    /// `terrestrial`/`free`/`paid` records of genre `variety` plus `anime` terrestrial anime records.
    fn pool(terrestrial: usize, free: usize, paid: usize, anime: usize) -> DatasetPool {
        let mut pool = DatasetPool::default();
        let mut seq = 0;
        let mut push = |pool: &mut DatasetPool, network_id: u16, major: i16| {
            seq += 1;
            pool.admit(record(seq, network_id, major));
        };
        for _ in 0..terrestrial {
            push(&mut pool, 32742, 5);
        }
        for _ in 0..free {
            push(&mut pool, 4, 5);
        }
        for _ in 0..paid {
            push(&mut pool, 6, 5);
        }
        for _ in 0..anime {
            push(&mut pool, 32742, 7);
        }
        pool
    }

    #[test]
    fn deterministic_rng_is_reproducible() {
        let mut a = DeterministicRng::new(42);
        let mut b = DeterministicRng::new(42);
        let xs: Vec<u64> = (0..8).map(|_| a.random()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
        let other: Vec<u64> = {
            let mut c = DeterministicRng::new(43);
            (0..8).map(|_| c.random()).collect()
        };
        assert_ne!(xs, other);
    }

    #[test]
    fn weighted_sample_returns_min_k_n_distinct_indices() {
        let mut rng = DeterministicRng::new(7);
        let weights = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let drawn = weighted_sample_without_replacement(&weights, 3, &mut rng);
        assert_eq!(drawn.len(), 3);
        let unique: HashSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), 3);

        let all = weighted_sample_without_replacement(&weights, 10, &mut rng);
        let mut sorted = all.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);

        assert!(weighted_sample_without_replacement(&weights, 0, &mut rng).is_empty());
        assert!(weighted_sample_without_replacement(&[], 3, &mut rng).is_empty());
    }

    #[test]
    fn zero_and_invalid_weights_are_never_drawn() {
        let mut rng = DeterministicRng::new(11);
        let weights = vec![0.0, 1.0, -2.0, f64::NAN, 3.0, 0.0];
        for _ in 0..50 {
            let mut drawn = weighted_sample_without_replacement(&weights, 6, &mut rng);
            drawn.sort_unstable();
            assert_eq!(drawn, vec![1, 4]);
        }
        assert!(weighted_sample_without_replacement(&[0.0, 0.0], 2, &mut rng).is_empty());
    }

    #[test]
    fn first_draw_is_proportional_to_weight() {
        let mut rng = DeterministicRng::new(1234);
        let weights = vec![1.0, 3.0];
        let trials = 20_000;
        let heavy_first = (0..trials)
            .filter(|_| weighted_sample_without_replacement(&weights, 1, &mut rng)[0] == 1)
            .count();
        let share = heavy_first as f64 / trials as f64;
        assert!((share - 0.75).abs() < 0.02, "share was {share}");
    }

    #[test]
    fn second_draw_follows_remaining_weight() {
        // P(order = [0, 1]) = 1/6 * 2/5 for weights 1, 2, 3.
        let mut rng = DeterministicRng::new(99);
        let weights = vec![1.0, 2.0, 3.0];
        let trials = 30_000;
        let hits = (0..trials)
            .filter(|_| weighted_sample_without_replacement(&weights, 2, &mut rng) == [0, 1])
            .count();
        let share = hits as f64 / trials as f64;
        assert!((share - 1.0 / 15.0).abs() < 0.01, "share was {share}");
    }

    #[test]
    fn stratified_draw_respects_targets_and_disjointness() {
        let pool = pool(100, 100, 100, 0);
        let config = SubsetConfig {
            subset_size: 40,
            ..SubsetConfig::default()
        };
        let mut rng = DeterministicRng::new(42);
        let outcome = SubsetSampler::new(&config).sample(&pool, &mut rng);
        assert_eq!(outcome.initial[&ChannelCategory::Terrestrial], 26);
        assert_eq!(outcome.initial[&ChannelCategory::FreeSatellite], 10);
        assert_eq!(outcome.initial[&ChannelCategory::PaidSatelliteOrCable], 4);
        assert_eq!(outcome.selected.len(), 40);
        let unique: HashSet<_> = outcome.selected.iter().collect();
        assert_eq!(unique.len(), 40);
        for &position in &outcome.selected[..26] {
            assert_eq!(pool.get(position).unwrap().channel(), ChannelCategory::Terrestrial);
        }
    }

    #[test]
    fn small_and_empty_categories_contribute_what_they_have() {
        let pool = pool(3, 0, 1, 0);
        let config = SubsetConfig {
            subset_size: 100,
            ..SubsetConfig::default()
        };
        let mut rng = DeterministicRng::new(5);
        let outcome = SubsetSampler::new(&config).sample(&pool, &mut rng);
        assert_eq!(outcome.initial[&ChannelCategory::Terrestrial], 3);
        assert_eq!(outcome.initial[&ChannelCategory::FreeSatellite], 0);
        assert_eq!(outcome.initial[&ChannelCategory::PaidSatelliteOrCable], 1);
        assert_eq!(outcome.selected.len(), 4);
    }

    #[test]
    fn initial_draw_is_bounded_by_category_targets() {
        let pool = pool(50, 50, 50, 50);
        let config = SubsetConfig {
            subset_size: 33,
            proportions: CategoryProportions {
                terrestrial: 0.5,
                free_satellite: 0.3,
                paid_satellite_or_cable: 0.2,
            },
            ..SubsetConfig::default()
        };
        let mut rng = DeterministicRng::new(8);
        let outcome = SubsetSampler::new(&config).sample(&pool, &mut rng);
        // floor(16.5) + floor(9.9) + floor(6.6)
        assert_eq!(outcome.initial_total(), 16 + 9 + 6);
        assert!(outcome.initial_total() <= config.subset_size);
    }

    #[test]
    fn genre_floor_tops_up_and_keeps_subset_size() {
        // Anime is 10 of 210 terrestrial candidates; a 30% floor forces supplementation.
        let pool = pool(200, 100, 100, 10);
        let config = SubsetConfig {
            subset_size: 20,
            proportions: CategoryProportions {
                terrestrial: 1.0,
                free_satellite: 0.0,
                paid_satellite_or_cable: 0.0,
            },
            genre_floors: vec![GenreFloor {
                genre: GenreSelector {
                    major: 7,
                    middle: None,
                },
                fraction: 0.3,
            }],
            ..SubsetConfig::default()
        };
        let mut rng = DeterministicRng::new(21);
        let outcome = SubsetSampler::new(&config).sample(&pool, &mut rng);
        assert!(outcome.supplemented > 0);
        assert_eq!(outcome.selected.len(), 20);
        assert_eq!(outcome.downsampled, outcome.supplemented);
        let unique: HashSet<_> = outcome.selected.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn genre_floor_is_best_effort_when_pool_is_small() {
        let pool = pool(40, 0, 0, 2);
        let config = SubsetConfig {
            subset_size: 10,
            proportions: CategoryProportions {
                terrestrial: 1.0,
                free_satellite: 0.0,
                paid_satellite_or_cable: 0.0,
            },
            genre_floors: vec![GenreFloor {
                genre: GenreSelector {
                    major: 7,
                    middle: Some(0),
                },
                fraction: 0.5,
            }],
            ..SubsetConfig::default()
        };
        let mut rng = DeterministicRng::new(3);
        let outcome = SubsetSampler::new(&config).sample(&pool, &mut rng);
        assert_eq!(outcome.initial_total(), 10);
        assert!(outcome.supplemented <= 2);
        assert_eq!(outcome.selected.len(), 10);
    }

    #[test]
    fn same_seed_same_subset() {
        let pool = pool(80, 40, 20, 5);
        let config = SubsetConfig {
            subset_size: 30,
            ..SubsetConfig::default()
        };
        let first = SubsetSampler::new(&config).sample(&pool, &mut DeterministicRng::new(42));
        let second = SubsetSampler::new(&config).sample(&pool, &mut DeterministicRng::new(42));
        assert_eq!(first, second);
    }
}
