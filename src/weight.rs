//! Sampling weights from recency and genre/time-of-day rules.
//!
//! Weights only shape sampling probability; they never decide whether a record is eligible.

use crate::channel::{is_free_satellite, is_terrestrial};
use crate::constants::channel::{ATX_SERVICE_ID, CS2_NETWORK_ID};
use crate::constants::genre::{
    ANIME, ANIME_DOMESTIC, DOCUMENTARY, DRAMA, DRAMA_DOMESTIC, DRAMA_FOREIGN, HOBBY, MOVIE,
    MOVIE_ANIME, NEWS, NEWS_ROUTINE, SPORTS, VARIETY,
};
use crate::constants::weight::{
    ANCHOR_MONTH, ANCHOR_YEAR, ANIMATED_MOVIE_EXTRA, ATX_ANIME, DAYTIME_ANIME_HOURS,
    DAYTIME_DRAMA_HOURS, FOREIGN_DRAMA, HOBBY as HOBBY_MULTIPLIER, LATE_NIGHT_ANIME,
    MONTHS_PER_UNIT, MOVIE as MOVIE_MULTIPLIER, OTHER_DOMESTIC_DRAMA, ROUTINE_NEWS,
    TERRESTRIAL_DOCUMENTARY, TERRESTRIAL_DOMESTIC_DRAMA, TERRESTRIAL_SPORTS, TERRESTRIAL_VARIETY,
};
use crate::data::ProgramRecord;

/// Whole months between the anchor month and `(year, month)`, clamped at zero.
pub fn months_since_anchor(year: i32, month: u32) -> u32 {
    let months = (year - ANCHOR_YEAR) * 12 + month as i32 - ANCHOR_MONTH as i32;
    months.max(0) as u32
}

/// Linear recency weight: 1.0 at the anchor month, 2.0 sixty months later, unbounded above.
pub fn recency_weight(year: i32, month: u32) -> f64 {
    months_since_anchor(year, month) as f64 / MONTHS_PER_UNIT + 1.0
}

/// Genre/context multiplier; the first matching rule decides, unmatched records get `1.0`.
///
/// A matched rule may still contribute `1.0` (daytime drama and daytime anime), which stops
/// later rules from firing.
pub fn genre_multiplier(record: &ProgramRecord) -> f64 {
    let major = record.major_genre_id;
    let middle = record.middle_genre_id;
    let hour = record.start_hour();
    let terrestrial = is_terrestrial(record.network_id);
    let free_satellite = is_free_satellite(record.network_id, record.service_id);

    if major == NEWS && middle == NEWS_ROUTINE {
        ROUTINE_NEWS
    } else if major == SPORTS && terrestrial {
        TERRESTRIAL_SPORTS
    } else if major == DRAMA && middle == DRAMA_DOMESTIC && terrestrial {
        if DAYTIME_DRAMA_HOURS.contains(&hour) {
            1.0
        } else {
            TERRESTRIAL_DOMESTIC_DRAMA
        }
    } else if major == DRAMA && middle == DRAMA_DOMESTIC {
        OTHER_DOMESTIC_DRAMA
    } else if major == DRAMA && middle == DRAMA_FOREIGN {
        FOREIGN_DRAMA
    } else if major == VARIETY && terrestrial {
        TERRESTRIAL_VARIETY
    } else if major == MOVIE && (terrestrial || free_satellite) {
        if middle == MOVIE_ANIME {
            MOVIE_MULTIPLIER * ANIMATED_MOVIE_EXTRA
        } else {
            MOVIE_MULTIPLIER
        }
    } else if major == ANIME && middle == ANIME_DOMESTIC && (terrestrial || free_satellite) {
        if DAYTIME_ANIME_HOURS.contains(&hour) {
            1.0
        } else {
            LATE_NIGHT_ANIME
        }
    } else if major == DOCUMENTARY && terrestrial {
        TERRESTRIAL_DOCUMENTARY
    } else if major == HOBBY {
        HOBBY_MULTIPLIER
    } else if record.network_id == CS2_NETWORK_ID
        && record.service_id == ATX_SERVICE_ID
        && major == ANIME
    {
        ATX_ANIME
    } else {
        1.0
    }
}

/// Sampling weight of a record: recency weight times the genre/context multiplier.
pub fn weight(record: &ProgramRecord) -> f64 {
    let (year, month) = record.start_month();
    recency_weight(year, month) * genre_multiplier(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::jst;
    use chrono::TimeZone;

    fn record(
        network_id: u16,
        service_id: u16,
        genre: (i16, i16),
        ymdh: (i32, u32, u32, u32),
    ) -> ProgramRecord {
        let (year, month, day, hour) = ymdh;
        ProgramRecord {
            id: String::new(),
            network_id,
            service_id,
            transport_stream_id: 0,
            event_id: 0,
            start_time: jst().with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap(),
            duration_seconds: 1800,
            title: "t".into(),
            title_clean: "t".into(),
            description: String::new(),
            description_clean: String::new(),
            major_genre_id: genre.0,
            middle_genre_id: genre.1,
            series_title: String::new(),
            episode_number: None,
            subtitle: None,
            raw: None,
            weight: 0.0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn recency_is_anchored_at_october_2019() {
        assert!(close(recency_weight(2019, 10), 1.0));
        assert!(close(recency_weight(2018, 1), 1.0));
        assert!(close(recency_weight(2024, 10), 2.0));
        assert!(close(recency_weight(2029, 10), 3.0));
        assert_eq!(months_since_anchor(2020, 1), 3);
    }

    #[test]
    fn terrestrial_prime_time_domestic_drama_gets_drama_boost() {
        let drama = record(32742, 1072, (3, 0), (2024, 3, 5, 20));
        let months = ((2024 - 2019) * 12 + 3 - 10) as f64;
        assert!(close(weight(&drama), (months / 60.0 + 1.0) * 3.2));
    }

    #[test]
    fn daytime_terrestrial_drama_keeps_base_weight() {
        let at_four = record(32742, 1072, (3, 0), (2024, 3, 5, 4));
        let at_seventeen = record(32742, 1072, (3, 0), (2024, 3, 5, 17));
        let at_eighteen = record(32742, 1072, (3, 0), (2024, 3, 5, 18));
        assert!(close(genre_multiplier(&at_four), 1.0));
        assert!(close(genre_multiplier(&at_seventeen), 1.0));
        assert!(close(genre_multiplier(&at_eighteen), 3.2));
    }

    #[test]
    fn satellite_and_foreign_drama_are_damped() {
        assert!(close(genre_multiplier(&record(4, 141, (3, 0), (2022, 1, 1, 21))), 0.25));
        assert!(close(genre_multiplier(&record(32742, 1072, (3, 1), (2022, 1, 1, 21))), 0.25));
    }

    #[test]
    fn movie_rules_cover_terrestrial_and_free_bs_only() {
        assert!(close(genre_multiplier(&record(32742, 1072, (6, 0), (2022, 1, 1, 21))), 2.2));
        assert!(close(genre_multiplier(&record(4, 141, (6, 2), (2022, 1, 1, 21))), 2.2 * 1.7));
        assert!(close(genre_multiplier(&record(4, 200, (6, 0), (2022, 1, 1, 21))), 1.0));
        assert!(close(genre_multiplier(&record(6, 200, (6, 2), (2022, 1, 1, 21))), 1.0));
    }

    #[test]
    fn only_late_night_anime_is_boosted() {
        assert!(close(genre_multiplier(&record(32742, 1072, (7, 0), (2022, 1, 1, 1))), 2.2));
        assert!(close(genre_multiplier(&record(32742, 1072, (7, 0), (2022, 1, 1, 21))), 2.2));
        assert!(close(genre_multiplier(&record(32742, 1072, (7, 0), (2022, 1, 1, 20))), 1.0));
        assert!(close(genre_multiplier(&record(4, 141, (7, 0), (2022, 1, 1, 3))), 2.2));
    }

    #[test]
    fn atx_anime_rule_applies_on_cs2_service_333() {
        assert!(close(genre_multiplier(&record(7, 333, (7, 0), (2022, 1, 1, 1))), 1.3));
        assert!(close(genre_multiplier(&record(7, 333, (7, 1), (2022, 1, 1, 12))), 1.3));
        assert!(close(genre_multiplier(&record(7, 334, (7, 0), (2022, 1, 1, 1))), 1.0));
    }

    #[test]
    fn first_matching_rule_wins() {
        // Routine news on terrestrial never reaches later terrestrial rules.
        assert!(close(genre_multiplier(&record(32742, 1072, (0, 0), (2022, 1, 1, 12))), 0.7));
        assert!(close(genre_multiplier(&record(32742, 1072, (1, 3), (2022, 1, 1, 12))), 1.5));
        assert!(close(genre_multiplier(&record(4, 141, (1, 3), (2022, 1, 1, 12))), 1.0));
        assert!(close(genre_multiplier(&record(32742, 1072, (5, 0), (2022, 1, 1, 12))), 1.1));
        assert!(close(genre_multiplier(&record(32742, 1072, (8, 0), (2022, 1, 1, 12))), 1.1));
        assert!(close(genre_multiplier(&record(4, 141, (10, 0), (2022, 1, 1, 12))), 0.8));
        assert!(close(genre_multiplier(&record(32742, 1072, (4, 0), (2022, 1, 1, 12))), 1.0));
    }

    #[test]
    fn weights_are_positive() {
        for major in 0..=11 {
            for middle in 0..=15 {
                let r = record(32742, 1072, (major, middle), (2015, 1, 1, 12));
                assert!(weight(&r) > 0.0);
            }
        }
    }
}
