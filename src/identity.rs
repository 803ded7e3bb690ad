//! Deterministic program identifiers.

use chrono::{DateTime, FixedOffset};

use crate::constants::ingestion::ID_TIME_FORMAT;
use crate::source::jst;
use crate::types::{EventId, NetworkId, ProgramId, ServiceId};

/// Build the canonical id `YYYYMMDDHHMM-NID{onid:05}-SID{sid:05}-EID{eid:05}`.
///
/// The start time is rendered in UTC+9 civil time at minute resolution, so ids sort
/// chronologically and then by network/service/event for same-minute ties.
pub fn assign_id(
    start_time: &DateTime<FixedOffset>,
    network_id: NetworkId,
    service_id: ServiceId,
    event_id: EventId,
) -> ProgramId {
    format!(
        "{}-NID{:05}-SID{:05}-EID{:05}",
        start_time.with_timezone(&jst()).format(ID_TIME_FORMAT),
        network_id,
        service_id,
        event_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builds_fixed_width_id() {
        let start = jst().with_ymd_and_hms(2021, 10, 23, 1, 53, 0).unwrap();
        assert_eq!(
            assign_id(&start, 32742, 1072, 27730),
            "202110230153-NID32742-SID01072-EID27730"
        );
    }

    #[test]
    fn truncates_seconds_and_pads_small_ids() {
        let start = jst().with_ymd_and_hms(2023, 1, 1, 12, 30, 59).unwrap();
        assert_eq!(
            assign_id(&start, 4, 211, 7),
            "202301011230-NID00004-SID00211-EID00007"
        );
    }

    #[test]
    fn same_inputs_yield_same_id() {
        let a = jst().with_ymd_and_hms(2022, 5, 5, 20, 0, 1).unwrap();
        let b = jst().with_ymd_and_hms(2022, 5, 5, 20, 0, 45).unwrap();
        assert_eq!(assign_id(&a, 32736, 1024, 535), assign_id(&b, 32736, 1024, 535));
    }

    #[test]
    fn other_offsets_are_rendered_in_jst() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let start = utc.with_ymd_and_hms(2021, 10, 22, 16, 53, 0).unwrap();
        assert_eq!(
            assign_id(&start, 32742, 1072, 27730),
            "202110230153-NID32742-SID01072-EID27730"
        );
    }

    #[test]
    fn lexicographic_order_follows_start_time() {
        let early = jst().with_ymd_and_hms(2022, 9, 30, 23, 59, 0).unwrap();
        let late = jst().with_ymd_and_hms(2022, 10, 1, 0, 0, 0).unwrap();
        assert!(assign_id(&early, 32742, 9, 9) < assign_id(&late, 4, 1, 1));
    }
}
