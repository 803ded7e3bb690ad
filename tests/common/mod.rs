#![allow(dead_code)]

use std::path::Path;

use epg_dataset::source::{
    ContentInfo, ContentNibble, RawEvent, ServiceEvents, ServiceInfo, ShortInfo, TimeWindow,
    parse_jst_datetime,
};
use epg_dataset::transport::write_jsonl;

pub const TERRESTRIAL_EVENTS: usize = 60;
pub const FREE_BS_EVENTS: usize = 30;
pub const PAID_BS_EVENTS: usize = 15;
/// Shopping, unknown genre, absent genre, blank title.
pub const INELIGIBLE_EVENTS: usize = 4;
/// Copy of the first terrestrial program re-broadcast on free BS.
pub const REBROADCAST_EVENTS: usize = 1;
pub const NON_TV_EVENTS: usize = 5;
pub const EXCLUDED_NETWORK_EVENTS: usize = 3;
pub const MISSING_SHORT_INFO_EVENTS: usize = 2;

pub const ACCEPTED_EVENTS: usize = TERRESTRIAL_EVENTS
    + FREE_BS_EVENTS
    + PAID_BS_EVENTS
    + INELIGIBLE_EVENTS
    + REBROADCAST_EVENTS;

const ROTATING_GENRES: [u16; 4] = [0x0300, 0x0700, 0x0500, 0x0000];

pub fn event(
    onid: u16,
    sid: u16,
    eid: u16,
    day: usize,
    hour: usize,
    text: Option<(&str, &str)>,
    nibble: Option<u16>,
) -> RawEvent {
    RawEvent {
        onid,
        tsid: onid,
        sid,
        eid,
        start_time: Some(format!("2024-01-{day:02}T{hour:02}:00:00")),
        duration_sec: Some(1800),
        short_info: text.map(|(title, description)| ShortInfo {
            event_name: title.to_string(),
            text_char: description.to_string(),
        }),
        content_info: nibble.map(|content_nibble| ContentInfo {
            nibble_list: vec![ContentNibble {
                content_nibble,
                user_nibble: 0,
            }],
        }),
    }
}

fn tv_service(onid: u16, sid: u16, event_list: Vec<RawEvent>) -> ServiceEvents {
    ServiceEvents {
        service_info: ServiceInfo {
            onid: Some(onid),
            tsid: Some(onid),
            sid: Some(sid),
            service_type: 0x01,
            service_name: None,
        },
        event_list,
    }
}

/// Guide groups spanning 2024-01-01 .. 2024-01-21 (UTC+9).
pub fn guide_groups() -> Vec<ServiceEvents> {
    let mut terrestrial: Vec<RawEvent> = (0..TERRESTRIAL_EVENTS)
        .map(|i| {
            let title = format!("番組{i}");
            let description = format!("説明{i}");
            event(
                32742,
                1072,
                i as u16 + 1,
                1 + i % 20,
                i % 24,
                Some((title.as_str(), description.as_str())),
                Some(ROTATING_GENRES[i % 4]),
            )
        })
        .collect();
    terrestrial.push(event(32742, 1072, 3001, 2, 10, Some(("通販", "特価")), Some(0x0204)));
    terrestrial.push(event(32742, 1072, 3002, 3, 10, Some(("予備", "拡張")), Some(0x0C00)));
    terrestrial.push(event(32742, 1072, 3003, 4, 10, Some(("不明", "なし")), None));
    terrestrial.push(event(32742, 1072, 3004, 5, 10, Some(("", "空")), Some(0x0500)));
    for eid in 5001..5001 + MISSING_SHORT_INFO_EVENTS as u16 {
        terrestrial.push(event(32742, 1072, eid, 6, 10, None, Some(0x0500)));
    }

    let mut free_bs: Vec<RawEvent> = (0..FREE_BS_EVENTS)
        .map(|i| {
            let title = format!("BS番組{i}");
            let description = format!("BS説明{i}");
            event(
                4,
                141,
                1000 + i as u16,
                1 + i % 20,
                (i * 5) % 24,
                Some((title.as_str(), description.as_str())),
                Some(ROTATING_GENRES[i % 4]),
            )
        })
        .collect();
    free_bs.push(event(4, 141, 4001, 10, 12, Some(("番組0", "説明0")), Some(0x0300)));

    let paid_bs: Vec<RawEvent> = (0..PAID_BS_EVENTS)
        .map(|i| {
            let title = format!("有料番組{i}");
            let description = format!("有料説明{i}");
            event(
                4,
                200,
                2000 + i as u16,
                1 + i % 20,
                (i * 7) % 24,
                Some((title.as_str(), description.as_str())),
                Some(0x0300),
            )
        })
        .collect();

    let excluded: Vec<RawEvent> = (0..EXCLUDED_NETWORK_EVENTS)
        .map(|i| {
            event(32720, 1024, i as u16 + 1, 3, 20, Some(("地方局", "説明")), Some(0x0500))
        })
        .collect();

    let non_tv = ServiceEvents {
        service_info: ServiceInfo {
            onid: Some(32742),
            tsid: Some(32742),
            sid: Some(1080),
            service_type: 0xC0,
            service_name: Some("データ".into()),
        },
        event_list: (0..NON_TV_EVENTS)
            .map(|i| event(32742, 1080, i as u16 + 1, 7, 9, Some(("データ放送", "")), Some(0x0500)))
            .collect(),
    };

    vec![
        tv_service(32742, 1072, terrestrial),
        tv_service(4, 141, free_bs),
        tv_service(4, 200, paid_bs),
        tv_service(32720, 1024, excluded),
        non_tv,
    ]
}

pub fn write_guide_dump(path: &Path) {
    write_jsonl(path, &guide_groups()).unwrap();
}

pub fn guide_range() -> TimeWindow {
    TimeWindow::new(
        parse_jst_datetime("2024-01-01").unwrap(),
        parse_jst_datetime("2024-01-21").unwrap(),
    )
}
