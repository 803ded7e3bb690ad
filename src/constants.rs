/// Constants used by channel classification (ARIB network/service numbering).
pub mod channel {
    use std::ops::RangeInclusive;

    /// Original network ids assigned to terrestrial broadcasters.
    pub const TERRESTRIAL_NETWORK_IDS: RangeInclusive<u16> = 0x7880..=0x7FE8;
    /// Original network id of BS digital.
    pub const BS_NETWORK_ID: u16 = 0x0004;
    /// Original network id of CS1 (110-degree CS).
    pub const CS1_NETWORK_ID: u16 = 0x0006;
    /// Original network id of CS2 (110-degree CS).
    pub const CS2_NETWORK_ID: u16 = 0x0007;
    /// BS service id ranges carrying pay channels.
    pub const PAID_BS_SERVICE_IDS: [RangeInclusive<u16>; 2] = [191..=209, 234..=256];
    /// AT-X service id on CS2.
    pub const ATX_SERVICE_ID: u16 = 333;
}

/// ARIB content nibble codes used by filtering and weighting.
pub mod genre {
    /// Major genre: news / reports.
    pub const NEWS: i16 = 0x0;
    /// Major genre: sports.
    pub const SPORTS: i16 = 0x1;
    /// Major genre: information / wide shows.
    pub const INFORMATION: i16 = 0x2;
    /// Major genre: drama.
    pub const DRAMA: i16 = 0x3;
    /// Major genre: variety.
    pub const VARIETY: i16 = 0x5;
    /// Major genre: movies.
    pub const MOVIE: i16 = 0x6;
    /// Major genre: anime / tokusatsu.
    pub const ANIME: i16 = 0x7;
    /// Major genre: documentary / culture.
    pub const DOCUMENTARY: i16 = 0x8;
    /// Major genre: hobby / education.
    pub const HOBBY: i16 = 0xA;
    /// Major genre ids at or above this value are reserved/extension codes.
    pub const FIRST_UNKNOWN_MAJOR: i16 = 0xC;
    /// Sentinel used when the source carries no content descriptor.
    pub const ABSENT: i16 = -1;

    /// Middle genre of `NEWS`: routine news.
    pub const NEWS_ROUTINE: i16 = 0x0;
    /// Middle genre of `INFORMATION`: shopping / infomercials.
    pub const INFORMATION_SHOPPING: i16 = 0x4;
    /// Middle genre of `DRAMA`: domestic drama.
    pub const DRAMA_DOMESTIC: i16 = 0x0;
    /// Middle genre of `DRAMA`: foreign drama.
    pub const DRAMA_FOREIGN: i16 = 0x1;
    /// Middle genre of `MOVIE`: animated movies.
    pub const MOVIE_ANIME: i16 = 0x2;
    /// Middle genre of `ANIME`: domestic anime.
    pub const ANIME_DOMESTIC: i16 = 0x0;

    /// ARIB STD-B10 major genre names, indexed by major genre id.
    pub const MAJOR_GENRE_NAMES: [&str; 16] = [
        "ニュース／報道",
        "スポーツ",
        "情報／ワイドショー",
        "ドラマ",
        "音楽",
        "バラエティ",
        "映画",
        "アニメ／特撮",
        "ドキュメンタリー／教養",
        "劇場／公演",
        "趣味／教育",
        "福祉",
        "予備",
        "予備",
        "拡張",
        "その他",
    ];
}

/// Constants used by the recency/genre weight model.
pub mod weight {
    /// Year of the recency anchor month (weight 1.0).
    pub const ANCHOR_YEAR: i32 = 2019;
    /// Month of the recency anchor month (weight 1.0).
    pub const ANCHOR_MONTH: u32 = 10;
    /// Months after the anchor at which the recency weight reaches 2.0.
    pub const MONTHS_PER_UNIT: f64 = 60.0;

    pub const ROUTINE_NEWS: f64 = 0.7;
    pub const TERRESTRIAL_SPORTS: f64 = 1.5;
    pub const TERRESTRIAL_DOMESTIC_DRAMA: f64 = 3.2;
    pub const OTHER_DOMESTIC_DRAMA: f64 = 0.25;
    pub const FOREIGN_DRAMA: f64 = 0.25;
    pub const TERRESTRIAL_VARIETY: f64 = 1.1;
    pub const MOVIE: f64 = 2.2;
    pub const ANIMATED_MOVIE_EXTRA: f64 = 1.7;
    pub const LATE_NIGHT_ANIME: f64 = 2.2;
    pub const TERRESTRIAL_DOCUMENTARY: f64 = 1.1;
    pub const HOBBY: f64 = 0.8;
    pub const ATX_ANIME: f64 = 1.3;

    /// Inclusive hour range whose terrestrial domestic dramas are daytime reruns.
    pub const DAYTIME_DRAMA_HOURS: std::ops::RangeInclusive<u32> = 4..=17;
    /// Inclusive hour range whose anime are not late-night anime.
    pub const DAYTIME_ANIME_HOURS: std::ops::RangeInclusive<u32> = 4..=20;
}

/// Constants used by identity assignment and raw event ingestion.
pub mod ingestion {
    /// `chrono` format of the minute-resolution start-time prefix of program ids.
    pub const ID_TIME_FORMAT: &str = "%Y%m%d%H%M";
    /// Fixed civil-time offset of every timestamp (UTC+9).
    pub const JST_OFFSET_SECONDS: i32 = 9 * 3600;
    /// `service_type` of a regular digital television service.
    pub const DIGITAL_TV_SERVICE_TYPE: u8 = 0x01;
    /// Default acquisition window length in days.
    pub const DEFAULT_WINDOW_DAYS: i64 = 7;
    /// Networks collected by default: BS, CS1, CS2 and the Tokyo terrestrial broadcasters.
    pub const DEFAULT_INCLUDE_NETWORK_IDS: [u16; 11] = [
        0x0004, // BS
        0x0006, // CS1
        0x0007, // CS2
        32736,  // NHK General Tokyo
        32737,  // NHK E-Tele Tokyo
        32738,  // Nippon TV
        32741,  // TV Asahi
        32739,  // TBS
        32742,  // TV Tokyo
        32740,  // Fuji TV
        32391,  // TOKYO MX
    ];
}

/// Constants used by subset sampling.
pub mod sampler {
    /// Default number of records in a subset.
    pub const DEFAULT_SUBSET_SIZE: usize = 5000;
    /// Default RNG seed.
    pub const DEFAULT_SEED: u64 = 42;
    /// Share of the subset drawn from terrestrial channels.
    pub const TERRESTRIAL_PROPORTION: f64 = 0.65;
    /// Share of the subset drawn from free BS channels.
    pub const FREE_SATELLITE_PROPORTION: f64 = 0.25;
    /// Share of the subset drawn from pay BS and CS channels.
    pub const PAID_SATELLITE_OR_CABLE_PROPORTION: f64 = 0.10;
    /// Reference minimum share for genres with a representation floor.
    pub const DEFAULT_GENRE_FLOOR_FRACTION: f64 = 0.15;
}
