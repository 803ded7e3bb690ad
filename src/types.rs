/// Canonical program identifier (stable across runs, sortable by start time).
/// Example: `202110230153-NID32742-SID01072-EID27730`
pub type ProgramId = String;
/// Identifier for the event source that produced raw records.
/// Examples: `edcb`, `epg_dump.jsonl`
pub type SourceId = String;
/// Original network id (`onid`).
/// Examples: `32742` (terrestrial), `4` (BS), `7` (CS2)
pub type NetworkId = u16;
/// Service id (`sid`) within a network.
/// Examples: `1072`, `211`, `333`
pub type ServiceId = u16;
/// Transport stream id (`tsid`).
pub type TransportStreamId = u16;
/// Event id (`eid`) within a service.
pub type EventId = u16;
/// Major or middle genre nibble; `-1` when the source carries no genre.
pub type GenreId = i16;
/// Pair of formatted title and description used for re-broadcast dedup.
/// Example: `("大正オトメ御伽話「黒百合ノ娘」", "珠彦の屋敷に妹の珠子がやってきた。")`
pub type TextKey = (String, String);
/// Year-month bucket used by composition reports.
/// Example: `2021-10`
pub type MonthKey = String;
