//! Ordering logic for schedule reconciliation.
//!
//! Schedule feeds arrive as an unordered pile of per-station timing
//! records. Each train's records are sorted by (day, departure) and
//! ranked into a dense 1-based stop sequence; the day column is 1-based
//! in the feed and persisted as a 0-based offset.
//!
//! The sort key is a stated simplification: an absent day counts as
//! day 1 and an absent departure as "00:00:00" (earliest). No calendar
//! arithmetic happens across midnight beyond the explicit day field.

/// One raw timing record for a (train, station) pair.
#[derive(Debug, Clone)]
pub struct ScheduleRecord {
    pub train_number: String,
    pub station_code: String,
    /// 1-based day of the multi-day journey.
    pub day: Option<i32>,
    pub arrival: Option<String>,
    pub departure: Option<String>,
}

/// A reconciled stop, ready to upsert at (train, stop_sequence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedStop {
    pub station_code: String,
    pub stop_sequence: i32,
    pub arrival: Option<String>,
    pub departure: Option<String>,
    pub day_offset: i32,
}

/// The schedule feed writes the string literal "None" where a time is
/// absent; normalize that to a true null.
pub fn normalize_time(raw: Option<String>) -> Option<String> {
    match raw {
        Some(value) if value == "None" => None,
        other => other,
    }
}

/// Sorts one train's records into journey order and assigns sequences.
pub fn order_schedule(mut records: Vec<ScheduleRecord>) -> Vec<OrderedStop> {
    // Stable sort keeps feed order for records with equal keys.
    records.sort_by(|a, b| {
        let key_a = (a.day.unwrap_or(1), a.departure.as_deref().unwrap_or("00:00:00"));
        let key_b = (b.day.unwrap_or(1), b.departure.as_deref().unwrap_or("00:00:00"));
        key_a.cmp(&key_b)
    });

    records
        .into_iter()
        .enumerate()
        .map(|(rank, record)| OrderedStop {
            station_code: record.station_code,
            stop_sequence: rank as i32 + 1,
            arrival: record.arrival,
            departure: record.departure,
            day_offset: record.day.unwrap_or(1) - 1,
        })
        .collect()
}
