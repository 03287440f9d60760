//! Provider-independent pieces of response normalisation: the rounding
//! policy and the `ru` display formatting of timestamps.

use chrono::{DateTime, Datelike, FixedOffset, Utc};

/// Hourly points kept from the extended forecast.
pub const HOURLY_LIMIT: usize = 24;
/// Upcoming days kept from the extended forecast.
pub const DAILY_LIMIT: usize = 5;

const MONTHS_SHORT: [&str; 12] = [
    "янв.", "февр.", "мар.", "апр.", "мая", "июн.", "июл.", "авг.", "сент.", "окт.", "нояб.",
    "дек.",
];

const WEEKDAYS_SHORT: [&str; 7] = ["пн", "вт", "ср", "чт", "пт", "сб", "вс"];

/// Round to the nearest integer, halves towards positive infinity
/// (`-2.5` becomes `-2`, `2.5` becomes `3`).
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Round to one decimal place, halves towards positive infinity.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

pub fn percent(value: f64) -> u8 {
    round_half_up(value).clamp(0, 100) as u8
}

pub fn degrees(value: f64) -> u16 {
    round_half_up(value).rem_euclid(360) as u16
}

pub fn pressure(value: f64) -> u32 {
    round_half_up(value).max(0) as u32
}

fn local_time(ts: i64, offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    DateTime::<Utc>::from_timestamp(ts, 0).map(|utc| utc.with_timezone(&offset))
}

/// `HH:MM` of a unix timestamp at the given UTC offset.
pub fn format_time(ts: i64, offset_secs: i32) -> Option<String> {
    local_time(ts, offset_secs).map(|t| t.format("%H:%M").to_string())
}

/// Day of month and short month name, e.g. `18 окт.`.
pub fn format_date(ts: i64, offset_secs: i32) -> Option<String> {
    let t = local_time(ts, offset_secs)?;
    Some(format!("{} {}", t.day(), MONTHS_SHORT[t.month0() as usize]))
}

pub fn format_weekday(ts: i64, offset_secs: i32) -> Option<String> {
    let t = local_time(ts, offset_secs)?;
    Some(WEEKDAYS_SHORT[t.weekday().num_days_from_monday() as usize].to_string())
}
