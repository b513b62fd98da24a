use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const KEY_FORMAT: &str = "%Y-%m-%d";
const CLOCK_FORMAT: &str = "%H:%M";

pub fn date_key(date: NaiveDate) -> String {
    date.format(KEY_FORMAT).to_string()
}

pub fn parse_key(key: &str) -> Option<NaiveDate> {
    let trimmed = key.trim();
    // chrono accepts unpadded fields; keys must stay fixed-width to sort as strings.
    if trimmed.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, KEY_FORMAT).ok()
}

/// Wall-clock time as `HH:MM`, 24-hour.
pub fn clock_time(now: NaiveDateTime) -> String {
    now.format(CLOCK_FORMAT).to_string()
}

/// `2026-01-05` -> `Monday, January 5, 2026`. Unparseable keys are returned as-is.
pub fn display_date(key: &str) -> String {
    match parse_key(key) {
        Some(date) => date.format("%A, %B %-d, %Y").to_string(),
        None => key.to_string(),
    }
}

/// `14:05` -> `2:05 PM`. Blank or unparseable times are returned as-is.
pub fn display_time(time: &str) -> String {
    match NaiveTime::parse_from_str(time.trim(), CLOCK_FORMAT) {
        Ok(parsed) => parsed.format("%-I:%M %p").to_string(),
        Err(_) => time.to_string(),
    }
}
