//! Helper functions and utilities
//!
//! Time-of-day grammar, interval bounds and deep-link payload encoding.

use std::sync::OnceLock;

use base64::{engine::general_purpose, Engine as _};
use chrono::{NaiveTime, Timelike};
use regex::Regex;

use crate::utils::errors::{AdhkarError, Result};

/// Smallest accepted random-stream interval, in minutes
pub const MIN_INTERVAL_MINUTES: i64 = 1;
/// Largest accepted random-stream interval, in minutes (one day)
pub const MAX_INTERVAL_MINUTES: i64 = 1440;

/// Prefix of the `/start` payload that carries a target group
pub const GROUP_PAYLOAD_PREFIX: &str = "group_";

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-2][0-9]:[0-5][0-9]$").expect("static time pattern"))
}

/// Parse a local wall-clock time in strict `HH:MM` form, hour in `[0,23]`
pub fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    if !time_pattern().is_match(value) {
        return Err(AdhkarError::InvalidTime(value.to_string()));
    }

    let (hour, minute) = value
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .ok_or_else(|| AdhkarError::InvalidTime(value.to_string()))?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| AdhkarError::InvalidTime(value.to_string()))
}

/// Render a time back into the canonical `HH:MM` form
pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Validate a random-stream interval
pub fn validate_interval(minutes: i64) -> Result<u32> {
    if (MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        Ok(minutes as u32)
    } else {
        Err(AdhkarError::InvalidInterval(minutes))
    }
}

/// Encode a group id as a `/start` payload: `group_` + base64 of its decimal form
pub fn encode_group_payload(group_id: i64) -> String {
    format!(
        "{}{}",
        GROUP_PAYLOAD_PREFIX,
        general_purpose::URL_SAFE_NO_PAD.encode(group_id.to_string())
    )
}

/// Decode a `/start` payload produced by [`encode_group_payload`].
///
/// Padded and standard-alphabet encodings are accepted as well.
pub fn decode_group_payload(payload: &str) -> Option<i64> {
    let encoded = payload.trim().strip_prefix(GROUP_PAYLOAD_PREFIX)?;
    let trimmed = encoded.trim_end_matches('=');

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(trimmed))
        .ok()?;

    String::from_utf8(bytes).ok()?.parse::<i64>().ok()
}

/// Build a `t.me` deep link that opens a private configuration session for a group
pub fn group_deep_link(bot_username: &str, group_id: i64) -> String {
    format!(
        "https://t.me/{}?start={}",
        bot_username.trim_start_matches('@'),
        encode_group_payload(group_id)
    )
}

/// Status mark used in summaries and keyboards
pub fn status_mark(on: bool) -> &'static str {
    if on { "✅" } else { "❌" }
}
