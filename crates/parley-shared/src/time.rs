//! Display formatting for message and conversation timestamps.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::constants::INVALID_TIME_PLACEHOLDER;

/// Current wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render `timestamp_ms` as `DD-MM-YYYY, HH:MM` (24-hour, zero-padded) in
/// the given offset. Output does not depend on the process locale.
pub fn format_display_time(timestamp_ms: i64, offset: &FixedOffset) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(utc) => utc
            .with_timezone(offset)
            .format("%d-%m-%Y, %H:%M")
            .to_string(),
        None => INVALID_TIME_PLACEHOLDER.to_string(),
    }
}

/// Build an offset from minutes east of UTC, clamping to chrono's valid range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    let seconds = minutes.saturating_mul(60).clamp(-86_399, 86_399);
    FixedOffset::east_opt(seconds).unwrap_or_else(utc_offset)
}

pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}
