//! Wall-clock helpers.
//!
//! Uses `web_time` so the same code runs natively and on wasm32.

use web_time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one day.
pub const DAY_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
