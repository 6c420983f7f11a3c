use chrono::{Local, TimeZone};
use std::time::{SystemTime, UNIX_EPOCH};

/// seconds since `1970-1-1 00:00:00`, named as [UNIX_EPOCH]
pub type Timestamp = i64;

/// calculate what time is it since [UNIX_EPOCH]
pub fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or_default()
}

/// render a [Timestamp] in local time, like `Tue Nov 14 22:13:20 2023`
pub fn format_timestamp(time: Timestamp) -> String {
    match Local.timestamp_opt(time, 0).single() {
        Some(dt) => dt.format("%a %b %e %H:%M:%S %Y").to_string(),
        None => format!("@{time}"),
    }
}
