//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Calendar date of a timestamp in ISO form (`YYYY-MM-DD`)
pub fn iso_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// Long human date used in document headers ("March 4, 2025")
pub fn long_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%B %-d, %Y").to_string()
}
