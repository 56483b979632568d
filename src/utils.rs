use chrono::{Local, TimeZone, Timelike};

pub fn now_ts() -> f64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs_f64()
}

/// Renders an epoch-milliseconds timestamp as local clock time, the way chat
/// messages display it: minutes zero-padded, hours not.
pub fn format_clock(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|dt| format!("{}:{:02}", dt.hour(), dt.minute()))
        .unwrap_or_else(|| "0:00".to_string())
}
