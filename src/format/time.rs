use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::ResultFormatter;

lazy_static! {
    static ref CLOCK: Regex = Regex::new(r"T(\d{2}):(\d{2})").unwrap();
    static ref DATE: Regex = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap();
}

/// Renders time-server payloads ("what time is it in London?") as a single
/// spoken sentence with a 12-hour clock.
pub struct TimeFormatter;

impl ResultFormatter for TimeFormatter {
    fn name(&self) -> &str {
        "time"
    }

    fn matches(&self, raw: &Value) -> bool {
        raw.get("datetime").is_some() && raw.get("timezone").is_some()
    }

    fn format(&self, raw: &Value) -> Option<String> {
        let datetime = raw.get("datetime")?.as_str()?;
        let timezone = raw.get("timezone")?.as_str().unwrap_or_default();

        let clock = CLOCK.captures(datetime)?;
        // The date is extracted alongside the clock so a truncated timestamp
        // is rejected as a whole, not rendered half-formed.
        DATE.captures(datetime)?;
        let hour: u32 = clock[1].parse().ok()?;
        let minute = &clock[2];

        let (hour_12, am_pm) = to_12_hour(hour);
        let spoken_zone = timezone.replace('_', " ").replace('/', ", ");
        let dst_note = match raw.get("is_dst").and_then(Value::as_bool) {
            Some(true) => " (daylight saving time)",
            _ => "",
        };

        Some(format!(
            "The current time in {} is {}:{} {}{}.",
            spoken_zone, hour_12, minute, am_pm, dst_note
        ))
    }
}

fn to_12_hour(hour: u32) -> (u32, &'static str) {
    let am_pm = if hour < 12 { "AM" } else { "PM" };
    let hour_12 = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    (hour_12, am_pm)
}
