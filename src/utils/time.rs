use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use chrono::Duration;
use regex::Regex;

/// Optional-groups pattern for limits like `1h10m01s`. Every component may be
/// omitted, so the pattern also matches an empty prefix of any input.
static TIME_LIMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?").unwrap());

/// Parses a time limit written as hours, minutes, seconds, in that order,
/// each component optional. Unmatched components count as zero, which keeps
/// the historical quirk that a string without any recognizable component
/// parses to a zero limit instead of being rejected.
pub fn parse_time_limit(value: &str) -> Result<Duration> {
    let captures = TIME_LIMIT_PATTERN
        .captures(value)
        .ok_or_else(|| anyhow!("invalid time format, use a format like 1h10m01s"))?;

    let component = |index: usize| -> Result<i64> {
        captures.get(index).map_or(Ok(0), |m| {
            m.as_str()
                .parse::<i64>()
                .map_err(|_| anyhow!("invalid time format, use a format like 1h10m01s"))
        })
    };

    let hours = component(1)?;
    let minutes = component(2)?;
    let seconds = component(3)?;

    Ok(Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds))
}

/// Formats a duration as HH:MM:SS. Negative durations render as 00:00:00.
pub fn format_hms(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
