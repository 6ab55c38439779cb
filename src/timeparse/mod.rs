//! Timestamp normalization for forum time strings
//!
//! Forum pages render post and reply times in a mix of relative forms
//! ("3 小时前", "昨天 14:02"), bare month-day dates, and absolute
//! timestamps. This module maps any of those to epoch seconds against a
//! caller-supplied reference time. Text that matches no known form is kept
//! verbatim so it can be reprocessed later instead of being lost.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A normalized timestamp, or the original text when no rule matched
///
/// Serialized untagged: a JSON number for epoch values, a JSON string for
/// unparsed text, matching the shape of the persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    /// Unix timestamp in whole seconds
    Epoch(i64),

    /// The original time text, kept verbatim for later reprocessing
    Unparsed(String),
}

impl TimeValue {
    /// Returns the epoch value if this was successfully normalized
    pub fn epoch(&self) -> Option<i64> {
        match self {
            Self::Epoch(ts) => Some(*ts),
            Self::Unparsed(_) => None,
        }
    }
}

struct Patterns {
    minutes_ago: Regex,
    hours_ago: Regex,
    days_ago: Regex,
    day_before_yesterday: Regex,
    yesterday: Regex,
    just_now: Regex,
    month_day: Regex,
    absolute: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            minutes_ago: Regex::new(r"(\d+)\s*(?:分钟前|minutes? ago)").unwrap(),
            hours_ago: Regex::new(r"(\d+)\s*(?:小时前|hours? ago)").unwrap(),
            days_ago: Regex::new(r"(\d+)\s*(?:天前|days? ago)").unwrap(),
            day_before_yesterday: Regex::new(
                r"(?:前天|day before yesterday)\s*(\d{1,2}):(\d{2})",
            )
            .unwrap(),
            yesterday: Regex::new(r"(?:昨天|yesterday)\s*(\d{1,2}):(\d{2})").unwrap(),
            just_now: Regex::new(r"刚刚|just now").unwrap(),
            // Reject month-day fragments embedded in a longer date such as
            // the "11-05" inside "2012-11-05".
            month_day: Regex::new(r"(?:^|[^\d-])(\d{1,2})-(\d{1,2})(?:[^\d:-]|$)").unwrap(),
            absolute: Regex::new(
                r"(\d{4})-(\d{1,2})-(\d{1,2})(?:\s+(\d{1,2}):(\d{2})(?::(\d{2}))?)?",
            )
            .unwrap(),
        }
    }
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::new)
}

/// Normalizes a forum time string against a reference time
///
/// Rules are tried in priority order; the first match wins. Relative forms
/// are interpreted against `reference`; absolute timestamps are independent
/// of it (naive datetimes are read as UTC). Results are truncated to whole
/// seconds. Input that matches no rule comes back as
/// [`TimeValue::Unparsed`] holding the original text.
pub fn normalize(text: &str, reference: DateTime<Utc>) -> TimeValue {
    // Discuz reply widgets append a trailing reply button label.
    let cleaned = text.trim().trim_end_matches("回复").trim();
    if cleaned.is_empty() {
        return TimeValue::Unparsed(text.to_string());
    }

    let p = patterns();

    if let Some(caps) = p.minutes_ago.captures(cleaned) {
        if let Ok(minutes) = caps[1].parse::<i64>() {
            return TimeValue::Epoch((reference - Duration::minutes(minutes)).timestamp());
        }
    }

    if let Some(caps) = p.hours_ago.captures(cleaned) {
        if let Ok(hours) = caps[1].parse::<i64>() {
            return TimeValue::Epoch((reference - Duration::hours(hours)).timestamp());
        }
    }

    if let Some(caps) = p.days_ago.captures(cleaned) {
        if let Ok(days) = caps[1].parse::<i64>() {
            return TimeValue::Epoch((reference - Duration::days(days)).timestamp());
        }
    }

    // "前天" must be tried before "昨天": the English spelling of the former
    // contains the latter.
    if let Some(ts) = named_day_offset(&p.day_before_yesterday, cleaned, reference, 2) {
        return TimeValue::Epoch(ts);
    }

    if let Some(ts) = named_day_offset(&p.yesterday, cleaned, reference, 1) {
        return TimeValue::Epoch(ts);
    }

    if p.just_now.is_match(cleaned) {
        return TimeValue::Epoch((reference - Duration::minutes(1)).timestamp());
    }

    if let Some(caps) = p.month_day.captures(cleaned) {
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(reference.year(), month, day) {
            let mut dt = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
            // A month-day without a year that lands in the future belongs to
            // the previous year.
            if dt > reference {
                if let Some(prev) = NaiveDate::from_ymd_opt(reference.year() - 1, month, day) {
                    dt = Utc.from_utc_datetime(&prev.and_time(NaiveTime::MIN));
                }
            }
            return TimeValue::Epoch(dt.timestamp());
        }
        // Invalid dates such as 02-30 fall through to the remaining rules.
    }

    if let Some(caps) = p.absolute.captures(cleaned) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        let hour: u32 = caps.get(4).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let minute: u32 = caps.get(5).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let second: u32 = caps.get(6).map_or(0, |m| m.as_str().parse().unwrap_or(0));

        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            if let Some(time) = NaiveTime::from_hms_opt(hour, minute, second) {
                let dt = Utc.from_utc_datetime(&NaiveDateTime::new(date, time));
                return TimeValue::Epoch(dt.timestamp());
            }
        }
    }

    TimeValue::Unparsed(text.to_string())
}

/// Resolves "yesterday HH:MM"-style forms: `offset_days` back from the
/// reference date at the captured wall-clock time.
fn named_day_offset(
    pattern: &Regex,
    text: &str,
    reference: DateTime<Utc>,
    offset_days: i64,
) -> Option<i64> {
    let caps = pattern.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;

    let date = (reference - Duration::days(offset_days)).date_naive();
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)).timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 30, 45).unwrap()
    }

    #[test]
    fn test_minutes_ago() {
        let t = reference();
        assert_eq!(
            normalize("5分钟前", t),
            TimeValue::Epoch((t - Duration::minutes(5)).timestamp())
        );
        assert_eq!(
            normalize("1 minute ago", t),
            TimeValue::Epoch((t - Duration::minutes(1)).timestamp())
        );
    }

    #[test]
    fn test_hours_ago() {
        let t = reference();
        assert_eq!(
            normalize("3 小时前", t),
            TimeValue::Epoch((t - Duration::hours(3)).timestamp())
        );
        assert_eq!(
            normalize("3 hours ago", t),
            TimeValue::Epoch((t - Duration::hours(3)).timestamp())
        );
    }

    #[test]
    fn test_days_ago() {
        let t = reference();
        assert_eq!(
            normalize("7天前", t),
            TimeValue::Epoch((t - Duration::days(7)).timestamp())
        );
    }

    #[test]
    fn test_yesterday() {
        let t = reference();
        let expected = Utc.with_ymd_and_hms(2025, 3, 14, 9, 5, 0).unwrap();
        assert_eq!(
            normalize("昨天 9:05", t),
            TimeValue::Epoch(expected.timestamp())
        );
        assert_eq!(
            normalize("yesterday 9:05", t),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_day_before_yesterday() {
        let t = reference();
        let expected = Utc.with_ymd_and_hms(2025, 3, 13, 22, 10, 0).unwrap();
        assert_eq!(
            normalize("前天 22:10", t),
            TimeValue::Epoch(expected.timestamp())
        );
        assert_eq!(
            normalize("day before yesterday 22:10", t),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_just_now() {
        let t = reference();
        assert_eq!(
            normalize("刚刚", t),
            TimeValue::Epoch((t - Duration::minutes(1)).timestamp())
        );
    }

    #[test]
    fn test_month_day_past() {
        let t = reference();
        let expected = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            normalize("02-01", t),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_month_day_future_rolls_back_a_year() {
        let t = reference();
        let expected = Utc.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap();
        assert_eq!(
            normalize("11-20", t),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_month_day_invalid_date_is_unparsed() {
        assert_eq!(
            normalize("02-30", reference()),
            TimeValue::Unparsed("02-30".to_string())
        );
    }

    #[test]
    fn test_absolute_full() {
        // Fixed epoch for the literal value, independent of the reference.
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            normalize("2024-01-02 03:04:05", reference()),
            TimeValue::Epoch(expected.timestamp())
        );
        let other_ref = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            normalize("2024-01-02 03:04:05", other_ref),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_absolute_without_seconds() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap();
        assert_eq!(
            normalize("发表于 2024-1-2 03:04", reference()),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_absolute_date_only() {
        let expected = Utc.with_ymd_and_hms(2024, 12, 5, 0, 0, 0).unwrap();
        assert_eq!(
            normalize("2024-12-05", reference()),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_month_day_not_matched_inside_full_date() {
        // The "11-05" inside a full date must not be read as month-day.
        let expected = Utc.with_ymd_and_hms(2012, 11, 5, 0, 0, 0).unwrap();
        assert_eq!(
            normalize("2012-11-05", reference()),
            TimeValue::Epoch(expected.timestamp())
        );
    }

    #[test]
    fn test_reply_suffix_stripped() {
        let t = reference();
        assert_eq!(
            normalize("3小时前 回复", t),
            TimeValue::Epoch((t - Duration::hours(3)).timestamp())
        );
    }

    #[test]
    fn test_unparsable_returns_original() {
        assert_eq!(
            normalize("随便写的", reference()),
            TimeValue::Unparsed("随便写的".to_string())
        );
        assert_eq!(
            normalize("", reference()),
            TimeValue::Unparsed("".to_string())
        );
    }

    #[test]
    fn test_serde_untagged() {
        let epoch = TimeValue::Epoch(1700000000);
        assert_eq!(serde_json::to_string(&epoch).unwrap(), "1700000000");

        let text = TimeValue::Unparsed("昨天?".to_string());
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"昨天?\"");

        let back: TimeValue = serde_json::from_str("1700000000").unwrap();
        assert_eq!(back, epoch);
        let back: TimeValue = serde_json::from_str("\"昨天?\"").unwrap();
        assert_eq!(back, text);
    }
}
