//! Kickoff time parsing.
//!
//! Feeds disagree on how to write a kickoff time, so parsing is an ordered list
//! of named strategies. The first one that reads the string wins; if none do,
//! the kickoff is unknown (`None`). The last strategy only pulls an `HH:MM`
//! clock out of whatever text is there and pins it to the feed's date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::debug;

pub type StrategyFn = fn(&str, NaiveDate) -> Option<DateTime<Utc>>;

#[derive(Clone, Copy)]
pub struct KickoffStrategy {
    pub name: &'static str,
    pub parse: StrategyFn,
}

impl std::fmt::Debug for KickoffStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KickoffStrategy").field("name", &self.name).finish()
    }
}

pub const KICKOFF_STRATEGIES: &[KickoffStrategy] = &[
    KickoffStrategy { name: "rfc3339", parse: parse_rfc3339 },
    KickoffStrategy { name: "naive_iso", parse: parse_naive_iso },
    KickoffStrategy { name: "naive_space", parse: parse_naive_space },
    KickoffStrategy { name: "day_first", parse: parse_day_first },
    KickoffStrategy { name: "unix_epoch", parse: parse_unix_epoch },
    KickoffStrategy { name: "bare_time", parse: parse_bare_time },
];

/// Parse a raw kickoff value. `reference_date` anchors strings that only
/// carry a clock time.
pub fn parse_kickoff(raw: &str, reference_date: NaiveDate) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = KICKOFF_STRATEGIES
        .iter()
        .find_map(|strategy| (strategy.parse)(raw, reference_date));

    if parsed.is_none() {
        debug!("kickoff time {raw:?} matched no strategy; treating as unknown");
    }
    parsed
}

/// Look a strategy up by name.
pub fn strategy(name: &str) -> Option<&'static KickoffStrategy> {
    KICKOFF_STRATEGIES.iter().find(|s| s.name == name)
}

fn parse_rfc3339(raw: &str, _: NaiveDate) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive_iso(raw: &str, _: NaiveDate) -> Option<DateTime<Utc>> {
    naive_with_formats(raw, &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"])
}

fn parse_naive_space(raw: &str, _: NaiveDate) -> Option<DateTime<Utc>> {
    naive_with_formats(raw, &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"])
}

fn parse_day_first(raw: &str, _: NaiveDate) -> Option<DateTime<Utc>> {
    naive_with_formats(raw, &["%d.%m.%Y %H:%M", "%d/%m/%Y %H:%M", "%d.%m.%Y %H:%M:%S"])
}

fn parse_unix_epoch(raw: &str, _: NaiveDate) -> Option<DateTime<Utc>> {
    // Nine digits keeps short numbers (years, minutes) out of the 1970s.
    if raw.len() < 9 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = raw.parse().ok()?;
    if raw.len() >= 12 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

fn parse_bare_time(raw: &str, reference_date: NaiveDate) -> Option<DateTime<Utc>> {
    let clock = extract_clock(raw)?;
    Some(reference_date.and_time(clock).and_utc())
}

fn naive_with_formats(raw: &str, formats: &[&str]) -> Option<DateTime<Utc>> {
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// First `H:MM` / `HH:MM` clock anywhere in the string.
fn extract_clock(raw: &str) -> Option<NaiveTime> {
    let bytes = raw.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b':' || i == 0 || !bytes[i - 1].is_ascii_digit() {
            continue;
        }
        let Some(minutes) = bytes.get(i + 1..i + 3) else {
            continue;
        };
        if !minutes.iter().all(u8::is_ascii_digit) {
            continue;
        }
        let start = if i >= 2 && bytes[i - 2].is_ascii_digit() { i - 2 } else { i - 1 };
        let hour: u32 = raw[start..i].parse().ok()?;
        let minute: u32 = raw[i + 1..i + 3].parse().ok()?;
        if let Some(clock) = NaiveTime::from_hms_opt(hour, minute, 0) {
            return Some(clock);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 11).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 11, h, m, 0).unwrap()
    }

    #[test]
    fn rfc3339_handles_offsets() {
        assert_eq!(parse_kickoff("2026-06-11T19:00:00Z", day()), Some(at(19, 0)));
        assert_eq!(parse_kickoff("2026-06-11T21:00:00+02:00", day()), Some(at(19, 0)));
        assert_eq!(parse_kickoff("2026-06-11T21:00:00+0200", day()), Some(at(19, 0)));
    }

    #[test]
    fn naive_formats_are_read_as_utc() {
        assert_eq!(parse_kickoff("2026-06-11T19:30", day()), Some(at(19, 30)));
        assert_eq!(parse_kickoff("2026-06-11 19:30:00", day()), Some(at(19, 30)));
        assert_eq!(parse_kickoff("11.06.2026 19:30", day()), Some(at(19, 30)));
        assert_eq!(parse_kickoff("11/06/2026 19:30", day()), Some(at(19, 30)));
    }

    #[test]
    fn epoch_seconds_and_millis() {
        let expected = at(19, 0);
        let secs = expected.timestamp().to_string();
        let millis = expected.timestamp_millis().to_string();
        assert_eq!(parse_kickoff(&secs, day()), Some(expected));
        assert_eq!(parse_kickoff(&millis, day()), Some(expected));
    }

    #[test]
    fn bare_time_is_the_last_resort() {
        assert_eq!(parse_kickoff("19:45", day()), Some(at(19, 45)));
        assert_eq!(parse_kickoff("Kick-off 7:05 local", day()), Some(at(7, 5)));
        assert_eq!(parse_kickoff("Thu, 11 Jun 20:00 (BST)", day()), Some(at(20, 0)));
    }

    #[test]
    fn garbage_is_unknown_not_an_error() {
        assert_eq!(parse_kickoff("", day()), None);
        assert_eq!(parse_kickoff("TBD", day()), None);
        assert_eq!(parse_kickoff("99:99", day()), None);
        assert_eq!(parse_kickoff("2026", day()), None);
        assert_eq!(parse_kickoff("12:3", day()), None);
    }

    #[test]
    fn strategies_work_in_isolation() {
        let rfc = strategy("rfc3339").unwrap();
        assert_eq!((rfc.parse)("19:00", day()), None);

        let bare = strategy("bare_time").unwrap();
        assert_eq!((bare.parse)("2026-06-11T19:00:00Z", day()), Some(at(19, 0)));

        assert!(strategy("no_such_strategy").is_none());
        assert_eq!(KICKOFF_STRATEGIES.last().map(|s| s.name), Some("bare_time"));
    }
}
