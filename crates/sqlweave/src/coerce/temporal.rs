//! Lenient date, time, timestamp, epoch and interval parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

const DATE_MONTH_FIRST: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%d-%b-%Y", "%b %d, %Y", "%b %d %Y"];
const DATE_DAY_FIRST: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d-%b-%Y", "%b %d, %Y", "%b %d %Y"];
const TIME: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];
const TIMESTAMP: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a calendar date. Ambiguous `nn/nn/yyyy` forms are read month first
/// unless `day_first` is set.
pub fn parse_date(s: &str, day_first: bool) -> Option<NaiveDate> {
    let s = s.trim();
    let formats = if day_first { DATE_DAY_FIRST } else { DATE_MONTH_FIRST };
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME.iter().find_map(|f| NaiveTime::parse_from_str(s, f).ok())
}

/// Parse a timestamp; a bare date is read as midnight.
pub fn parse_timestamp(s: &str, day_first: bool) -> Option<NaiveDateTime> {
    let s = s.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    TIMESTAMP
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| parse_date(s, day_first).map(|d| d.and_time(NaiveTime::MIN)))
}

/// Resolution of an epoch column, chosen from its largest magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochUnit {
    Seconds,
    Millis,
    Micros,
}

impl EpochUnit {
    pub fn for_magnitude(max: f64) -> Self {
        if max > 1e15 {
            Self::Micros
        } else if max > 1e12 {
            Self::Millis
        } else {
            Self::Seconds
        }
    }
}

/// Convert an epoch offset in `unit` to a UTC timestamp.
pub fn from_epoch(value: f64, unit: EpochUnit) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }
    let dt = match unit {
        EpochUnit::Seconds => {
            let secs = value.trunc();
            let nanos = ((value - secs) * 1e9).round() as u32;
            DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
        }
        EpochUnit::Millis => DateTime::from_timestamp_millis(value as i64),
        EpochUnit::Micros => DateTime::from_timestamp_micros(value as i64),
    };
    dt.map(|d| d.naive_utc())
}

/// Parse an interval given as seconds, `[-]HH:MM:SS[.f]`, or
/// `N days HH:MM:SS[.f]`.
pub fn parse_interval(s: &str) -> Option<TimeDelta> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return seconds(secs);
    }

    let (days, clock) = match s.split_once("day") {
        Some((d, rest)) => {
            let days: i64 = d.trim().parse().ok()?;
            let rest = rest.trim_start_matches('s').trim_start_matches(',').trim();
            (days, rest)
        }
        None => (0, s),
    };
    let clock_delta = if clock.is_empty() {
        TimeDelta::zero()
    } else {
        let (negative, clock) = match clock.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, clock),
        };
        let mut parts = clock.split(':');
        let h: i64 = parts.next()?.parse().ok()?;
        let m: i64 = parts.next()?.parse().ok()?;
        let sec: f64 = parts.next().map_or(Ok(0.0), str::parse).ok()?;
        if parts.next().is_some() {
            return None;
        }
        let delta = TimeDelta::try_hours(h)? + TimeDelta::try_minutes(m)? + seconds(sec)?;
        if negative { -delta } else { delta }
    };
    Some(TimeDelta::try_days(days)? + clock_delta)
}

fn seconds(secs: f64) -> Option<TimeDelta> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1e6).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2021, 6, 15).unwrap();
        assert_eq!(parse_date("2021-06-15", false), Some(d));
        assert_eq!(parse_date("06/15/2021", false), Some(d));
        assert_eq!(parse_date("15/06/2021", true), Some(d));
        assert_eq!(parse_date("15-Jun-2021", false), Some(d));
        assert_eq!(parse_date("Jun 15, 2021", false), Some(d));
        assert_eq!(parse_date("2021-13-01", false), None);
    }

    #[test]
    fn times_and_timestamps() {
        assert_eq!(parse_time("9:30 PM"), NaiveTime::from_hms_opt(21, 30, 0));
        assert_eq!(parse_time("12:00:01"), NaiveTime::from_hms_opt(12, 0, 1));
        let ts = parse_timestamp("2021-01-01T10:00:00.5Z", false).unwrap();
        assert_eq!(ts.to_string(), "2021-01-01 10:00:00.500");
        let midnight = parse_timestamp("2021-01-01", false).unwrap();
        assert_eq!(midnight.to_string(), "2021-01-01 00:00:00");
    }

    #[test]
    fn epoch_units() {
        assert_eq!(EpochUnit::for_magnitude(1.7e9), EpochUnit::Seconds);
        assert_eq!(EpochUnit::for_magnitude(1.7e12 + 1.0), EpochUnit::Millis);
        assert_eq!(EpochUnit::for_magnitude(1.7e15 + 1.0), EpochUnit::Micros);

        let s = from_epoch(1_600_000_000.0, EpochUnit::Seconds).unwrap();
        let ms = from_epoch(1_600_000_000_000.0, EpochUnit::Millis).unwrap();
        let us = from_epoch(1_600_000_000_000_000.0, EpochUnit::Micros).unwrap();
        assert_eq!(s, ms);
        assert_eq!(ms, us);
        assert_eq!(s.to_string(), "2020-09-13 12:26:40");
    }

    #[test]
    fn intervals() {
        assert_eq!(parse_interval("90"), Some(TimeDelta::seconds(90)));
        assert_eq!(parse_interval("01:30:00"), Some(TimeDelta::minutes(90)));
        assert_eq!(
            parse_interval("1 days 02:00:00"),
            Some(TimeDelta::hours(26))
        );
        assert_eq!(parse_interval("soon"), None);
    }
}
