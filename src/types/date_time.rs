use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref BARE_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}Z$").unwrap();
}

const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const LOWER_UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%Sz";
const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A date/time as it appears on the wire.
///
/// Servers send either a UTC timestamp (marked with `Z` or, on some older versions, `z`) or a
/// timestamp with no zone marker at all. The latter carries no offset and is kept as such rather
/// than being guessed into UTC.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum WireDateTime {
    Utc(DateTime<Utc>),
    Unspecified(NaiveDateTime),
}

impl WireDateTime {
    /// Parses one of the three date/time shapes Exchange servers are known to emit, in order:
    ///
    /// 1. `yyyy-MM-ddTHH:mm:ssZ`. A bare date such as `2020-01-01Z` is retried as noon UTC on
    ///    that date.
    /// 2. `yyyy-MM-ddTHH:mm:ssz`, the lowercase marker variant.
    /// 3. `yyyy-MM-ddTHH:mm:ss` with no marker, read as a zone-less local timestamp.
    pub fn parse(s: &str) -> Result<WireDateTime> {
        let invalid = || Error::Format(format!("date string {:?} is not in a valid UTC or local format", s));

        if s.ends_with('Z') {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, UTC_FORMAT) {
                return Ok(WireDateTime::Utc(Utc.from_utc_datetime(&dt)));
            }
            if !BARE_DATE.is_match(s) {
                return Err(invalid());
            }
            let noon = format!("{}T12:00:00Z", &s[..10]);
            NaiveDateTime::parse_from_str(&noon, UTC_FORMAT)
                .map(|dt| WireDateTime::Utc(Utc.from_utc_datetime(&dt)))
                .map_err(|_| invalid())
        } else if s.ends_with('z') {
            NaiveDateTime::parse_from_str(s, LOWER_UTC_FORMAT)
                .map(|dt| WireDateTime::Utc(Utc.from_utc_datetime(&dt)))
                .map_err(|_| invalid())
        } else {
            NaiveDateTime::parse_from_str(s, LOCAL_FORMAT)
                .map(WireDateTime::Unspecified)
                .map_err(|_| invalid())
        }
    }

    pub fn utc(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<WireDateTime> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(|dt| WireDateTime::Utc(Utc.from_utc_datetime(&dt)))
    }

    /// The timestamp with any zone information removed.
    pub fn naive(&self) -> NaiveDateTime {
        match *self {
            WireDateTime::Utc(dt) => dt.naive_utc(),
            WireDateTime::Unspecified(dt) => dt,
        }
    }

    pub fn is_utc(&self) -> bool {
        matches!(self, WireDateTime::Utc(_))
    }
}

impl fmt::Display for WireDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            WireDateTime::Utc(dt) => write!(f, "{}", dt.format(UTC_FORMAT)),
            WireDateTime::Unspecified(dt) => write!(f, "{}", dt.format(LOCAL_FORMAT)),
        }
    }
}

impl FromStr for WireDateTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WireDateTime::parse(s)
    }
}

impl From<DateTime<Utc>> for WireDateTime {
    fn from(dt: DateTime<Utc>) -> Self {
        WireDateTime::Utc(dt)
    }
}

/// An `xs:duration`, as used by time-span properties such as a calendar item's duration.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSpan(pub Duration);

impl TimeSpan {
    pub fn zero() -> Self {
        TimeSpan(Duration::zero())
    }

    pub fn parse(s: &str) -> Result<TimeSpan> {
        let invalid = || Error::Format(format!("{:?} is not a valid xs:duration", s));
        let parts = match all_consuming(duration)(s) {
            Ok((_, parts)) => parts,
            Err(_) => return Err(invalid()),
        };
        parts.total().map(TimeSpan).ok_or_else(|| {
            Error::Format(format!("xs:duration {:?} is out of range", s))
        })
    }
}

/// The fields of an `xs:duration` before they are summed.
#[derive(Debug, Default)]
struct DurationParts {
    negative: bool,
    years: i64,
    months: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: f64,
}

impl DurationParts {
    fn total(&self) -> Option<Duration> {
        // Exchange never sends calendar months or years in a duration; approximate as 30/365 days.
        let days = self
            .years
            .checked_mul(365)?
            .checked_add(self.months.checked_mul(30)?)?
            .checked_add(self.days)?;
        let millis = (self.seconds * 1000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        let total = Duration::try_days(days)?
            .checked_add(&Duration::try_hours(self.hours)?)?
            .checked_add(&Duration::try_minutes(self.minutes)?)?
            .checked_add(&Duration::try_milliseconds(millis as i64)?)?;
        Some(if self.negative { -total } else { total })
    }
}

fn number(input: &str) -> IResult<&str, i64> {
    map_res(digit1, str::parse)(input)
}

fn seconds(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(digit1, opt(preceded(char('.'), digit1)))),
        str::parse,
    )(input)
}

// [-]P[nY][nM][nD][T[nH][nM][n[.n]S]]
fn duration(input: &str) -> IResult<&str, DurationParts> {
    let (input, negative) = opt(char('-'))(input)?;
    let (input, _) = char('P')(input)?;
    let (input, (years, months, days)) = tuple((
        opt(terminated(number, char('Y'))),
        opt(terminated(number, char('M'))),
        opt(terminated(number, char('D'))),
    ))(input)?;
    let (input, time) = opt(preceded(
        char('T'),
        tuple((
            opt(terminated(number, char('H'))),
            opt(terminated(number, char('M'))),
            opt(terminated(seconds, char('S'))),
        )),
    ))(input)?;
    let (hours, minutes, secs) = time.unwrap_or((None, None, None));

    Ok((
        input,
        DurationParts {
            negative: negative.is_some(),
            years: years.unwrap_or(0),
            months: months.unwrap_or(0),
            days: days.unwrap_or(0),
            hours: hours.unwrap_or(0),
            minutes: minutes.unwrap_or(0),
            seconds: secs.unwrap_or(0.0),
        },
    ))
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut span = self.0;
        if span < Duration::zero() {
            f.write_str("-")?;
            span = -span;
        }
        let days = span.num_days();
        let hours = span.num_hours() % 24;
        let minutes = span.num_minutes() % 60;
        let seconds = span.num_seconds() % 60;
        let millis = span.num_milliseconds() % 1000;

        write!(f, "P{}DT{}H{}M{}", days, hours, minutes, seconds)?;
        if millis != 0 {
            write!(f, ".{:03}", millis)?;
        }
        f.write_str("S")
    }
}

impl FromStr for TimeSpan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TimeSpan::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_utc() {
        let dt = WireDateTime::parse("2020-01-01T08:30:00Z").unwrap();
        assert_eq!(dt, WireDateTime::utc(2020, 1, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn bare_date_is_noon_utc() {
        let dt = WireDateTime::parse("2020-01-01Z").unwrap();
        assert_eq!(dt, WireDateTime::utc(2020, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn lowercase_marker_is_utc() {
        let dt = WireDateTime::parse("2020-01-01T08:30:00z").unwrap();
        assert_eq!(dt, WireDateTime::utc(2020, 1, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn missing_marker_is_unspecified() {
        let dt = WireDateTime::parse("2020-01-01T08:30:00").unwrap();
        assert!(!dt.is_utc());
        assert_eq!(
            dt.naive(),
            NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn other_shapes_are_format_errors() {
        for s in [
            "",
            "yesterday",
            "2020/01/01T00:00:00Z",
            "2020-13-01T00:00:00",
            "Z",
            "2020-01-01T25:99:00Z",
            "2020-01-01garbageZ",
            "2020-01-01T08:30Z",
        ] {
            match WireDateTime::parse(s) {
                Err(Error::Format(msg)) => assert!(msg.contains(&format!("{:?}", s))),
                other => panic!("{:?} parsed as {:?}", s, other),
            }
        }
    }

    #[test]
    fn date_time_display_round_trip() {
        for s in ["1999-12-31T23:59:59Z", "2000-01-01T00:00:00Z", "2021-06-15T10:00:00"] {
            assert_eq!(WireDateTime::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn time_span_round_trip() {
        for span in [
            TimeSpan::zero(),
            TimeSpan(Duration::days(1)),
            TimeSpan(Duration::minutes(-90)),
            TimeSpan(Duration::milliseconds(1500)),
        ] {
            assert_eq!(TimeSpan::parse(&span.to_string()).unwrap(), span);
        }
    }

    #[test]
    fn time_span_shapes() {
        assert_eq!(TimeSpan::parse("PT0S").unwrap(), TimeSpan::zero());
        assert_eq!(
            TimeSpan::parse("PT1H30M").unwrap(),
            TimeSpan(Duration::minutes(90))
        );
        assert_eq!(
            TimeSpan::parse("-P2D").unwrap(),
            TimeSpan(Duration::days(-2))
        );
        assert!(TimeSpan::parse("1 day").is_err());
        assert!(TimeSpan::parse("PT5X").is_err());
    }

    #[test]
    fn oversized_time_spans_are_format_errors() {
        for s in [
            "P200000000000000D",
            "P99999999999999999Y",
            "PT9223372036854775807H",
            "P100000000000D",
            "PT99999999999999999999S",
        ] {
            match TimeSpan::parse(s) {
                Err(Error::Format(_)) => {}
                other => panic!("{:?} parsed as {:?}", s, other),
            }
        }
    }
}
