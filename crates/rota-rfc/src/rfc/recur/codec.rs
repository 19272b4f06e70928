//! Canonical `DTSTART` + `RRULE` text for [`RecurrenceRule`].
//!
//! Encoded form (one line each, LF separated):
//!
//! ```text
//! DTSTART;TZID=Australia/Sydney:20250106T090000
//! RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE;UNTIL=20250302T125959Z
//! ```
//!
//! UTC rules use `DTSTART:20250106T090000Z`. `INTERVAL` is omitted when it is
//! 1 and `UNTIL` is always a UTC date-time, so the text is accepted as-is by
//! the `rrule` crate.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rota_core::constants::{DTSTART_PROPERTY, RRULE_LINE_PREFIX, RRULE_PROPERTY};

use super::rule::{Frequency, RecurrenceRule, RuleParts, Weekday, end_of_day};
use crate::error::{RfcError, RfcResult};

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";

/// ## Summary
/// Encodes a rule into its canonical text.
#[must_use]
pub fn encode(rule: &RecurrenceRule) -> String {
    rule.to_string()
}

/// ## Summary
/// Decodes rule text produced by [`encode`] or any equivalent iCalendar
/// `DTSTART`/`RRULE` pair restricted to the supported parts.
///
/// Property names, part names and values are case-insensitive; parts may come
/// in any order; lines may end in LF or CRLF.
///
/// ## Errors
/// - `RfcError::MalformedRule` for text that cannot be parsed or uses
///   unsupported features (`COUNT`, `WKST`, ordinals, other frequencies)
/// - `RfcError::InvalidInterval` for an `INTERVAL` above the frequency's cap
pub fn decode(text: &str) -> RfcResult<RecurrenceRule> {
    let mut dtstart = None;
    let mut rrule = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let (head, value) = line
            .split_once(':')
            .ok_or_else(|| malformed(format!("line '{line}' has no ':' separator")))?;
        let mut params = head.split(';');
        let name = params.next().unwrap_or_default().to_ascii_uppercase();

        match name.as_str() {
            DTSTART_PROPERTY => {
                let start = parse_dtstart(params, value)?;
                set_once(&mut dtstart, start, DTSTART_PROPERTY)?;
            }
            RRULE_PROPERTY => {
                if params.next().is_some() {
                    return Err(malformed("RRULE takes no parameters"));
                }
                set_once(&mut rrule, value, RRULE_PROPERTY)?;
            }
            other => {
                return Err(malformed(format!("unsupported property '{other}'")));
            }
        }
    }

    let start = dtstart.ok_or_else(|| malformed("missing DTSTART"))?;
    let rrule = rrule.ok_or_else(|| malformed("missing RRULE"))?;
    let rule = RecurrenceRule::from_parts(parse_rrule(rrule, start)?)?;

    tracing::trace!(rule = %rule, "Decoded recurrence rule");
    Ok(rule)
}

fn malformed(message: impl Into<String>) -> RfcError {
    RfcError::MalformedRule(message.into())
}

fn set_once<T>(slot: &mut Option<T>, value: T, name: &str) -> RfcResult<()> {
    if slot.replace(value).is_some() {
        return Err(malformed(format!("duplicate {name}")));
    }
    Ok(())
}

fn parse_dtstart<'a>(
    params: impl Iterator<Item = &'a str>,
    value: &str,
) -> RfcResult<DateTime<Tz>> {
    let mut tzid = None;
    for param in params {
        let (key, param_value) = param
            .split_once('=')
            .ok_or_else(|| malformed(format!("DTSTART parameter '{param}' has no value")))?;
        match key.to_ascii_uppercase().as_str() {
            "TZID" => set_once(&mut tzid, param_value, "TZID")?,
            "VALUE" if param_value.eq_ignore_ascii_case("DATE-TIME") => {}
            _ => {
                return Err(malformed(format!(
                    "unsupported DTSTART parameter '{param}'"
                )));
            }
        }
    }

    let (local_text, is_utc) = match value.strip_suffix(['Z', 'z']) {
        Some(stripped) => (stripped, true),
        None => (value, false),
    };
    let naive = NaiveDateTime::parse_from_str(local_text, DATE_TIME_FORMAT)
        .map_err(|err| malformed(format!("invalid DTSTART '{value}': {err}")))?;

    match (tzid, is_utc) {
        (Some(_), true) => Err(malformed("DTSTART cannot combine TZID with a UTC time")),
        (Some(name), false) => {
            let tz = name
                .parse::<Tz>()
                .map_err(|err| malformed(format!("unknown TZID '{name}': {err}")))?;
            tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
                malformed(format!("DTSTART {value} does not exist in timezone {name}"))
            })
        }
        // Floating times are read as UTC
        (None, _) => Ok(Tz::UTC.from_utc_datetime(&naive)),
    }
}

fn parse_rrule(value: &str, start: DateTime<Tz>) -> RfcResult<RuleParts> {
    let tz = start.timezone();
    let mut frequency = None;
    let mut interval = None;
    let mut by_weekday = None;
    let mut by_month_day = None;
    let mut until = None;

    for part in value.split(';').filter(|part| !part.is_empty()) {
        let (key, part_value) = part
            .split_once('=')
            .ok_or_else(|| malformed(format!("rule part '{part}' has no value")))?;

        match key.to_ascii_uppercase().as_str() {
            "FREQ" => {
                let parsed = Frequency::parse(part_value).ok_or_else(|| {
                    malformed(format!("unsupported frequency '{part_value}'"))
                })?;
                set_once(&mut frequency, parsed, "FREQ")?;
            }
            "INTERVAL" => {
                let parsed = part_value
                    .parse::<u32>()
                    .map_err(|err| malformed(format!("invalid INTERVAL '{part_value}': {err}")))?;
                set_once(&mut interval, parsed, "INTERVAL")?;
            }
            "BYDAY" => {
                let parsed = part_value
                    .split(',')
                    .map(|day| {
                        Weekday::parse(day)
                            .ok_or_else(|| malformed(format!("unsupported BYDAY value '{day}'")))
                    })
                    .collect::<RfcResult<BTreeSet<_>>>()?;
                set_once(&mut by_weekday, parsed, "BYDAY")?;
            }
            "BYMONTHDAY" => {
                let parsed = part_value.parse::<u8>().map_err(|err| {
                    malformed(format!(
                        "BYMONTHDAY must be a single day 1..=31, got '{part_value}': {err}"
                    ))
                })?;
                set_once(&mut by_month_day, parsed, "BYMONTHDAY")?;
            }
            "UNTIL" => set_once(&mut until, parse_until(part_value, tz)?, "UNTIL")?,
            other => return Err(malformed(format!("unsupported rule part '{other}'"))),
        }
    }

    Ok(RuleParts {
        frequency: frequency.ok_or_else(|| malformed("missing FREQ"))?,
        interval,
        start,
        by_weekday: by_weekday.unwrap_or_default(),
        by_month_day,
        until,
    })
}

fn parse_until(value: &str, tz: Tz) -> RfcResult<DateTime<Utc>> {
    if let Some(utc_text) = value.strip_suffix(['Z', 'z']) {
        let naive = NaiveDateTime::parse_from_str(utc_text, DATE_TIME_FORMAT)
            .map_err(|err| malformed(format!("invalid UNTIL '{value}': {err}")))?;
        return Ok(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return end_of_day(date, tz);
    }

    Err(malformed(format!(
        "UNTIL must be a UTC date-time or a date, got '{value}'"
    )))
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tz = self.timezone();
        let local = self.start().naive_local().format(DATE_TIME_FORMAT);
        if tz == Tz::UTC {
            writeln!(f, "{DTSTART_PROPERTY}:{local}Z")?;
        } else {
            writeln!(f, "{DTSTART_PROPERTY};TZID={}:{local}", tz.name())?;
        }

        let mut parts = vec![format!("FREQ={}", self.frequency())];

        if self.interval() != 1 {
            parts.push(format!("INTERVAL={}", self.interval()));
        }

        if !self.by_weekday().is_empty() {
            let days: Vec<_> = self.by_weekday().iter().map(ToString::to_string).collect();
            parts.push(format!("BYDAY={}", days.join(",")));
        }

        if let Some(day) = self.by_month_day() {
            parts.push(format!("BYMONTHDAY={day}"));
        }

        if let Some(until) = self.until() {
            parts.push(format!("UNTIL={}Z", until.format(DATE_TIME_FORMAT)));
        }

        write!(f, "{RRULE_LINE_PREFIX}{}", parts.join(";"))
    }
}

impl FromStr for RecurrenceRule {
    type Err = RfcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl TryFrom<String> for RecurrenceRule {
    type Error = RfcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode(&value)
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        encode(&rule)
    }
}
