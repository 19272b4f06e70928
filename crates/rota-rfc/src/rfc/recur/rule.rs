//! Recurrence rule for repeating shifts (a subset of RFC 5545 §3.3.10).

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use rota_core::constants::{MAX_DAILY_INTERVAL, MAX_MONTHLY_INTERVAL, MAX_WEEKLY_INTERVAL};
use serde::{Deserialize, Serialize};

use crate::error::{RfcError, RfcResult};

/// Last representable second of a calendar day; `UNTIL` has no sub-second part.
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => panic!("23:59:59 is a valid time of day"),
};

/// Recurrence frequency supported for shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            _ => return None,
        })
    }

    /// Largest `INTERVAL` accepted for this frequency.
    #[must_use]
    pub const fn max_interval(self) -> u32 {
        match self {
            Self::Daily => MAX_DAILY_INTERVAL,
            Self::Weekly => MAX_WEEKLY_INTERVAL,
            Self::Monthly => MAX_MONTHLY_INTERVAL,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    /// Returns the English day name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            "SU" => Self::Sunday,
            _ => return None,
        })
    }

    /// Returns all weekdays in order (Monday through Sunday).
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence rule attached to a shift series.
///
/// Immutable: every edit returns a new rule and leaves the receiver untouched,
/// so a rejected edit never disturbs the rule being edited. Canonical text is
/// produced by [`Display`](fmt::Display) and read back by
/// [`decode`](super::decode); serde uses the same text.
///
/// Invariants upheld by every constructor:
/// - `interval` is within `1..=frequency.max_interval()`
/// - `by_weekday` is empty unless the frequency is weekly
/// - `by_month_day` is `None` unless the frequency is monthly, and within `1..=31`
/// - `start` has no sub-second component
/// - `start` is the earliest instant with its local wall-clock time, so the
///   `TZID` form of the text names exactly one instant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    start: DateTime<Tz>,
    by_weekday: BTreeSet<Weekday>,
    by_month_day: Option<u8>,
    until: Option<DateTime<Utc>>,
}

/// Raw fields of a rule prior to validation.
#[derive(Debug, Clone)]
pub(crate) struct RuleParts {
    pub frequency: Frequency,
    pub interval: Option<u32>,
    pub start: DateTime<Tz>,
    pub by_weekday: BTreeSet<Weekday>,
    pub by_month_day: Option<u8>,
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// ## Summary
    /// Creates an unbounded rule with interval 1 and the anchor defaults for
    /// `frequency` derived from `start` (see [`Self::with_frequency`]).
    #[must_use]
    pub fn new(frequency: Frequency, start: DateTime<Tz>) -> Self {
        let start = canonical_start(start);
        let (by_weekday, by_month_day) = anchors_for(frequency, &start);
        Self {
            frequency,
            interval: 1,
            start,
            by_weekday,
            by_month_day,
            until: None,
        }
    }

    /// ## Summary
    /// Builds a rule from decoded parts, enforcing the type invariants.
    ///
    /// ## Errors
    /// - `RfcError::InvalidInterval` if the interval is zero or above the cap
    /// - `RfcError::MalformedRule` if a by-part does not fit the frequency
    pub(crate) fn from_parts(parts: RuleParts) -> RfcResult<Self> {
        let interval = parts.interval.unwrap_or(1);
        check_interval(parts.frequency, interval)?;

        if parts.frequency != Frequency::Weekly && !parts.by_weekday.is_empty() {
            return Err(RfcError::MalformedRule(format!(
                "BYDAY is only supported for WEEKLY rules, not {}",
                parts.frequency
            )));
        }

        if let Some(day) = parts.by_month_day {
            if parts.frequency != Frequency::Monthly {
                return Err(RfcError::MalformedRule(format!(
                    "BYMONTHDAY is only supported for MONTHLY rules, not {}",
                    parts.frequency
                )));
            }
            if !(1..=31).contains(&day) {
                return Err(RfcError::MalformedRule(format!(
                    "BYMONTHDAY must be within 1..=31, got {day}"
                )));
            }
        }

        Ok(Self {
            frequency: parts.frequency,
            interval,
            start: canonical_start(parts.start),
            by_weekday: parts.by_weekday,
            by_month_day: parts.by_month_day,
            until: parts.until,
        })
    }

    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Start of the first occurrence in the rule's timezone.
    #[must_use]
    pub const fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    #[must_use]
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    #[must_use]
    pub const fn by_weekday(&self) -> &BTreeSet<Weekday> {
        &self.by_weekday
    }

    #[must_use]
    pub const fn by_month_day(&self) -> Option<u8> {
        self.by_month_day
    }

    /// Inclusive end of the recurrence.
    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// ## Summary
    /// Switches the frequency, resetting the interval to 1.
    ///
    /// Weekly rules get the start date's weekday as their only day, monthly
    /// rules get the start date's day-of-month, and daily rules clear both.
    /// Start, timezone and `until` are preserved.
    #[must_use]
    pub fn with_frequency(&self, frequency: Frequency) -> Self {
        let (by_weekday, by_month_day) = anchors_for(frequency, &self.start);
        Self {
            frequency,
            interval: 1,
            by_weekday,
            by_month_day,
            ..self.clone()
        }
    }

    /// ## Summary
    /// Switches the frequency like [`Self::with_frequency`] but keeps an
    /// explicit interval instead of resetting it.
    ///
    /// ## Errors
    /// Returns `RfcError::InvalidInterval` if `interval` exceeds the new
    /// frequency's cap or is zero.
    pub fn with_frequency_and_interval(&self, frequency: Frequency, interval: u32) -> RfcResult<Self> {
        check_interval(frequency, interval)?;
        Ok(Self {
            interval,
            ..self.with_frequency(frequency)
        })
    }

    /// ## Summary
    /// Replaces the interval.
    ///
    /// ## Errors
    /// Returns `RfcError::InvalidInterval` if `interval` is zero or above the
    /// cap for the rule's frequency (daily 15, weekly 12, monthly 3).
    pub fn with_interval(&self, interval: u32) -> RfcResult<Self> {
        check_interval(self.frequency, interval)?;
        Ok(Self {
            interval,
            ..self.clone()
        })
    }

    /// ## Summary
    /// Adds `day` to the weekly day set, or removes it if already present.
    ///
    /// Removing the last day is allowed here; [`Self::validate_for_submission`]
    /// rejects the empty set.
    ///
    /// ## Errors
    /// Returns `RfcError::ValidationError` if the rule is not weekly.
    pub fn toggle_weekday(&self, day: Weekday) -> RfcResult<Self> {
        if self.frequency != Frequency::Weekly {
            return Err(RfcError::ValidationError(format!(
                "weekday selection requires a WEEKLY rule, not {}",
                self.frequency
            )));
        }

        let mut by_weekday = self.by_weekday.clone();
        if !by_weekday.remove(&day) {
            by_weekday.insert(day);
        }

        Ok(Self {
            by_weekday,
            ..self.clone()
        })
    }

    /// ## Summary
    /// Replaces the day-of-month anchor of a monthly rule.
    ///
    /// ## Errors
    /// Returns `RfcError::ValidationError` if the rule is not monthly or `day`
    /// is outside `1..=31`.
    pub fn with_month_day(&self, day: u8) -> RfcResult<Self> {
        if self.frequency != Frequency::Monthly {
            return Err(RfcError::ValidationError(format!(
                "day-of-month selection requires a MONTHLY rule, not {}",
                self.frequency
            )));
        }
        if !(1..=31).contains(&day) {
            return Err(RfcError::ValidationError(format!(
                "day of month must be within 1..=31, got {day}"
            )));
        }

        Ok(Self {
            by_month_day: Some(day),
            ..self.clone()
        })
    }

    /// ## Summary
    /// Sets `until` to the end of `date` (23:59:59) in the rule's timezone.
    ///
    /// ## Errors
    /// Returns `RfcError::ValidationError` if that local time does not exist in
    /// the zone.
    pub fn with_until(&self, date: NaiveDate) -> RfcResult<Self> {
        Ok(self.with_until_instant(end_of_day(date, self.timezone())?))
    }

    #[must_use]
    pub(crate) fn with_until_instant(&self, until: DateTime<Utc>) -> Self {
        Self {
            until: Some(truncate_subsec(until)),
            ..self.clone()
        }
    }

    /// ## Summary
    /// Re-derives the start from `start`, converted into the rule's timezone.
    ///
    /// Frequency, interval, weekday set, day-of-month and `until` are kept as
    /// they are. A start in the repeated hour of a DST fall-back is moved to
    /// the first of the two instants sharing its wall-clock time.
    #[must_use]
    pub fn with_start(&self, start: DateTime<Utc>) -> Self {
        Self {
            start: canonical_start(start.with_timezone(&self.timezone())),
            ..self.clone()
        }
    }

    /// ## Summary
    /// Checks the rule is complete enough to be persisted.
    ///
    /// ## Errors
    /// Returns `RfcError::ValidationError` for a weekly rule with no weekdays.
    pub fn validate_for_submission(&self) -> RfcResult<()> {
        if self.frequency == Frequency::Weekly && self.by_weekday.is_empty() {
            return Err(RfcError::ValidationError(
                "a weekly rule needs at least one weekday".to_string(),
            ));
        }
        Ok(())
    }
}

impl PartialEq for RecurrenceRule {
    fn eq(&self, other: &Self) -> bool {
        self.frequency == other.frequency
            && self.interval == other.interval
            && self.start == other.start
            && self.start.timezone() == other.start.timezone()
            && self.by_weekday == other.by_weekday
            && self.by_month_day == other.by_month_day
            && self.until == other.until
    }
}

impl Eq for RecurrenceRule {}

fn check_interval(frequency: Frequency, interval: u32) -> RfcResult<()> {
    let max = frequency.max_interval();
    if interval == 0 || interval > max {
        return Err(RfcError::InvalidInterval {
            frequency,
            interval,
            max,
        });
    }
    Ok(())
}

fn anchors_for(frequency: Frequency, start: &DateTime<Tz>) -> (BTreeSet<Weekday>, Option<u8>) {
    match frequency {
        Frequency::Daily => (BTreeSet::new(), None),
        Frequency::Weekly => (BTreeSet::from([Weekday::from(start.weekday())]), None),
        Frequency::Monthly => (BTreeSet::new(), u8::try_from(start.day()).ok()),
    }
}

/// Drops sub-second precision and resolves a wall-clock time repeated by a
/// DST fall-back to its earlier instant, the one `decode` reads back.
fn canonical_start(start: DateTime<Tz>) -> DateTime<Tz> {
    let start = truncate_subsec(start);
    start
        .timezone()
        .from_local_datetime(&start.naive_local())
        .earliest()
        .unwrap_or(start)
}

fn truncate_subsec<T: TimeZone>(value: DateTime<T>) -> DateTime<T> {
    value.with_nanosecond(0).unwrap_or(value)
}

/// ## Summary
/// Returns 23:59:59 of `date` in `tz`, as a UTC instant.
///
/// When the local time is repeated by a DST transition the later instant wins.
///
/// ## Errors
/// Returns `RfcError::ValidationError` if the local time does not exist.
pub(crate) fn end_of_day(date: NaiveDate, tz: Tz) -> RfcResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(END_OF_DAY))
        .latest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            RfcError::ValidationError(format!(
                "end of day {date} does not exist in timezone {}",
                tz.name()
            ))
        })
}
