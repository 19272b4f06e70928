//! Human-readable description of a recurrence rule.

use std::fmt;

use serde::Serialize;

use super::expand::occurrence_count;
use super::rule::{Frequency, RecurrenceRule};
use crate::error::RfcResult;

/// Rendered rule description plus its occurrence count when bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    pub text: String,
    pub occurrence_count: Option<usize>,
}

impl fmt::Display for RuleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.occurrence_count {
            Some(1) => write!(f, "{} (1 occurrence)", self.text),
            Some(count) => write!(f, "{} ({count} occurrences)", self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// ## Summary
/// Describes `rule` in English, e.g. "Every 2 weeks on Monday, Wednesday at
/// 9:00AM until Mar 2, 2025", and counts its occurrences if it has an `until`.
/// A weekly rule with no weekdays reads "on no days" and counts zero.
///
/// ## Errors
/// Returns any expansion error raised while counting occurrences.
pub fn summarize(rule: &RecurrenceRule) -> RfcResult<RuleSummary> {
    let (singular, plural) = match rule.frequency() {
        Frequency::Daily => ("day", "days"),
        Frequency::Weekly => ("week", "weeks"),
        Frequency::Monthly => ("month", "months"),
    };

    let mut text = if rule.interval() == 1 {
        format!("Every {singular}")
    } else {
        format!("Every {} {plural}", rule.interval())
    };

    if rule.frequency() == Frequency::Weekly {
        let days: Vec<_> = rule.by_weekday().iter().map(|day| day.name()).collect();
        let days = if days.is_empty() {
            String::from("no days")
        } else {
            days.join(", ")
        };
        text.push_str(" on ");
        text.push_str(&days);
    }

    if let Some(day) = rule.by_month_day() {
        text.push_str(&format!(" on day {day}"));
    }

    text.push_str(&format!(" at {}", rule.start().format("%-I:%M%p")));

    let occurrence_count = match rule.until() {
        Some(until) => {
            let local_until = until.with_timezone(&rule.timezone());
            text.push_str(&format!(" until {}", local_until.format("%b %-d, %Y")));
            Some(occurrence_count(rule)?)
        }
        None => None,
    };

    Ok(RuleSummary {
        text,
        occurrence_count,
    })
}
