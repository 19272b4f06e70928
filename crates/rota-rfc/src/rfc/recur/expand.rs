//! Occurrence expansion using the `rrule` crate.

use chrono::{DateTime, Utc};
use rrule::RRuleSet;

use super::rule::{Frequency, RecurrenceRule};
use crate::error::{RfcError, RfcResult};

/// Hard cap on the number of occurrences produced by one expansion.
pub const MAX_EXPANDED_OCCURRENCES: u16 = u16::MAX;

/// ## Summary
/// Expands a bounded rule into the start instant of every occurrence, in
/// chronological order.
///
/// Monthly rules anchored on a day a month does not have (e.g. the 31st) skip
/// that month, following RFC 5545 `BYMONTHDAY` semantics. A weekly rule with
/// no weekdays selected has no occurrences.
///
/// ## Errors
/// - `RfcError::UnboundedRule` if the rule has no `until`
/// - `RfcError::TooManyOccurrences` if expansion hits [`MAX_EXPANDED_OCCURRENCES`]
/// - `RfcError::Expansion` if the `rrule` crate rejects the encoded rule
pub fn occurrences(rule: &RecurrenceRule) -> RfcResult<Vec<DateTime<Utc>>> {
    let until = rule.until().ok_or(RfcError::UnboundedRule)?;
    if until < rule.start_utc() {
        tracing::trace!(rule = %rule, "UNTIL precedes DTSTART, no occurrences");
        return Ok(Vec::new());
    }
    // rrule would fall back to DTSTART's weekday
    if rule.frequency() == Frequency::Weekly && rule.by_weekday().is_empty() {
        tracing::trace!(rule = %rule, "Weekly rule has no weekdays, no occurrences");
        return Ok(Vec::new());
    }

    let rrule_set = rule
        .to_string()
        .parse::<RRuleSet>()
        .map_err(|err| RfcError::Expansion(err.to_string()))?;

    let result = rrule_set.all(MAX_EXPANDED_OCCURRENCES);
    if result.limited {
        return Err(RfcError::TooManyOccurrences(MAX_EXPANDED_OCCURRENCES));
    }

    let dates: Vec<DateTime<Utc>> = result
        .dates
        .iter()
        .map(|date| date.with_timezone(&Utc))
        .collect();

    tracing::trace!(rule = %rule, count = dates.len(), "Expanded recurrence rule");
    Ok(dates)
}

/// ## Summary
/// Expands the occurrences whose start lies in `[from, to]`.
///
/// Works for unbounded rules: the expansion is cut at `to` (or the rule's own
/// `until`, whichever is earlier).
///
/// ## Errors
/// Same as [`occurrences`], except `UnboundedRule` is never returned.
pub fn occurrences_between(
    rule: &RecurrenceRule,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> RfcResult<Vec<DateTime<Utc>>> {
    if to < from {
        return Ok(Vec::new());
    }

    let bound = rule.until().map_or(to, |until| until.min(to));
    let bounded = rule.with_until_instant(bound);

    Ok(occurrences(&bounded)?
        .into_iter()
        .filter(|occurrence| *occurrence >= from && *occurrence <= to)
        .collect())
}

/// ## Summary
/// Counts the occurrences of a bounded rule.
///
/// ## Errors
/// Returns `RfcError::UnboundedRule` if `until` is absent, or any expansion
/// error from [`occurrences`].
pub fn occurrence_count(rule: &RecurrenceRule) -> RfcResult<usize> {
    Ok(occurrences(rule)?.len())
}
