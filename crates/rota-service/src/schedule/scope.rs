//! Resolves how far a mutation of one occurrence reaches into its series, and
//! whether everything in reach may still be changed.

use chrono::{DateTime, Utc};
use rota_core::types::RecordId;
use rota_rfc::error::RfcError;
use serde::{Deserialize, Serialize};

use super::model::{SeriesRef, ShiftInstance, ShiftOccurrenceSeries};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MutationScope {
    ThisOccurrenceOnly,
    /// From the edited occurrence's start to `to`, or the series `until`.
    FutureOccurrences { to: Option<DateTime<Utc>> },
    ExplicitRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// From now to the series `until`.
    AllOccurrences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ResolvedScope {
    Occurrence {
        instance_id: RecordId,
    },
    Series {
        series_id: RecordId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

const STARTED: &str = "has already started";
const CLOCKED_IN: &str = "has staff clocked in";

fn past(instance: &ShiftInstance, reason: &'static str) -> ServiceError {
    ServiceError::PastOccurrence {
        instance_id: instance.id.clone(),
        starts_at: instance.starts_at(),
        reason,
    }
}

fn check_range(from: DateTime<Utc>, to: DateTime<Utc>) -> ServiceResult<()> {
    if to < from {
        return Err(ServiceError::RangeOrder { from, to });
    }
    Ok(())
}

fn series_end(series: &SeriesRef) -> ServiceResult<DateTime<Utc>> {
    series
        .rule
        .until()
        .ok_or(ServiceError::RfcError(RfcError::UnboundedRule))
}

/// ## Summary
/// Resolves `scope` for a mutation of `occurrence` at instant `now`.
///
/// An explicit range is checked for order before anything else. A single
/// occurrence may be edited until it starts; deleting it is also blocked once
/// any staff member has clocked in. Series scopes check every known instance
/// starting in the resolved range, including `occurrence` itself.
///
/// ## Errors
/// - `ServiceError::RangeOrder` if the range ends before it starts
/// - `ServiceError::NotInSeries` for a series scope on a standalone shift
/// - `ServiceError::RfcError(UnboundedRule)` if no end was chosen and the rule
///   has no `until`
/// - `ServiceError::PastOccurrence` naming the first ineligible instance
/// - `ServiceError::ValidationError` if `series` is not the occurrence's series
#[tracing::instrument(skip(occurrence, series), fields(instance_id = %occurrence.id))]
pub fn resolve(
    kind: MutationKind,
    scope: MutationScope,
    occurrence: &ShiftInstance,
    series: Option<&ShiftOccurrenceSeries>,
    now: DateTime<Utc>,
) -> ServiceResult<ResolvedScope> {
    if let MutationScope::ExplicitRange { start, end } = scope {
        check_range(start, end)?;
    }

    let (from, to) = match scope {
        MutationScope::ThisOccurrenceOnly => {
            if occurrence.has_started(now) {
                return Err(past(occurrence, STARTED));
            }
            if kind == MutationKind::Delete && occurrence.has_clock_in() {
                return Err(past(occurrence, CLOCKED_IN));
            }
            tracing::debug!("Resolved to single occurrence");
            return Ok(ResolvedScope::Occurrence {
                instance_id: occurrence.id.clone(),
            });
        }
        MutationScope::FutureOccurrences { to } => {
            let series_ref = series_of(occurrence)?;
            let to = match to {
                Some(to) => to,
                None => series_end(series_ref)?,
            };
            (occurrence.starts_at(), to)
        }
        MutationScope::ExplicitRange { start, end } => {
            series_of(occurrence)?;
            (start, end)
        }
        MutationScope::AllOccurrences => (now, series_end(series_of(occurrence)?)?),
    };
    check_range(from, to)?;

    let series_ref = series_of(occurrence)?;
    if let Some(series) = series
        && series.id != series_ref.series_id
    {
        return Err(ServiceError::ValidationError(format!(
            "occurrence {} belongs to series {}, not {}",
            occurrence.id, series_ref.series_id, series.id
        )));
    }

    let in_range = |instance: &&ShiftInstance| {
        instance.starts_at() >= from && instance.starts_at() <= to
    };
    let known = std::iter::once(occurrence).filter(in_range).chain(
        series
            .into_iter()
            .flat_map(|series| series.instances_between(from, to))
            .filter(|instance| instance.id != occurrence.id),
    );
    for instance in known {
        if instance.has_started(now) {
            return Err(past(instance, STARTED));
        }
        if instance.has_clock_in() {
            return Err(past(instance, CLOCKED_IN));
        }
    }

    tracing::debug!(series_id = %series_ref.series_id, %from, %to, "Resolved to series range");
    Ok(ResolvedScope::Series {
        series_id: series_ref.series_id.clone(),
        from,
        to,
    })
}

fn series_of(occurrence: &ShiftInstance) -> ServiceResult<&SeriesRef> {
    occurrence
        .series
        .as_ref()
        .ok_or_else(|| ServiceError::NotInSeries(occurrence.id.clone()))
}
