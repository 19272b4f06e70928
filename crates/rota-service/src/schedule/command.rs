//! Persistence commands built from a current/edited shift pair and a scope.

use chrono::{DateTime, Utc};
use rota_core::types::RecordId;
use rota_rfc::rfc::recur::RecurrenceRule;
use serde::Serialize;

use super::diff::{SchedulePatch, diff};
use super::model::{
    ClientAssignment, Location, ShiftInstance, ShiftOccurrenceSeries, StaffAssignment, Task,
};
use super::scope::{MutationKind, MutationScope, ResolvedScope, resolve};
use crate::error::{ServiceError, ServiceResult};

/// Scalar fields that differ between the current and edited shift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<RecurrenceRule>,
}

impl DetailChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUpdate {
    #[serde(flatten)]
    pub changes: DetailChanges,
    pub client_assignments: SchedulePatch<ClientAssignment>,
    pub staff_assignments: SchedulePatch<StaffAssignment>,
    pub tasks: SchedulePatch<Task>,
}

impl ShiftUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
            && self.client_assignments.is_empty()
            && self.staff_assignments.is_empty()
            && self.tasks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShiftCommand {
    pub instance_id: RecordId,
    /// Series the occurrence belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<RecordId>,
    #[serde(flatten)]
    pub update: ShiftUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateShiftCommand {
    pub series_id: RecordId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub payload: ShiftUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShiftCommand {
    pub instance_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteShiftCommand {
    pub series_id: RecordId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "command", rename_all = "camelCase")]
pub enum EditPlan {
    /// The edited state equals the current one; nothing to submit.
    Unchanged,
    Single(UpdateShiftCommand),
    Bulk(BulkUpdateShiftCommand),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "command", rename_all = "camelCase")]
pub enum DeletePlan {
    Single(DeleteShiftCommand),
    Bulk(BulkDeleteShiftCommand),
}

fn changed<T: PartialEq + Clone>(current: &T, edited: &T) -> Option<T> {
    (current != edited).then(|| edited.clone())
}

/// ## Summary
/// Collects what changed between `current` and `edited`: differing scalar
/// fields, a changed recurrence rule, and one patch per nested collection.
///
/// ## Errors
/// - `ServiceError::ValidationError` if the two states are different shifts,
///   the edited window is inverted, or the edited state drops its series
/// - `ServiceError::RfcError` if a changed rule fails submission checks
pub fn build_update(current: &ShiftInstance, edited: &ShiftInstance) -> ServiceResult<ShiftUpdate> {
    if current.id != edited.id {
        return Err(ServiceError::ValidationError(format!(
            "edited state is for shift {}, expected {}",
            edited.id, current.id
        )));
    }
    edited.details.window.validate()?;

    let rule = match (&current.series, &edited.series) {
        (Some(_), None) => {
            return Err(ServiceError::ValidationError(
                "an occurrence cannot leave its series through an edit".into(),
            ));
        }
        (None, Some(after)) => Some(after.rule.clone()),
        (Some(before), Some(after)) => changed(&before.rule, &after.rule),
        (None, None) => None,
    };
    if let Some(rule) = &rule {
        rule.validate_for_submission()?;
    }

    let before = &current.details;
    let after = &edited.details;
    let changes = DetailChanges {
        time_from: changed(&before.window.time_from, &after.window.time_from),
        time_to: changed(&before.window.time_to, &after.window.time_to),
        classification: changed(&before.classification, &after.classification),
        location: changed(&before.location, &after.location),
        rule,
    };

    Ok(ShiftUpdate {
        changes,
        client_assignments: diff(&current.client_assignments, &edited.client_assignments),
        staff_assignments: diff(&current.staff_assignments, &edited.staff_assignments),
        tasks: diff(&current.tasks, &edited.tasks),
    })
}

/// ## Summary
/// Resolves `scope` and builds the command that applies `edited` to it.
///
/// ## Errors
/// Any error from [`resolve`] (checked first) or [`build_update`].
#[tracing::instrument(skip(current, edited, series), fields(instance_id = %current.id))]
pub fn plan_edit(
    current: &ShiftInstance,
    edited: &ShiftInstance,
    scope: MutationScope,
    series: Option<&ShiftOccurrenceSeries>,
    now: DateTime<Utc>,
) -> ServiceResult<EditPlan> {
    let resolved = resolve(MutationKind::Edit, scope, current, series, now)?;
    let update = build_update(current, edited)?;

    if update.is_empty() {
        tracing::debug!("No changes to submit");
        return Ok(EditPlan::Unchanged);
    }

    Ok(match resolved {
        ResolvedScope::Occurrence { instance_id } => {
            EditPlan::Single(UpdateShiftCommand {
                instance_id,
                series_id: current.series_id().cloned(),
                update,
            })
        }
        ResolvedScope::Series {
            series_id,
            from,
            to,
        } => EditPlan::Bulk(BulkUpdateShiftCommand {
            series_id,
            from,
            to,
            payload: update,
        }),
    })
}

/// ## Summary
/// Resolves `scope` and builds the command deleting what it covers.
///
/// ## Errors
/// Any error from [`resolve`].
#[tracing::instrument(skip(occurrence, series), fields(instance_id = %occurrence.id))]
pub fn plan_delete(
    occurrence: &ShiftInstance,
    scope: MutationScope,
    series: Option<&ShiftOccurrenceSeries>,
    now: DateTime<Utc>,
) -> ServiceResult<DeletePlan> {
    Ok(
        match resolve(MutationKind::Delete, scope, occurrence, series, now)? {
            ResolvedScope::Occurrence { instance_id } => {
                DeletePlan::Single(DeleteShiftCommand {
                    instance_id,
                    series_id: occurrence.series_id().cloned(),
                })
            }
            ResolvedScope::Series {
                series_id,
                from,
                to,
            } => DeletePlan::Bulk(BulkDeleteShiftCommand {
                series_id,
                from,
                to,
            }),
        },
    )
}
