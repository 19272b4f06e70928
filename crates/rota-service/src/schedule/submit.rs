//! Hands planned commands to persistence, one in-flight mutation per shift
//! or series, and notifies listeners once a mutation lands.
//!
//! A series mutation and a mutation of one of its occurrences overlap, so
//! neither is admitted while the other is in flight.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rota_core::types::RecordId;
use serde::Serialize;

use super::command::{
    BulkDeleteShiftCommand, BulkUpdateShiftCommand, DeletePlan, DeleteShiftCommand, EditPlan,
    UpdateShiftCommand,
};
use super::scope::MutationKind;
use crate::error::{ServiceError, ServiceResult};

/// Persistence collaborator. Failures are opaque to this crate.
#[async_trait]
pub trait ShiftGateway: Send + Sync {
    /// ## Errors
    /// Any failure to persist the update.
    async fn update_shift(&self, command: &UpdateShiftCommand) -> anyhow::Result<()>;

    /// ## Errors
    /// Any failure to persist the update across the series range.
    async fn bulk_update_shifts(&self, command: &BulkUpdateShiftCommand) -> anyhow::Result<()>;

    /// ## Errors
    /// Any failure to delete the occurrence.
    async fn delete_shift(&self, command: &DeleteShiftCommand) -> anyhow::Result<()>;

    /// ## Errors
    /// Any failure to delete the series range.
    async fn bulk_delete_shifts(&self, command: &BulkDeleteShiftCommand) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum MutationTarget {
    Shift(RecordId),
    Series(RecordId),
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(id) => write!(f, "shift {id}"),
            Self::Series(id) => write!(f, "series {id}"),
        }
    }
}

/// Fired after a mutation is confirmed, so holders of stale state refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationEvent {
    pub target: MutationTarget,
    pub kind: MutationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

type Listener = Box<dyn Fn(&MutationEvent) + Send + Sync>;

/// In-flight targets, each with the series a shift target belongs to.
type InFlight = HashMap<MutationTarget, Option<RecordId>>;

fn overlaps(
    held: &MutationTarget,
    held_series: Option<&RecordId>,
    target: &MutationTarget,
    series: Option<&RecordId>,
) -> bool {
    held == target
        || matches!(held, MutationTarget::Series(id) if series == Some(id))
        || matches!(target, MutationTarget::Series(id) if held_series == Some(id))
}

/// Releases its in-flight key on drop, including when the submitting future
/// is dropped before completion.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<InFlight>,
    target: MutationTarget,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.target);
    }
}

pub struct ShiftSubmitter<G> {
    gateway: G,
    in_flight: Mutex<InFlight>,
    listeners: Vec<Listener>,
}

impl<G: ShiftGateway> ShiftSubmitter<G> {
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            in_flight: Mutex::new(HashMap::new()),
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Registers a listener for confirmed mutations.
    pub fn on_mutation(&mut self, listener: impl Fn(&MutationEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Claims `target`; `series` is the series a shift target belongs to.
    fn claim(
        &self,
        target: MutationTarget,
        series: Option<&RecordId>,
    ) -> ServiceResult<InFlightGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((held, _)) = in_flight
            .iter()
            .find(|(held, held_series)| overlaps(held, held_series.as_ref(), &target, series))
        {
            return Err(ServiceError::Conflict(format!(
                "cannot mutate {target} while a mutation of {held} is in flight"
            )));
        }
        in_flight.insert(target.clone(), series.cloned());
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            target,
        })
    }

    fn notify(&self, event: &MutationEvent) {
        tracing::debug!(target_key = %event.target, listeners = self.listeners.len(), "Mutation confirmed");
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// ## Summary
    /// Submits an edit plan. An unchanged plan issues no call and returns `None`.
    ///
    /// ## Errors
    /// - `ServiceError::Conflict` if a mutation of the same shift or series, or
    ///   of the series a shift belongs to, is in flight
    /// - `ServiceError::Persistence` if the gateway fails; no event is fired
    #[tracing::instrument(skip(self, plan))]
    pub async fn submit_edit(&self, plan: &EditPlan) -> ServiceResult<Option<MutationEvent>> {
        let event = match plan {
            EditPlan::Unchanged => return Ok(None),
            EditPlan::Single(command) => {
                let target = MutationTarget::Shift(command.instance_id.clone());
                let _guard = self.claim(target.clone(), command.series_id.as_ref())?;
                self.gateway
                    .update_shift(command)
                    .await
                    .map_err(ServiceError::Persistence)?;
                MutationEvent {
                    target,
                    kind: MutationKind::Edit,
                    from: None,
                    to: None,
                }
            }
            EditPlan::Bulk(command) => {
                let target = MutationTarget::Series(command.series_id.clone());
                let _guard = self.claim(target.clone(), None)?;
                self.gateway
                    .bulk_update_shifts(command)
                    .await
                    .map_err(ServiceError::Persistence)?;
                MutationEvent {
                    target,
                    kind: MutationKind::Edit,
                    from: Some(command.from),
                    to: Some(command.to),
                }
            }
        };

        self.notify(&event);
        Ok(Some(event))
    }

    /// ## Summary
    /// Submits a delete plan.
    ///
    /// ## Errors
    /// - `ServiceError::Conflict` under the same conditions as [`Self::submit_edit`]
    /// - `ServiceError::Persistence` if the gateway fails; no event is fired
    #[tracing::instrument(skip(self, plan))]
    pub async fn submit_delete(&self, plan: &DeletePlan) -> ServiceResult<MutationEvent> {
        let event = match plan {
            DeletePlan::Single(command) => {
                let target = MutationTarget::Shift(command.instance_id.clone());
                let _guard = self.claim(target.clone(), command.series_id.as_ref())?;
                self.gateway
                    .delete_shift(command)
                    .await
                    .map_err(ServiceError::Persistence)?;
                MutationEvent {
                    target,
                    kind: MutationKind::Delete,
                    from: None,
                    to: None,
                }
            }
            DeletePlan::Bulk(command) => {
                let target = MutationTarget::Series(command.series_id.clone());
                let _guard = self.claim(target.clone(), None)?;
                self.gateway
                    .bulk_delete_shifts(command)
                    .await
                    .map_err(ServiceError::Persistence)?;
                MutationEvent {
                    target,
                    kind: MutationKind::Delete,
                    from: Some(command.from),
                    to: Some(command.to),
                }
            }
        };

        self.notify(&event);
        Ok(event)
    }
}
