//! Shift instances, series and their nested collections.

use chrono::{DateTime, Utc};
use rota_core::types::{PartyId, RecordId};
use rota_rfc::rfc::recur::RecurrenceRule;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Half-open interval `[time_from, time_to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub time_from: DateTime<Utc>,
    pub time_to: DateTime<Utc>,
}

impl TimeWindow {
    /// ## Summary
    /// Builds a window, rejecting one whose end precedes its start.
    ///
    /// ## Errors
    /// Returns `ServiceError::ValidationError` if `time_to < time_from`.
    pub fn new(time_from: DateTime<Utc>, time_to: DateTime<Utc>) -> ServiceResult<Self> {
        let window = Self { time_from, time_to };
        window.validate()?;
        Ok(window)
    }

    /// ## Errors
    /// Returns `ServiceError::ValidationError` if the end precedes the start.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.time_to < self.time_from {
            return Err(ServiceError::ValidationError(format!(
                "time window ends at {} before it starts at {}",
                self.time_to, self.time_from
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.time_to - self.time_from
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Scalar fields of a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDetails {
    #[serde(flatten)]
    pub window: TimeWindow,
    pub classification: String,
    #[serde(default)]
    pub location: Location,
}

/// A client bound to a shift for part or all of its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub client: PartyId,
    #[serde(flatten)]
    pub window: TimeWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_book: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund: Option<RecordId>,
}

impl ClientAssignment {
    #[must_use]
    pub fn new(client: PartyId, window: TimeWindow) -> Self {
        Self {
            id: None,
            client,
            window,
            price_book: None,
            fund: None,
        }
    }
}

/// A staff member rostered onto a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub staff: PartyId,
    #[serde(flatten)]
    pub window: TimeWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// Set by persistence when the staff member clocks in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clocked_in_at: Option<DateTime<Utc>>,
}

impl StaffAssignment {
    #[must_use]
    pub fn new(staff: PartyId, window: TimeWindow) -> Self {
        Self {
            id: None,
            staff,
            window,
            payment_method: None,
            clocked_in_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_completed: bool,
}

impl Task {
    #[must_use]
    pub fn new(name: impl Into<String>, is_mandatory: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_mandatory,
            is_completed: false,
        }
    }
}

/// Back-reference from an occurrence to the series that generated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRef {
    pub series_id: RecordId,
    pub rule: RecurrenceRule,
}

/// One concrete scheduled shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftInstance {
    pub id: RecordId,
    #[serde(flatten)]
    pub details: ShiftDetails,
    #[serde(default)]
    pub client_assignments: Vec<ClientAssignment>,
    #[serde(default)]
    pub staff_assignments: Vec<StaffAssignment>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesRef>,
}

impl ShiftInstance {
    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.details.window.time_from
    }

    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at() <= now
    }

    #[must_use]
    pub fn has_clock_in(&self) -> bool {
        self.staff_assignments
            .iter()
            .any(|assignment| assignment.clocked_in_at.is_some())
    }

    #[must_use]
    pub fn series_id(&self) -> Option<&RecordId> {
        self.series.as_ref().map(|series| &series.series_id)
    }
}

/// A recurrence rule and the occurrences already materialized from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftOccurrenceSeries {
    pub id: RecordId,
    pub rule: RecurrenceRule,
    #[serde(default)]
    pub instances: Vec<ShiftInstance>,
}

impl ShiftOccurrenceSeries {
    /// Known instances starting within `[from, to]`.
    pub fn instances_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = &ShiftInstance> {
        self.instances
            .iter()
            .filter(move |instance| instance.starts_at() >= from && instance.starts_at() <= to)
    }
}
