//! Rota - integration test support.
//!
//! Re-exports the workspace crates and provides shift fixtures plus a
//! recording gateway shared by the integration tests.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

pub use rota_app as app;
pub use rota_core as core;
pub use rota_rfc as rfc;
pub use rota_service as service;

pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rota_core::types::{PartyId, RecordId};
    use rota_rfc::rfc::recur::{RecurrenceRule, occurrences};
    use rota_service::schedule::{
        Location, SeriesRef, ShiftDetails, ShiftInstance, ShiftOccurrenceSeries, StaffAssignment,
        Task, TimeWindow,
    };

    /// UTC instant on a whole minute.
    #[must_use]
    pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("fixture instant must exist")
    }

    #[must_use]
    pub fn rule(text: &str) -> RecurrenceRule {
        text.parse().expect("fixture rule must decode")
    }

    /// A standalone eight-hour shift with one rostered staff member and one task.
    #[must_use]
    pub fn shift(id: &str, starts_at: DateTime<Utc>) -> ShiftInstance {
        let window =
            TimeWindow::new(starts_at, starts_at + Duration::hours(8)).expect("window is ordered");
        ShiftInstance {
            id: RecordId::from(id),
            details: ShiftDetails {
                window,
                classification: "community".to_string(),
                location: Location {
                    address: Some("1 Main St".to_string()),
                    ..Location::default()
                },
            },
            client_assignments: Vec::new(),
            staff_assignments: vec![StaffAssignment {
                id: Some(RecordId::new(format!("{id}-staff-1"))),
                ..StaffAssignment::new(PartyId::from("S1"), window)
            }],
            tasks: vec![Task {
                id: Some(RecordId::new(format!("{id}-task-1"))),
                ..Task::new("wash dishes", false)
            }],
            series: None,
        }
    }

    /// A series whose instances are every occurrence of `rule_text`.
    #[must_use]
    pub fn series(series_id: &str, rule_text: &str) -> ShiftOccurrenceSeries {
        let rule = rule(rule_text);
        let instances = occurrences(&rule)
            .expect("fixture rule must be bounded")
            .into_iter()
            .enumerate()
            .map(|(n, starts_at)| ShiftInstance {
                series: Some(SeriesRef {
                    series_id: RecordId::from(series_id),
                    rule: rule.clone(),
                }),
                ..shift(&format!("{series_id}-{n}"), starts_at)
            })
            .collect();

        ShiftOccurrenceSeries {
            id: RecordId::from(series_id),
            rule,
            instances,
        }
    }

    /// Marks every staff member of `shift` as clocked in at its start.
    #[must_use]
    pub fn clocked_in(mut shift: ShiftInstance) -> ShiftInstance {
        let at = shift.starts_at();
        for assignment in &mut shift.staff_assignments {
            assignment.clocked_in_at = Some(at);
        }
        shift
    }
}

pub mod gateway {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rota_service::schedule::{
        BulkDeleteShiftCommand, BulkUpdateShiftCommand, DeleteShiftCommand, ShiftGateway,
        UpdateShiftCommand,
    };

    /// A gateway call as received.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Recorded {
        Update(UpdateShiftCommand),
        BulkUpdate(BulkUpdateShiftCommand),
        Delete(DeleteShiftCommand),
        BulkDelete(BulkDeleteShiftCommand),
    }

    /// Gateway that records every call and optionally fails them all.
    #[derive(Debug, Default)]
    pub struct RecordingGateway {
        calls: Mutex<Vec<Recorded>>,
        failure: Option<String>,
    }

    impl RecordingGateway {
        #[must_use]
        pub fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::default(),
                failure: Some(message.to_string()),
            }
        }

        #[must_use]
        pub fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().expect("gateway lock").clone()
        }

        fn record(&self, call: Recorded) -> anyhow::Result<()> {
            tracing::debug!(?call, "Gateway call");
            self.calls.lock().expect("gateway lock").push(call);
            match &self.failure {
                Some(message) => Err(anyhow::anyhow!("{message}")),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ShiftGateway for RecordingGateway {
        async fn update_shift(&self, command: &UpdateShiftCommand) -> anyhow::Result<()> {
            self.record(Recorded::Update(command.clone()))
        }

        async fn bulk_update_shifts(&self, command: &BulkUpdateShiftCommand) -> anyhow::Result<()> {
            self.record(Recorded::BulkUpdate(command.clone()))
        }

        async fn delete_shift(&self, command: &DeleteShiftCommand) -> anyhow::Result<()> {
            self.record(Recorded::Delete(command.clone()))
        }

        async fn bulk_delete_shifts(&self, command: &BulkDeleteShiftCommand) -> anyhow::Result<()> {
            self.record(Recorded::BulkDelete(command.clone()))
        }
    }
}
