use std::sync::{Arc, Mutex};

use rota_test::core::types::{PartyId, RecordId};
use rota_test::fixtures::{shift, utc};
use rota_test::gateway::{Recorded, RecordingGateway};
use rota_test::service::error::ServiceError;
use rota_test::service::schedule::{
    EditPlan, MutationEvent, MutationScope, MutationTarget, ShiftEdit, ShiftSubmitter, apply_all,
    build_update, plan_edit,
};

#[test_log::test(tokio::test)]
async fn single_occurrence_edit_end_to_end() {
    let current = shift("shift-1", utc(2025, 3, 10, 9, 0));
    let edited = apply_all(
        &current,
        vec![
            ShiftEdit::SetStaff {
                index: 0,
                staff: PartyId::from("S2"),
            },
            ShiftEdit::SetTaskMandatory {
                index: 0,
                is_mandatory: true,
            },
            ShiftEdit::AddClient {
                client: PartyId::from("C1"),
            },
        ],
    )
    .unwrap();

    let plan = plan_edit(
        &current,
        &edited,
        MutationScope::ThisOccurrenceOnly,
        None,
        utc(2025, 3, 1, 0, 0),
    )
    .unwrap();
    let EditPlan::Single(command) = &plan else {
        panic!("expected single update, got {plan:?}");
    };

    // Staff swap replaces the assignment rather than updating it
    let staff = &command.update.staff_assignments;
    assert_eq!(staff.delete, vec![RecordId::from("shift-1-staff-1")]);
    assert_eq!(staff.add.len(), 1);
    assert_eq!(staff.add[0].staff, PartyId::from("S2"));
    assert_eq!(staff.add[0].id, None);
    assert!(staff.update.is_empty());

    assert_eq!(command.update.tasks.update.len(), 1);
    assert!(command.update.tasks.update[0].is_mandatory);
    assert_eq!(command.update.client_assignments.add.len(), 1);
    assert!(command.update.changes.is_empty());

    let mut submitter = ShiftSubmitter::new(RecordingGateway::default());
    let events: Arc<Mutex<Vec<MutationEvent>>> = Arc::default();
    let sink = Arc::clone(&events);
    submitter.on_mutation(move |event| sink.lock().unwrap().push(event.clone()));

    let event = submitter.submit_edit(&plan).await.unwrap().unwrap();
    assert_eq!(event.target, MutationTarget::Shift(RecordId::from("shift-1")));
    assert_eq!(
        submitter.gateway().calls(),
        vec![Recorded::Update(command.clone())]
    );
    assert_eq!(events.lock().unwrap().as_slice(), &[event]);
}

#[test_log::test(tokio::test)]
async fn failed_submission_surfaces_persistence_error() {
    let current = shift("shift-1", utc(2025, 3, 10, 9, 0));
    let edited = apply_all(
        &current,
        vec![ShiftEdit::SetClassification {
            classification: "respite".to_string(),
        }],
    )
    .unwrap();
    let plan = plan_edit(
        &current,
        &edited,
        MutationScope::ThisOccurrenceOnly,
        None,
        utc(2025, 3, 1, 0, 0),
    )
    .unwrap();

    let mut submitter = ShiftSubmitter::new(RecordingGateway::failing("409 stale version"));
    let fired = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&fired);
    submitter.on_mutation(move |_| *counter.lock().unwrap() += 1);

    let err = submitter.submit_edit(&plan).await.unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
    assert!(err.to_string().contains("409 stale version"));
    assert_eq!(*fired.lock().unwrap(), 0);
    assert_eq!(submitter.gateway().calls().len(), 1);
}

#[test_log::test]
fn editing_a_started_shift_is_rejected() {
    let current = shift("shift-1", utc(2025, 3, 10, 9, 0));
    let edited = apply_all(
        &current,
        vec![ShiftEdit::RenameTask {
            index: 0,
            name: "mop floors".to_string(),
        }],
    )
    .unwrap();

    let result = plan_edit(
        &current,
        &edited,
        MutationScope::ThisOccurrenceOnly,
        None,
        utc(2025, 3, 10, 9, 30),
    );
    assert!(matches!(result, Err(ServiceError::PastOccurrence { .. })));
}

#[test_log::test]
fn update_json_matches_wire_shape() {
    let current = shift("shift-1", utc(2025, 3, 10, 9, 0));
    let edited = apply_all(
        &current,
        vec![ShiftEdit::SetTimeWindow {
            time_from: utc(2025, 3, 10, 10, 0),
            time_to: utc(2025, 3, 10, 18, 0),
        }],
    )
    .unwrap();

    let update = build_update(&current, &edited).unwrap();
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "timeFrom": "2025-03-10T10:00:00Z",
            "timeTo": "2025-03-10T18:00:00Z",
            "clientAssignments": { "add": [], "update": [], "delete": [] },
            "staffAssignments": { "add": [], "update": [], "delete": [] },
            "tasks": { "add": [], "update": [], "delete": [] }
        })
    );
}
