use rota_test::core::types::RecordId;
use rota_test::fixtures::{clocked_in, series, utc};
use rota_test::gateway::{Recorded, RecordingGateway};
use rota_test::rfc::error::RfcError;
use rota_test::service::error::ServiceError;
use rota_test::service::schedule::{
    BulkDeleteShiftCommand, DeletePlan, EditPlan, MutationScope, ShiftEdit, ShiftSubmitter, apply,
    plan_delete, plan_edit,
};

/// Weekday shifts for the first two weeks of March 2025.
const WEEKDAYS: &str =
    "DTSTART:20250303T090000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20250314T235959Z";

#[test_log::test]
fn future_edit_spans_from_occurrence_to_series_end() {
    let series = series("series-1", WEEKDAYS);
    assert_eq!(series.instances.len(), 10);
    let current = &series.instances[3];
    let edited = apply(
        current,
        ShiftEdit::SetClassification {
            classification: "respite".to_string(),
        },
    )
    .unwrap();

    let plan = plan_edit(
        current,
        &edited,
        MutationScope::FutureOccurrences { to: None },
        Some(&series),
        utc(2025, 3, 1, 0, 0),
    )
    .unwrap();

    let EditPlan::Bulk(command) = plan else {
        panic!("expected bulk update, got {plan:?}");
    };
    assert_eq!(command.series_id, RecordId::from("series-1"));
    assert_eq!(command.from, utc(2025, 3, 6, 9, 0));
    assert_eq!(command.to, series.rule.until().unwrap());
    assert_eq!(
        command.payload.changes.classification.as_deref(),
        Some("respite")
    );
}

#[test_log::test]
fn inverted_explicit_range_fails_before_anything_else() {
    let series = series("series-1", WEEKDAYS);
    let occurrence = clocked_in(series.instances[0].clone());

    let result = plan_delete(
        &occurrence,
        MutationScope::ExplicitRange {
            start: utc(2025, 3, 12, 0, 0),
            end: utc(2025, 3, 5, 0, 0),
        },
        Some(&series),
        utc(2025, 4, 1, 0, 0),
    );
    assert!(matches!(result, Err(ServiceError::RangeOrder { .. })));
}

#[test_log::test]
fn clocked_in_instance_blocks_bulk_delete() {
    let mut series = series("series-1", WEEKDAYS);
    series.instances[6] = clocked_in(series.instances[6].clone());
    let occurrence = series.instances[5].clone();

    let result = plan_delete(
        &occurrence,
        MutationScope::FutureOccurrences { to: None },
        Some(&series),
        utc(2025, 3, 1, 0, 0),
    );
    let Err(ServiceError::PastOccurrence { instance_id, .. }) = result else {
        panic!("expected PastOccurrence, got {result:?}");
    };
    assert_eq!(instance_id, series.instances[6].id);

    // A range stopping before the clocked-in instance is fine
    let plan = plan_delete(
        &occurrence,
        MutationScope::FutureOccurrences {
            to: Some(utc(2025, 3, 10, 23, 0)),
        },
        Some(&series),
        utc(2025, 3, 1, 0, 0),
    );
    assert!(plan.is_ok());
}

#[test_log::test]
fn delete_all_anchors_at_now_and_ignores_elapsed_instances() {
    let series = series("series-1", WEEKDAYS);
    let occurrence = series.instances[8].clone();
    let now = utc(2025, 3, 7, 12, 0);

    let plan = plan_delete(
        &occurrence,
        MutationScope::AllOccurrences,
        Some(&series),
        now,
    )
    .unwrap();
    assert_eq!(
        plan,
        DeletePlan::Bulk(BulkDeleteShiftCommand {
            series_id: RecordId::from("series-1"),
            from: now,
            to: series.rule.until().unwrap(),
        })
    );
}

#[test_log::test]
fn future_scope_on_open_ended_series_needs_an_end() {
    let mut series = series("series-1", WEEKDAYS);
    let open_ended = rota_test::fixtures::rule(
        "DTSTART:20250303T090000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR",
    );
    series.rule = open_ended.clone();
    let mut occurrence = series.instances[2].clone();
    if let Some(series_ref) = occurrence.series.as_mut() {
        series_ref.rule = open_ended;
    }

    let result = plan_delete(
        &occurrence,
        MutationScope::FutureOccurrences { to: None },
        Some(&series),
        utc(2025, 3, 1, 0, 0),
    );
    assert!(matches!(
        result,
        Err(ServiceError::RfcError(RfcError::UnboundedRule))
    ));
}

#[test_log::test(tokio::test)]
async fn bulk_delete_is_one_gateway_call() {
    let series = series("series-1", WEEKDAYS);
    let plan = plan_delete(
        &series.instances[0],
        MutationScope::ExplicitRange {
            start: utc(2025, 3, 3, 0, 0),
            end: utc(2025, 3, 14, 23, 59),
        },
        Some(&series),
        utc(2025, 3, 1, 0, 0),
    )
    .unwrap();

    let submitter = ShiftSubmitter::new(RecordingGateway::default());
    let event = submitter.submit_delete(&plan).await.unwrap();
    assert_eq!(event.from, Some(utc(2025, 3, 3, 0, 0)));

    let DeletePlan::Bulk(command) = plan else {
        panic!("expected bulk delete");
    };
    assert_eq!(
        submitter.gateway().calls(),
        vec![Recorded::BulkDelete(command)]
    );
}
