use rota_test::fixtures::utc;
use rota_test::service::availability::{AvailabilityWindow, CalendarDay, summarize_availability};

#[test_log::test]
fn availability_from_json_windows() {
    let windows: Vec<AvailabilityWindow> = serde_json::from_value(serde_json::json!([
        { "from": "2025-01-01T00:00:00Z", "to": "2025-01-01T23:59:59Z" },
        { "from": "2025-01-02T09:00:00Z", "to": "2025-01-02T17:00:00Z" },
        { "from": "2025-01-02T18:00:00Z", "to": "2025-01-02T21:15:00Z" },
        { "from": "2025-01-02T09:00:00Z", "to": "2025-01-02T17:00:00Z" },
        { "from": "2025-01-03T20:00:00Z", "to": "2025-01-04T04:00:00Z" }
    ]))
    .unwrap();
    let days: Vec<CalendarDay> = serde_json::from_value(serde_json::json!([
        { "year": 2025, "month": 1, "day": 2 },
        { "year": 2025, "month": 1, "day": 1 },
        { "year": 2025, "month": 1, "day": 3 }
    ]))
    .unwrap();

    let result = summarize_availability(&windows, &days).unwrap();
    let labels: Vec<Vec<&str>> = result
        .iter()
        .map(|day| day.labels.iter().map(String::as_str).collect())
        .collect();
    assert_eq!(
        labels,
        vec![
            vec!["9:00AM-5:00PM", "6:00PM-9:15PM"],
            vec!["Whole day"],
            vec![],
        ]
    );
    assert_eq!(result[1].day, days[1]);
}

#[test_log::test]
fn partial_window_has_no_whole_day_label() {
    let windows = [AvailabilityWindow {
        from: utc(2025, 1, 1, 9, 0),
        to: utc(2025, 1, 1, 17, 0),
    }];
    let result = summarize_availability(
        &windows,
        &[CalendarDay {
            year: 2025,
            month: 1,
            day: 1,
        }],
    )
    .unwrap();
    assert_eq!(result[0].labels, vec!["9:00AM-5:00PM".to_string()]);
}
