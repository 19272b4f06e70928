/// One recurrence expansion case: canonical text and the expected UTC starts.
pub struct RuleCase {
    pub name: &'static str,
    pub text: &'static str,
    pub expected: &'static [&'static str],
}

pub fn rule_cases() -> Vec<RuleCase> {
    vec![
        RuleCase {
            name: "daily inclusive until",
            text: "DTSTART:20250101T090000Z\nRRULE:FREQ=DAILY;UNTIL=20250103T235959Z",
            expected: &[
                "2025-01-01T09:00:00Z",
                "2025-01-02T09:00:00Z",
                "2025-01-03T09:00:00Z",
            ],
        },
        RuleCase {
            name: "daily every 15 days",
            text: "DTSTART:20250101T090000Z\nRRULE:FREQ=DAILY;INTERVAL=15;UNTIL=20250131T235959Z",
            expected: &[
                "2025-01-01T09:00:00Z",
                "2025-01-16T09:00:00Z",
                "2025-01-31T09:00:00Z",
            ],
        },
        RuleCase {
            name: "weekly default span",
            text: "DTSTART:20250106T090000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO;UNTIL=20250113T235959Z",
            expected: &["2025-01-06T09:00:00Z", "2025-01-13T09:00:00Z"],
        },
        RuleCase {
            name: "fortnightly weekdays",
            text: "DTSTART:20250106T090000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,FR;UNTIL=20250124T235959Z",
            expected: &[
                "2025-01-06T09:00:00Z",
                "2025-01-10T09:00:00Z",
                "2025-01-20T09:00:00Z",
                "2025-01-24T09:00:00Z",
            ],
        },
        RuleCase {
            name: "monthly day 31 skips short months",
            text: "DTSTART:20250131T090000Z\nRRULE:FREQ=MONTHLY;BYMONTHDAY=31;UNTIL=20250630T235959Z",
            expected: &[
                "2025-01-31T09:00:00Z",
                "2025-03-31T09:00:00Z",
                "2025-05-31T09:00:00Z",
            ],
        },
        RuleCase {
            name: "quarterly",
            text: "DTSTART:20250115T090000Z\nRRULE:FREQ=MONTHLY;INTERVAL=3;BYMONTHDAY=15;UNTIL=20251231T235959Z",
            expected: &[
                "2025-01-15T09:00:00Z",
                "2025-04-15T09:00:00Z",
                "2025-07-15T09:00:00Z",
                "2025-10-15T09:00:00Z",
            ],
        },
        RuleCase {
            name: "zoned weekly across DST start",
            // New York springs forward on 2025-03-09
            text: "DTSTART;TZID=America/New_York:20250303T080000\nRRULE:FREQ=WEEKLY;BYDAY=MO;UNTIL=20250317T235959Z",
            expected: &[
                "2025-03-03T13:00:00Z",
                "2025-03-10T12:00:00Z",
                "2025-03-17T12:00:00Z",
            ],
        },
        RuleCase {
            name: "until before start",
            text: "DTSTART:20250110T090000Z\nRRULE:FREQ=DAILY;UNTIL=20250105T235959Z",
            expected: &[],
        },
    ]
}

pub fn assert_case(case: &RuleCase) {
    let rule = rota_test::rfc::rfc::recur::decode(case.text)
        .unwrap_or_else(|err| panic!("{}: decode failed: {err}", case.name));
    assert_eq!(
        rota_test::rfc::rfc::recur::encode(&rule),
        case.text,
        "{}: not canonical",
        case.name
    );

    let actual: Vec<String> = rota_test::rfc::rfc::recur::occurrences(&rule)
        .unwrap_or_else(|err| panic!("{}: expansion failed: {err}", case.name))
        .iter()
        .map(|at| at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .collect();
    assert_eq!(actual, case.expected, "{}", case.name);
}
