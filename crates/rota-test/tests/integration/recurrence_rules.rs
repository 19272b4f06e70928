use chrono::{NaiveDate, TimeZone, Utc};
use rota_test::rfc::error::RfcError;
use rota_test::rfc::rfc::recur::{
    Frequency, RecurrenceRule, Weekday, decode, encode, occurrences, summarize,
};
use rota_test::service::recurrence::{RecurrenceEditor, RepeatDefaults, RuleEdit};

include!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/rule_cases_data/mod.rs"));

#[test_log::test]
fn rule_cases_expand_as_expected() {
    for case in rule_cases() {
        assert_case(&case);
    }
}

/// ## Summary
/// Canonical text is read identically by the `rrule` crate itself.
#[test_log::test]
fn canonical_text_decodes_with_rrule_crate() {
    for case in rule_cases().iter().filter(|case| !case.expected.is_empty()) {
        let set: rrule::RRuleSet = case
            .text
            .parse()
            .unwrap_or_else(|err| panic!("{}: rrule rejected text: {err}", case.name));
        let theirs: Vec<_> = set
            .all(u16::MAX)
            .dates
            .iter()
            .map(|at| at.with_timezone(&Utc))
            .collect();

        let ours = occurrences(&decode(case.text).unwrap()).unwrap();
        assert_eq!(ours, theirs, "{}", case.name);
    }
}

/// Rules reachable through the editing operations.
fn model_rules() -> Vec<RecurrenceRule> {
    let sydney = chrono_tz::Australia::Sydney
        .with_ymd_and_hms(2025, 2, 28, 18, 30, 0)
        .unwrap();
    let utc = chrono_tz::UTC.with_ymd_and_hms(2025, 1, 31, 7, 0, 0).unwrap();
    let until = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();

    let mut rules = Vec::new();
    for start in [sydney, utc] {
        for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly] {
            let base = RecurrenceRule::new(frequency, start);
            rules.push(base.clone());
            rules.push(base.with_until(until).unwrap());
            rules.push(
                base.with_interval(frequency.max_interval())
                    .unwrap()
                    .with_until(until)
                    .unwrap(),
            );
        }
        let weekly = RecurrenceRule::new(Frequency::Weekly, start);
        rules.push(
            weekly
                .toggle_weekday(Weekday::Sunday)
                .unwrap()
                .toggle_weekday(Weekday::Wednesday)
                .unwrap(),
        );
        // Empty weekday set is a valid model state
        rules.push(weekly.toggle_weekday(weekly.by_weekday().iter().next().copied().unwrap()).unwrap());
        rules.push(
            RecurrenceRule::new(Frequency::Monthly, start)
                .with_month_day(31)
                .unwrap(),
        );
        rules.push(
            weekly
                .with_frequency_and_interval(Frequency::Daily, 7)
                .unwrap()
                .with_start(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        );
    }

    // 16:30Z is the second 02:30 in Sydney on 2025-04-06 (DST ends)
    let repeated_hour = Utc.with_ymd_and_hms(2025, 4, 5, 16, 30, 0).unwrap();
    let sydney_daily = RecurrenceRule::new(Frequency::Daily, sydney);
    rules.push(sydney_daily.with_start(repeated_hour));
    rules.push(RecurrenceRule::new(
        Frequency::Weekly,
        repeated_hour.with_timezone(&chrono_tz::Australia::Sydney),
    ));
    rules
}

#[test_log::test]
fn every_model_rule_round_trips() {
    for rule in model_rules() {
        let text = encode(&rule);
        let decoded = decode(&text).unwrap_or_else(|err| panic!("{text}: {err}"));
        assert_eq!(decoded, rule, "{text}");
        assert_eq!(decoded.timezone(), rule.timezone());
        assert_eq!(encode(&decoded), text);
    }
}

#[test_log::test]
fn interval_caps() {
    let daily = RecurrenceRule::new(
        Frequency::Daily,
        chrono_tz::UTC.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
    );
    assert!(matches!(
        daily.with_interval(16),
        Err(RfcError::InvalidInterval { .. })
    ));
    assert_eq!(daily.with_interval(15).unwrap().interval(), 15);
    assert!(matches!(
        decode("DTSTART:20250101T090000Z\nRRULE:FREQ=MONTHLY;INTERVAL=4"),
        Err(RfcError::InvalidInterval { .. })
    ));
}

#[test_log::test]
fn editor_cache_restores_configured_rule() {
    let defaults = RepeatDefaults {
        timezone: chrono_tz::Europe::London,
        span: chrono::Days::new(21),
    };
    let mut editor = RecurrenceEditor::new(defaults);
    editor
        .enable(Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap())
        .unwrap();
    editor
        .set_field(RuleEdit::FrequencyWithInterval {
            frequency: Frequency::Weekly,
            interval: 2,
        })
        .unwrap();
    let configured = encode(editor.rule().unwrap());

    editor.disable();
    let restored = editor
        .enable(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap())
        .unwrap();
    assert_eq!(encode(restored), configured);
    assert_eq!(
        configured,
        "DTSTART;TZID=Europe/London:20250701T090000\n\
         RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=TU;UNTIL=20250722T225959Z"
    );

    let summary = summarize(restored).unwrap();
    assert_eq!(summary.occurrence_count, Some(2));
}
