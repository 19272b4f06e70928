use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rota_core::config::SchedulingConfig;
use rota_core::constants::DEFAULT_REPEAT_SPAN_DAYS;
use rota_rfc::rfc::recur::{Frequency, RecurrenceRule, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Settings used to synthesize a rule the first time repeat is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatDefaults {
    pub timezone: Tz,
    pub span: chrono::Days,
}

impl RepeatDefaults {
    /// ## Errors
    /// Returns the wrapped `CoreError::ConfigError` for an unknown timezone or
    /// an out-of-range span.
    pub fn from_config(config: &SchedulingConfig) -> ServiceResult<Self> {
        Ok(Self {
            timezone: config.timezone()?,
            span: config.repeat_span()?,
        })
    }
}

impl Default for RepeatDefaults {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            span: chrono::Days::new(u64::from(DEFAULT_REPEAT_SPAN_DAYS)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatState {
    /// Repeat is off. A previously configured rule is kept for re-enabling.
    Disabled { cached: Option<RecurrenceRule> },
    Enabled(RecurrenceRule),
}

/// A single change to the enabled rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum RuleEdit {
    Frequency(Frequency),
    FrequencyWithInterval { frequency: Frequency, interval: u32 },
    Interval(u32),
    ToggleWeekday(Weekday),
    MonthDay(u8),
    Until(NaiveDate),
}

impl RuleEdit {
    fn apply(self, rule: &RecurrenceRule) -> ServiceResult<RecurrenceRule> {
        let next = match self {
            Self::Frequency(frequency) => rule.with_frequency(frequency),
            Self::FrequencyWithInterval {
                frequency,
                interval,
            } => rule.with_frequency_and_interval(frequency, interval)?,
            Self::Interval(interval) => rule.with_interval(interval)?,
            Self::ToggleWeekday(day) => rule.toggle_weekday(day)?,
            Self::MonthDay(day) => rule.with_month_day(day)?,
            Self::Until(date) => rule.with_until(date)?,
        };
        Ok(next)
    }
}

/// State machine behind a shift's repeat toggle and rule fields.
#[derive(Debug, Clone)]
pub struct RecurrenceEditor {
    defaults: RepeatDefaults,
    state: RepeatState,
}

impl RecurrenceEditor {
    #[must_use]
    pub fn new(defaults: RepeatDefaults) -> Self {
        Self {
            defaults,
            state: RepeatState::Disabled { cached: None },
        }
    }

    /// Editor for a shift that may already belong to a series.
    #[must_use]
    pub fn from_rule(defaults: RepeatDefaults, rule: Option<RecurrenceRule>) -> Self {
        Self {
            defaults,
            state: rule.map_or(RepeatState::Disabled { cached: None }, RepeatState::Enabled),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &RepeatState {
        &self.state
    }

    /// The enabled rule, if any.
    #[must_use]
    pub const fn rule(&self) -> Option<&RecurrenceRule> {
        match &self.state {
            RepeatState::Enabled(rule) => Some(rule),
            RepeatState::Disabled { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self.state, RepeatState::Enabled(_))
    }

    fn enabled_rule(&self) -> ServiceResult<&RecurrenceRule> {
        self.rule().ok_or(ServiceError::RecurrenceDisabled)
    }

    fn default_rule(&self, start: DateTime<Utc>) -> ServiceResult<RecurrenceRule> {
        let local_start = start.with_timezone(&self.defaults.timezone);
        let until = local_start
            .date_naive()
            .checked_add_days(self.defaults.span)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("repeat span overflows from {start}"))
            })?;
        RecurrenceRule::new(Frequency::Weekly, local_start)
            .with_until(until)
            .map_err(ServiceError::from)
    }

    /// ## Summary
    /// Turns repeat on. Restores the rule cached by [`Self::disable`], or
    /// creates a weekly rule on `default_start`'s weekday that runs until the
    /// end of the day one repeat span later. No-op when already enabled.
    ///
    /// ## Errors
    /// Returns an error only if the default rule cannot be built.
    pub fn enable(&mut self, default_start: DateTime<Utc>) -> ServiceResult<&RecurrenceRule> {
        let rule = match &self.state {
            RepeatState::Enabled(_) => None,
            RepeatState::Disabled {
                cached: Some(cached),
            } => {
                tracing::debug!(rule = %cached, "Restoring cached recurrence rule");
                Some(cached.clone())
            }
            RepeatState::Disabled { cached: None } => {
                let rule = self.default_rule(default_start)?;
                tracing::debug!(rule = %rule, "Created default recurrence rule");
                Some(rule)
            }
        };
        if let Some(rule) = rule {
            self.state = RepeatState::Enabled(rule);
        }
        self.enabled_rule()
    }

    /// Turns repeat off, keeping the rule so [`Self::enable`] can restore it.
    pub fn disable(&mut self) {
        if let RepeatState::Enabled(rule) = &self.state {
            let cached = Some(rule.clone());
            self.state = RepeatState::Disabled { cached };
        }
    }

    /// ## Summary
    /// Applies `edit` to the enabled rule.
    ///
    /// ## Errors
    /// - `ServiceError::RecurrenceDisabled` if repeat is off
    /// - `ServiceError::RfcError` if the edit is invalid; the rule is unchanged
    pub fn set_field(&mut self, edit: RuleEdit) -> ServiceResult<&RecurrenceRule> {
        let RepeatState::Enabled(rule) = &mut self.state else {
            return Err(ServiceError::RecurrenceDisabled);
        };
        *rule = edit.apply(rule)?;
        tracing::trace!(?edit, rule = %rule, "Applied rule edit");
        Ok(&*rule)
    }

    /// Follows a change to the shift's own start. The cached rule of a
    /// disabled editor follows too.
    pub fn shift_start_changed(&mut self, start: DateTime<Utc>) {
        match &mut self.state {
            RepeatState::Enabled(rule)
            | RepeatState::Disabled {
                cached: Some(rule),
            } => *rule = rule.with_start(start),
            RepeatState::Disabled { cached: None } => {}
        }
    }

    /// ## Summary
    /// The rule to persist, or `None` when repeat is off.
    ///
    /// ## Errors
    /// Returns `ServiceError::RfcError` if the rule is incomplete, e.g. weekly
    /// with no weekdays.
    pub fn submit(&self) -> ServiceResult<Option<RecurrenceRule>> {
        self.rule()
            .map(|rule| {
                rule.validate_for_submission()?;
                Ok(rule.clone())
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rota_rfc::error::RfcError;

    fn monday_9am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
    }

    fn enabled() -> RecurrenceEditor {
        let mut editor = RecurrenceEditor::new(RepeatDefaults::default());
        editor.enable(monday_9am()).unwrap();
        editor
    }

    #[test]
    fn default_rule_is_weekly_on_start_day_for_a_week() {
        let editor = enabled();
        let rule = editor.rule().unwrap();

        assert_eq!(rule.frequency(), Frequency::Weekly);
        assert_eq!(rule.interval(), 1);
        assert!(rule.by_weekday().contains(&Weekday::Monday));
        assert_eq!(rule.by_weekday().len(), 1);
        assert_eq!(
            rule.until(),
            Some(Utc.with_ymd_and_hms(2025, 1, 13, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn default_rule_uses_configured_zone_and_span() {
        let defaults = RepeatDefaults {
            timezone: chrono_tz::Australia::Sydney,
            span: chrono::Days::new(14),
        };
        let mut editor = RecurrenceEditor::new(defaults);
        // 22:00Z Sunday is 09:00 Monday in Sydney
        let rule = editor
            .enable(Utc.with_ymd_and_hms(2025, 1, 5, 22, 0, 0).unwrap())
            .unwrap();

        assert_eq!(rule.timezone(), chrono_tz::Australia::Sydney);
        assert!(rule.by_weekday().contains(&Weekday::Monday));
        // End of Jan 20 in Sydney (UTC+11)
        assert_eq!(
            rule.until(),
            Some(Utc.with_ymd_and_hms(2025, 1, 20, 12, 59, 59).unwrap())
        );
    }

    #[test]
    fn enable_after_disable_restores_configured_rule() {
        let mut editor = enabled();
        editor.set_field(RuleEdit::Interval(3)).unwrap();
        editor
            .set_field(RuleEdit::ToggleWeekday(Weekday::Friday))
            .unwrap();
        let configured = editor.rule().cloned().unwrap();

        editor.disable();
        assert!(!editor.is_enabled());
        assert_eq!(
            editor.state(),
            &RepeatState::Disabled {
                cached: Some(configured.clone())
            }
        );

        let restored = editor
            .enable(Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap())
            .unwrap();
        assert_eq!(restored, &configured);
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let mut editor = enabled();
        let before = editor.rule().cloned();
        editor.enable(Utc::now()).unwrap();
        assert_eq!(editor.rule().cloned(), before);

        let mut disabled = RecurrenceEditor::new(RepeatDefaults::default());
        disabled.disable();
        assert_eq!(disabled.state(), &RepeatState::Disabled { cached: None });
    }

    #[test]
    fn disabled_editor_rejects_field_edits() {
        let mut editor = RecurrenceEditor::new(RepeatDefaults::default());
        assert!(matches!(
            editor.set_field(RuleEdit::Interval(2)),
            Err(ServiceError::RecurrenceDisabled)
        ));
    }

    #[test]
    fn rejected_edit_keeps_rule() {
        let mut editor = enabled();
        editor
            .set_field(RuleEdit::Frequency(Frequency::Daily))
            .unwrap();
        let before = editor.rule().cloned();

        assert!(matches!(
            editor.set_field(RuleEdit::Interval(16)),
            Err(ServiceError::RfcError(RfcError::InvalidInterval { .. }))
        ));
        assert_eq!(editor.rule().cloned(), before);
        assert_eq!(editor.set_field(RuleEdit::Interval(15)).unwrap().interval(), 15);
    }

    #[test]
    fn frequency_with_interval_and_month_day() {
        let mut editor = enabled();
        let rule = editor
            .set_field(RuleEdit::FrequencyWithInterval {
                frequency: Frequency::Monthly,
                interval: 2,
            })
            .unwrap();
        assert_eq!(rule.by_month_day(), Some(6));
        assert_eq!(rule.interval(), 2);

        let rule = editor.set_field(RuleEdit::MonthDay(31)).unwrap();
        assert_eq!(rule.by_month_day(), Some(31));

        let rule = editor
            .set_field(RuleEdit::Until(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()))
            .unwrap();
        assert_eq!(
            rule.until(),
            Some(Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn start_change_preserves_other_fields() {
        let mut editor = enabled();
        editor.set_field(RuleEdit::Interval(2)).unwrap();
        let before = editor.rule().cloned().unwrap();

        let new_start = Utc.with_ymd_and_hms(2025, 1, 7, 14, 30, 0).unwrap();
        editor.shift_start_changed(new_start);
        let after = editor.rule().unwrap();

        assert_eq!(after.start_utc(), new_start);
        assert_eq!(after.interval(), before.interval());
        assert_eq!(after.by_weekday(), before.by_weekday());
        assert_eq!(after.until(), before.until());

        editor.disable();
        editor.shift_start_changed(monday_9am());
        let RepeatState::Disabled {
            cached: Some(cached),
        } = editor.state()
        else {
            panic!("expected cached rule");
        };
        assert_eq!(cached.start_utc(), monday_9am());
    }

    #[test]
    fn submit_validates_weekdays() {
        assert_eq!(
            RecurrenceEditor::new(RepeatDefaults::default())
                .submit()
                .unwrap(),
            None
        );

        let mut editor = enabled();
        editor
            .set_field(RuleEdit::ToggleWeekday(Weekday::Monday))
            .unwrap();
        assert!(matches!(
            editor.submit(),
            Err(ServiceError::RfcError(RfcError::ValidationError(_)))
        ));

        editor
            .set_field(RuleEdit::ToggleWeekday(Weekday::Tuesday))
            .unwrap();
        assert!(editor.submit().unwrap().is_some());
    }

    #[test]
    fn rule_edit_deserializes() {
        let edit: RuleEdit =
            serde_json::from_str(r#"{"field":"toggleWeekday","value":"Friday"}"#).unwrap();
        assert_eq!(edit, RuleEdit::ToggleWeekday(Weekday::Friday));
    }
}
