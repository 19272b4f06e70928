//! Per-day labels for staff availability windows.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Timelike, Utc};
use indexmap::IndexSet;
use rota_core::constants::WHOLE_DAY_LABEL;
use rota_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;

/// A raw availability window with absolute bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDay {
    /// ## Errors
    /// Returns `CoreError::InvalidInput` for a date that does not exist.
    pub fn date(&self) -> ServiceResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "{}-{:02}-{:02} is not a calendar day",
                self.year, self.month, self.day
            ))
            .into()
        })
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub day: CalendarDay,
    pub labels: Vec<String>,
}

fn label(window: &AvailabilityWindow, day_end: DateTime<Utc>) -> String {
    let starts_at_midnight = window.from.hour() == 0 && window.from.minute() == 0;
    let runs_to_end = window.to.hour() >= 23 || window.to >= day_end;
    if starts_at_midnight && runs_to_end {
        return WHOLE_DAY_LABEL.to_owned();
    }
    format!(
        "{}-{}",
        window.from.format("%-I:%M%p"),
        window.to.format("%-I:%M%p")
    )
}

/// ## Summary
/// Labels the availability on each requested day, in request order.
///
/// A window counts for a day only if it lies entirely within that UTC day;
/// windows crossing midnight are attributed to neither side. Labels repeat
/// at most once per day and keep first-seen order.
///
/// ## Errors
/// Returns `CoreError::InvalidInput` (wrapped) for an impossible calendar day.
pub fn summarize_availability(
    windows: &[AvailabilityWindow],
    days: &[CalendarDay],
) -> ServiceResult<Vec<DayAvailability>> {
    days.iter()
        .map(|day| {
            let date = day.date()?;
            let day_start = date.and_time(NaiveTime::MIN).and_utc();
            let day_end = day_start + TimeDelta::days(1) - TimeDelta::milliseconds(1);

            let labels: IndexSet<String> = windows
                .iter()
                .filter(|window| window.from >= day_start && window.to <= day_end)
                .map(|window| label(window, day_end))
                .collect();

            tracing::trace!(%date, labels = labels.len(), "Summarized availability");
            Ok(DayAvailability {
                day: *day,
                labels: labels.into_iter().collect(),
            })
        })
        .collect()
}
