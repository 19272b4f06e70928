use std::path::Path;

use chrono::{DateTime, Utc};
use rota_rfc::error::RfcError;
use rota_rfc::rfc::recur::{self, RecurrenceRule};
use rota_service::availability::{AvailabilityWindow, CalendarDay, summarize_availability};
use rota_service::recurrence::{RecurrenceEditor, RuleEdit};
use rota_service::schedule::{
    ShiftEdit, ShiftGateway, ShiftInstance, ShiftOccurrenceSeries, ShiftSubmitter, apply_all,
    build_update, plan_delete, plan_edit,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{Cli, Command, RuleCommand};
use crate::config::{Settings, repeat_defaults};
use crate::error::{AppError, AppResult};

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_series(path: Option<&Path>) -> AppResult<Option<ShiftOccurrenceSeries>> {
    path.map(read_json).transpose()
}

fn submitter<G: ShiftGateway>(gateway: G) -> ShiftSubmitter<G> {
    let mut submitter = ShiftSubmitter::new(gateway);
    submitter.on_mutation(|event| tracing::info!(?event, "Mutation confirmed"));
    submitter
}

/// ## Summary
/// Executes `cli` and returns the JSON document to print.
///
/// Submitted plans go through `gateway`; nothing is submitted without
/// `--submit`.
///
/// ## Errors
/// Returns an error if an input file cannot be read or parsed, or if the
/// requested operation is rejected.
pub async fn run<G: ShiftGateway>(cli: Cli, settings: &Settings, gateway: G) -> AppResult<Value> {
    match cli.command {
        Command::Rule { command } => run_rule(command, settings),
        Command::Diff { current, edited } => {
            let current: ShiftInstance = read_json(&current)?;
            let edited: ShiftInstance = read_json(&edited)?;
            Ok(serde_json::to_value(build_update(&current, &edited)?)?)
        }
        Command::Availability { windows, days } => {
            let windows: Vec<AvailabilityWindow> = read_json(&windows)?;
            let days: Vec<CalendarDay> = days.into_iter().map(CalendarDay::from).collect();
            Ok(serde_json::to_value(summarize_availability(&windows, &days)?)?)
        }
        Command::PlanEdit {
            current,
            edited,
            edits,
            series,
            scope,
            submit,
        } => {
            let current: ShiftInstance = read_json(&current)?;
            let edited: ShiftInstance = match (edited, edits) {
                (Some(path), _) => read_json(&path)?,
                (None, Some(path)) => {
                    let edits: Vec<ShiftEdit> = read_json(&path)?;
                    apply_all(&current, edits)?
                }
                (None, None) => {
                    return Err(AppError::InvalidArgument(
                        "plan-edit needs --edited or --edits".into(),
                    ));
                }
            };
            let series = read_series(series.as_deref())?;

            let plan = plan_edit(
                &current,
                &edited,
                scope.to_scope()?,
                series.as_ref(),
                scope.now(),
            )?;
            if !submit {
                return Ok(json!({ "plan": plan }));
            }
            let event = submitter(gateway).submit_edit(&plan).await?;
            Ok(json!({ "plan": plan, "event": event }))
        }
        Command::PlanDelete {
            occurrence,
            series,
            scope,
            submit,
        } => {
            let occurrence: ShiftInstance = read_json(&occurrence)?;
            let series = read_series(series.as_deref())?;

            let plan = plan_delete(&occurrence, scope.to_scope()?, series.as_ref(), scope.now())?;
            if !submit {
                return Ok(json!({ "plan": plan }));
            }
            let event = submitter(gateway).submit_delete(&plan).await?;
            Ok(json!({ "plan": plan, "event": event }))
        }
    }
}

fn run_rule(command: RuleCommand, settings: &Settings) -> AppResult<Value> {
    match command {
        RuleCommand::Summarize { text } => {
            let rule = recur::decode(&text)?;
            let summary = recur::summarize(&rule)?;
            Ok(json!({
                "rule": recur::encode(&rule),
                "summary": summary.to_string(),
                "occurrenceCount": summary.occurrence_count,
            }))
        }
        RuleCommand::Occurrences { text, from, to } => {
            let rule = recur::decode(&text)?;
            Ok(serde_json::to_value(occurrences(&rule, from, to)?)?)
        }
        RuleCommand::Edit { rule, start, edits } => {
            let rule = rule.as_deref().map(recur::decode).transpose()?;
            let edits = edits
                .iter()
                .map(|edit| {
                    serde_json::from_str::<RuleEdit>(edit).map_err(|err| {
                        AppError::InvalidArgument(format!("bad --set '{edit}': {err}"))
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;

            let mut editor = RecurrenceEditor::from_rule(repeat_defaults(settings)?, rule);
            match (editor.is_enabled(), start) {
                (true, Some(start)) => editor.shift_start_changed(start),
                (true, None) => {}
                (false, Some(start)) => {
                    editor.enable(start)?;
                }
                (false, None) => {
                    return Err(AppError::InvalidArgument(
                        "rule edit needs --rule or --start".into(),
                    ));
                }
            }
            for edit in edits {
                editor.set_field(edit)?;
            }

            let Some(rule) = editor.submit()? else {
                return Err(AppError::InvalidArgument("repeat is disabled".into()));
            };
            Ok(json!({
                "rule": recur::encode(&rule),
                "summary": recur::summarize(&rule)?.to_string(),
            }))
        }
    }
}

fn occurrences(
    rule: &RecurrenceRule,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> AppResult<Vec<DateTime<Utc>>> {
    let to = to.or(rule.until()).ok_or(RfcError::UnboundedRule)?;
    let from = from.unwrap_or_else(|| rule.start_utc());
    Ok(recur::occurrences_between(rule, from, to)?)
}
