//! Explicit edit commands over a shift. Each application yields a new
//! [`ShiftInstance`]; the input is never modified.

use chrono::{DateTime, Utc};
use rota_core::types::{PartyId, RecordId};
use serde::{Deserialize, Serialize};

use super::model::{ClientAssignment, Location, ShiftInstance, StaffAssignment, Task, TimeWindow};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShiftEdit {
    SetTimeWindow {
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    },
    SetClassification {
        classification: String,
    },
    SetLocation {
        location: Location,
    },
    AddClient {
        client: PartyId,
    },
    SetClient {
        index: usize,
        client: PartyId,
    },
    SetPriceBook {
        index: usize,
        price_book: Option<RecordId>,
    },
    SetFund {
        index: usize,
        fund: Option<RecordId>,
    },
    SetClientWindow {
        index: usize,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    },
    RemoveClientAt {
        index: usize,
    },
    AddStaff {
        staff: PartyId,
    },
    SetStaff {
        index: usize,
        staff: PartyId,
    },
    SetPaymentMethod {
        index: usize,
        payment_method: Option<String>,
    },
    SetStaffWindow {
        index: usize,
        time_from: DateTime<Utc>,
        time_to: DateTime<Utc>,
    },
    RemoveStaffAt {
        index: usize,
    },
    AddTask {
        name: String,
        is_mandatory: bool,
    },
    RenameTask {
        index: usize,
        name: String,
    },
    SetTaskMandatory {
        index: usize,
        is_mandatory: bool,
    },
    SetTaskCompleted {
        index: usize,
        is_completed: bool,
    },
    RemoveTaskAt {
        index: usize,
    },
}

fn entry_mut<'a, T>(entries: &'a mut [T], index: usize, kind: &str) -> ServiceResult<&'a mut T> {
    let len = entries.len();
    entries.get_mut(index).ok_or_else(|| {
        ServiceError::ValidationError(format!("{kind} index {index} out of range ({len} present)"))
    })
}

fn remove_at<T>(entries: &mut Vec<T>, index: usize, kind: &str) -> ServiceResult<()> {
    if index >= entries.len() {
        return Err(ServiceError::ValidationError(format!(
            "{kind} index {index} out of range ({} present)",
            entries.len()
        )));
    }
    entries.remove(index);
    Ok(())
}

/// ## Summary
/// Applies one edit to `shift`, returning the edited copy.
///
/// New client and staff assignments inherit the shift's window.
///
/// ## Errors
/// Returns `ServiceError::ValidationError` for an out-of-range index or an
/// inverted time window.
pub fn apply(shift: &ShiftInstance, edit: ShiftEdit) -> ServiceResult<ShiftInstance> {
    let mut next = shift.clone();
    let window = next.details.window;

    match edit {
        ShiftEdit::SetTimeWindow { time_from, time_to } => {
            next.details.window = TimeWindow::new(time_from, time_to)?;
        }
        ShiftEdit::SetClassification { classification } => {
            next.details.classification = classification;
        }
        ShiftEdit::SetLocation { location } => next.details.location = location,
        ShiftEdit::AddClient { client } => {
            next.client_assignments.push(ClientAssignment::new(client, window));
        }
        ShiftEdit::SetClient { index, client } => {
            entry_mut(&mut next.client_assignments, index, "client")?.client = client;
        }
        ShiftEdit::SetPriceBook { index, price_book } => {
            entry_mut(&mut next.client_assignments, index, "client")?.price_book = price_book;
        }
        ShiftEdit::SetFund { index, fund } => {
            entry_mut(&mut next.client_assignments, index, "client")?.fund = fund;
        }
        ShiftEdit::SetClientWindow {
            index,
            time_from,
            time_to,
        } => {
            entry_mut(&mut next.client_assignments, index, "client")?.window =
                TimeWindow::new(time_from, time_to)?;
        }
        ShiftEdit::RemoveClientAt { index } => {
            remove_at(&mut next.client_assignments, index, "client")?;
        }
        ShiftEdit::AddStaff { staff } => {
            next.staff_assignments.push(StaffAssignment::new(staff, window));
        }
        ShiftEdit::SetStaff { index, staff } => {
            entry_mut(&mut next.staff_assignments, index, "staff")?.staff = staff;
        }
        ShiftEdit::SetPaymentMethod {
            index,
            payment_method,
        } => {
            entry_mut(&mut next.staff_assignments, index, "staff")?.payment_method =
                payment_method;
        }
        ShiftEdit::SetStaffWindow {
            index,
            time_from,
            time_to,
        } => {
            entry_mut(&mut next.staff_assignments, index, "staff")?.window =
                TimeWindow::new(time_from, time_to)?;
        }
        ShiftEdit::RemoveStaffAt { index } => {
            remove_at(&mut next.staff_assignments, index, "staff")?;
        }
        ShiftEdit::AddTask { name, is_mandatory } => {
            next.tasks.push(Task::new(name, is_mandatory));
        }
        ShiftEdit::RenameTask { index, name } => {
            entry_mut(&mut next.tasks, index, "task")?.name = name;
        }
        ShiftEdit::SetTaskMandatory {
            index,
            is_mandatory,
        } => {
            entry_mut(&mut next.tasks, index, "task")?.is_mandatory = is_mandatory;
        }
        ShiftEdit::SetTaskCompleted {
            index,
            is_completed,
        } => {
            entry_mut(&mut next.tasks, index, "task")?.is_completed = is_completed;
        }
        ShiftEdit::RemoveTaskAt { index } => remove_at(&mut next.tasks, index, "task")?,
    }

    Ok(next)
}

/// ## Summary
/// Applies `edits` in order. Either every edit applies or none does.
///
/// ## Errors
/// Returns the first edit's error; `shift` is left as it was.
pub fn apply_all(
    shift: &ShiftInstance,
    edits: impl IntoIterator<Item = ShiftEdit>,
) -> ServiceResult<ShiftInstance> {
    edits
        .into_iter()
        .try_fold(shift.clone(), |current, edit| apply(&current, edit))
}
