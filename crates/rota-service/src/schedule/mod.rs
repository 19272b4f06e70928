//! Shift state, nested-collection reconciliation and mutation planning.

pub mod command;
pub mod diff;
pub mod edit;
pub mod model;
pub mod scope;
pub mod submit;

pub use command::{
    BulkDeleteShiftCommand, BulkUpdateShiftCommand, DeletePlan, DeleteShiftCommand,
    DetailChanges, EditPlan, ShiftUpdate, UpdateShiftCommand, build_update, plan_delete,
    plan_edit,
};
pub use diff::{Reconcile, SchedulePatch, diff};
pub use edit::{ShiftEdit, apply, apply_all};
pub use model::{
    ClientAssignment, Location, SeriesRef, ShiftDetails, ShiftInstance, ShiftOccurrenceSeries,
    StaffAssignment, Task, TimeWindow,
};
pub use scope::{MutationKind, MutationScope, ResolvedScope, resolve};
pub use submit::{MutationEvent, MutationTarget, ShiftGateway, ShiftSubmitter};
