//! Repeat settings of a shift being edited.

mod editor;

pub use editor::{RecurrenceEditor, RepeatDefaults, RepeatState, RuleEdit};
