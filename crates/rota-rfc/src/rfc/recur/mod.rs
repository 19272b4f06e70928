//! Shift recurrence rules: model, canonical text codec, expansion and summaries.

mod codec;
mod expand;
mod rule;
mod summary;

pub use codec::{decode, encode};
pub use expand::{MAX_EXPANDED_OCCURRENCES, occurrence_count, occurrences, occurrences_between};
pub use rule::{Frequency, RecurrenceRule, Weekday};
pub use summary::{RuleSummary, summarize};
