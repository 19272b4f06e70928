pub mod availability;
pub mod error;
pub mod recurrence;
pub mod schedule;
