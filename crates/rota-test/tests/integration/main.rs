//! Cross-crate integration tests.

mod availability;
mod edit_flow;
mod recurrence_rules;
mod series_scope;
