//! Command-line surface of the `rota` binary.

mod run;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rota_service::schedule::MutationScope;

use crate::error::{AppError, AppResult};

pub use run::run;

#[derive(Parser, Debug)]
#[command(name = "rota")]
#[command(about = "Recurring shift scheduling toolkit", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or build recurrence rules
    Rule {
        #[command(subcommand)]
        command: RuleCommand,
    },

    /// Compute the update turning a current shift into an edited one
    Diff {
        /// Current shift state (JSON)
        #[arg(long)]
        current: PathBuf,

        /// Edited shift state (JSON)
        #[arg(long)]
        edited: PathBuf,
    },

    /// Label availability windows per calendar day
    Availability {
        /// Availability windows (JSON array of {from, to})
        #[arg(long)]
        windows: PathBuf,

        /// Calendar day to label, repeatable (YYYY-MM-DD)
        #[arg(long = "day", required = true)]
        days: Vec<NaiveDate>,
    },

    /// Plan (and optionally submit) an edit of a shift
    PlanEdit {
        /// Current shift state (JSON)
        #[arg(long)]
        current: PathBuf,

        /// Edited shift state (JSON)
        #[arg(long, required_unless_present = "edits", conflicts_with = "edits")]
        edited: Option<PathBuf>,

        /// Edit commands to apply to the current state (JSON array)
        #[arg(long)]
        edits: Option<PathBuf>,

        /// Series the shift belongs to, with its known instances (JSON)
        #[arg(long)]
        series: Option<PathBuf>,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Send the planned command through the gateway
        #[arg(long)]
        submit: bool,
    },

    /// Plan (and optionally submit) a deletion
    PlanDelete {
        /// Occurrence being deleted (JSON)
        #[arg(long)]
        occurrence: PathBuf,

        /// Series the occurrence belongs to, with its known instances (JSON)
        #[arg(long)]
        series: Option<PathBuf>,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Send the planned command through the gateway
        #[arg(long)]
        submit: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RuleCommand {
    /// Describe a rule and count its occurrences
    Summarize {
        /// Rule text (DTSTART and RRULE lines)
        text: String,
    },

    /// List occurrence start instants
    Occurrences {
        /// Rule text (DTSTART and RRULE lines)
        text: String,

        /// Earliest start to list (default: the rule's start)
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Latest start to list (default: the rule's until)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },

    /// Build a rule through the repeat editor and print its canonical text
    Edit {
        /// Existing rule text; omitted to start from the configured default
        #[arg(long)]
        rule: Option<String>,

        /// Shift start; required without --rule, moves the rule's start with it
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Field edit as JSON, e.g. '{"field":"interval","value":2}', repeatable
        #[arg(long = "set")]
        edits: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    This,
    Future,
    Range,
    All,
}

#[derive(Args, Debug)]
pub struct ScopeArgs {
    /// How far into the series the mutation reaches
    #[arg(long, value_enum, default_value = "this")]
    pub scope: ScopeKind,

    /// Range start (--scope range)
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,

    /// Range end (--scope range, optional for --scope future)
    #[arg(long)]
    pub to: Option<DateTime<Utc>>,

    /// Evaluation instant (default: current time)
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

impl ScopeArgs {
    /// ## Errors
    /// Returns `AppError::InvalidArgument` if a range scope lacks a bound.
    pub fn to_scope(&self) -> AppResult<MutationScope> {
        let missing = |flag: &str| AppError::InvalidArgument(format!("--scope range needs {flag}"));
        Ok(match self.scope {
            ScopeKind::This => MutationScope::ThisOccurrenceOnly,
            ScopeKind::Future => MutationScope::FutureOccurrences { to: self.to },
            ScopeKind::Range => MutationScope::ExplicitRange {
                start: self.from.ok_or_else(|| missing("--from"))?,
                end: self.to.ok_or_else(|| missing("--to"))?,
            },
            ScopeKind::All => MutationScope::AllOccurrences,
        })
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}
