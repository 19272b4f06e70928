//! Shared configuration, error and identifier types for the rota workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
