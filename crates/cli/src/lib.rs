//! Lendbook CLI - scenario runner and loan quotes
//!
//! This crate provides the `lendbook` binary and the command functions
//! behind it.

pub mod commands;
pub mod config;
pub mod scenario;

pub use config::{CliConfig, ConfigError};
pub use scenario::{Scenario, ScenarioError, ScenarioReport, Step, StepOutcome};
