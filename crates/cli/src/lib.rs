//! # NHMS CLI
//!
//! Command-line front end for the NHMS patient registry.
//!
//! Flags are parsed and validated into an [`Action`] before anything touches credentials or
//! the network. [`dispatch`] then connects, runs the action and decides how failures surface.

pub mod args;
pub mod dispatch;

pub use args::{normalise_flags, parse_action, Action, Cli, UsageError};
pub use dispatch::{dispatch, report_usage, run, ErrorReport, EXIT_FAILURE, EXIT_SUCCESS};
