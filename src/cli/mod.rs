//! Command-line interface for ci-benchmarker.
//!
//! Provides the `run` command that launches a benchmark and the `history`
//! command that lists stored job records.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, LogFilter};
