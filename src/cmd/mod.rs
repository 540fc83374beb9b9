//! Command modules - one file per CLI subcommand.

pub mod completions;
pub mod install;
pub mod query;
pub mod remove;
