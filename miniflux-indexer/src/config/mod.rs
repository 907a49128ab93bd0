//! Configuration module for the miniflux indexer.
//!
//! Handles command line parsing and dependency wiring.

mod cli;
mod dependencies;

pub use cli::{parse_duration, Cli, Command, LoaderCli, StartArgs};
pub use dependencies::Dependencies;
