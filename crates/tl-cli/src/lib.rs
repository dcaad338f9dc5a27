//! Timeline CLI library.
//!
//! This crate provides the CLI interface for timeline reconstruction: config
//! loading, export-backed bucket queries, and shell history lookups.

mod cli;
pub mod commands;
mod config;
pub mod export;
pub mod history;

pub use cli::{AfkArgs, BoundsArgs, Cli, Commands, RangeArgs, SourceArgs, TimelineArgs};
pub use config::{AppSource, Config, HistoryConfig};
