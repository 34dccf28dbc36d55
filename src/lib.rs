//! studylog - Study Progress Tracking Library
//!
//! This library provides the core functionality for the studylog CLI tool:
//! date-keyed metric stores, a catalog of custom tasks, and derived
//! statistics.
//!
//! # Core Concepts
//!
//! - **Entries**: at most one record per calendar date per store
//! - **Upsert**: logging a date that already has an entry replaces it
//! - **Tasks**: user-defined metrics with a unit and a target
//! - **Streaks**: runs of consecutive qualifying days
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `studylog.toml`
//! - `error`: Error types and result aliases
//! - `storage`: Document backends and data directory resolution
//! - `entry`: Entry shape and per-store field sets
//! - `store`: Date-keyed metric stores
//! - `catalog`: Custom task definitions
//! - `stats`: Totals, averages, percentages and streaks
//! - `export`: CSV export
//! - `output`: Human and JSON output

pub mod catalog;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod export;
pub mod output;
pub mod stats;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
