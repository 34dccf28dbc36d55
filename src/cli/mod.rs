//! Command-line interface for studylog
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::catalog::TaskCatalog;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::storage::{self, FsBackend, SharedBackend};

mod checklist;
mod dashboard;
mod export;
mod immersion;
mod task;

/// studylog - study progress tracker
///
/// Logs daily immersion minutes, a shadowing/vocabulary/reading checklist and
/// custom task values, then reports totals, goal progress and streaks.
#[derive(Parser, Debug)]
#[command(name = "studylog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = storage::DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Pin the date treated as today (YYYY-MM-DD)
    #[arg(long, global = true, env = "STUDYLOG_TODAY", hide = true)]
    pub today: Option<NaiveDate>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Immersion study time
    #[command(subcommand)]
    Immersion(ImmersionCommands),

    /// Daily shadowing / vocabulary / reading checklist
    #[command(subcommand)]
    Checklist(ChecklistCommands),

    /// Custom tasks and their logged values
    #[command(subcommand)]
    Task(TaskCommands),

    /// Export a store as CSV
    Export {
        /// Store to export: immersion, checklist, or task:<id>
        store: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Overview of all progress
    Dashboard,
}

/// Immersion subcommands
#[derive(Subcommand, Debug)]
pub enum ImmersionCommands {
    /// Log study time for a day (replaces an existing entry)
    Add {
        /// Day to log (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Hours studied
        #[arg(long, default_value_t = 0)]
        hours: u32,

        /// Minutes studied (in addition to hours)
        #[arg(long, default_value_t = 0)]
        minutes: u32,

        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Remove the entry for a day
    Rm {
        /// Day to remove
        date: NaiveDate,
    },

    /// List logged days
    List {
        /// Range: last-7, last-30, last-90, this-year, all
        #[arg(long, default_value = "all")]
        range: String,
    },

    /// Totals, goal progress and streaks
    Stats,
}

/// Checklist subcommands
#[derive(Subcommand, Debug)]
pub enum ChecklistCommands {
    /// Record which items were done on a day (replaces an existing entry)
    Add {
        /// Day to record (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Shadowing practice done
        #[arg(long)]
        shadowing: bool,

        /// Vocabulary test done
        #[arg(long)]
        vocabulary: bool,

        /// Reading comprehension done
        #[arg(long)]
        reading: bool,

        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Remove the entry for a day
    Rm {
        /// Day to remove
        date: NaiveDate,
    },

    /// List recorded days
    List {
        /// Range: last-7, last-30, last-90, this-year, all
        #[arg(long, default_value = "all")]
        range: String,
    },

    /// Completion rates and perfect-day streaks
    Stats,
}

/// Custom task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks
    List {
        /// Include disabled tasks
        #[arg(long)]
        all: bool,
    },

    /// Define a new task
    Add {
        /// Display name
        name: String,

        /// Unit: minutes, hours, count, questions, items, pages, chapters, pieces, sessions, days
        #[arg(long)]
        unit: String,

        /// Goal to reach (0 < target <= 1,000,000)
        #[arg(long)]
        target: f64,
    },

    /// Change a task definition
    Update {
        /// Task id
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New unit
        #[arg(long)]
        unit: Option<String>,

        /// New target
        #[arg(long)]
        target: Option<f64>,

        /// Enable the task
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable the task
        #[arg(long)]
        disable: bool,
    },

    /// Delete a task and all of its logged values
    Rm {
        /// Task id
        id: String,
    },

    /// Log a value for a day (replaces an existing entry)
    Log {
        /// Task id
        id: String,

        /// Amount done
        #[arg(long)]
        value: f64,

        /// Day to log (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Remove the value logged for a day
    Unlog {
        /// Task id
        id: String,

        /// Day to remove
        date: NaiveDate,
    },

    /// List logged values
    Entries {
        /// Task id
        id: String,

        /// Range: last-7, last-30, last-90, this-year, all
        #[arg(long, default_value = "all")]
        range: String,
    },

    /// Totals, goal progress and streaks for a task
    Stats {
        /// Task id
        id: String,
    },
}

impl Commands {
    /// Command name reported in output envelopes, e.g. `task log`
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Immersion(cmd) => match cmd {
                ImmersionCommands::Add { .. } => "immersion add",
                ImmersionCommands::Rm { .. } => "immersion rm",
                ImmersionCommands::List { .. } => "immersion list",
                ImmersionCommands::Stats => "immersion stats",
            },
            Commands::Checklist(cmd) => match cmd {
                ChecklistCommands::Add { .. } => "checklist add",
                ChecklistCommands::Rm { .. } => "checklist rm",
                ChecklistCommands::List { .. } => "checklist list",
                ChecklistCommands::Stats => "checklist stats",
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { .. } => "task list",
                TaskCommands::Add { .. } => "task add",
                TaskCommands::Update { .. } => "task update",
                TaskCommands::Rm { .. } => "task rm",
                TaskCommands::Log { .. } => "task log",
                TaskCommands::Unlog { .. } => "task unlog",
                TaskCommands::Entries { .. } => "task entries",
                TaskCommands::Stats { .. } => "task stats",
            },
            Commands::Export { .. } => "export",
            Commands::Dashboard => "dashboard",
        }
    }
}

/// Resolved global state shared by every command
pub struct Context {
    pub backend: SharedBackend,
    pub config: Config,
    pub today: NaiveDate,
    pub output: OutputOptions,
}

impl Context {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let fs = FsBackend::new(storage::resolve_data_dir(cli.data_dir.as_deref()));
        let config = Config::load_or_default(&fs.config_file())?;
        let today = cli
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        tracing::debug!(data_dir = %fs.root().display(), %today, "resolved context");

        Ok(Self {
            backend: Arc::new(fs),
            config,
            today,
            output: OutputOptions {
                json: cli.json,
                quiet: cli.quiet,
            },
        })
    }

    /// Task catalog, seeded on first use when configured
    pub fn catalog(&self) -> Result<TaskCatalog> {
        TaskCatalog::open(
            SharedBackend::clone(&self.backend),
            self.config.catalog.seed_defaults,
        )
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let ctx = Context::from_cli(&self)?;

        match self.command {
            Commands::Immersion(cmd) => match cmd {
                ImmersionCommands::Add {
                    date,
                    hours,
                    minutes,
                    notes,
                } => immersion::run_add(&ctx, date, hours, minutes, notes),
                ImmersionCommands::Rm { date } => immersion::run_rm(&ctx, date),
                ImmersionCommands::List { range } => immersion::run_list(&ctx, &range),
                ImmersionCommands::Stats => immersion::run_stats(&ctx),
            },
            Commands::Checklist(cmd) => match cmd {
                ChecklistCommands::Add {
                    date,
                    shadowing,
                    vocabulary,
                    reading,
                    notes,
                } => checklist::run_add(
                    &ctx,
                    date,
                    crate::entry::ChecklistDay::new(shadowing, vocabulary, reading),
                    notes,
                ),
                ChecklistCommands::Rm { date } => checklist::run_rm(&ctx, date),
                ChecklistCommands::List { range } => checklist::run_list(&ctx, &range),
                ChecklistCommands::Stats => checklist::run_stats(&ctx),
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { all } => task::run_list(&ctx, all),
                TaskCommands::Add { name, unit, target } => {
                    task::run_add(&ctx, &name, &unit, target)
                }
                TaskCommands::Update {
                    id,
                    name,
                    unit,
                    target,
                    enable,
                    disable,
                } => {
                    let enabled = match (enable, disable) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    };
                    task::run_update(
                        &ctx,
                        task::UpdateOptions {
                            id,
                            name,
                            unit,
                            target,
                            enabled,
                        },
                    )
                }
                TaskCommands::Rm { id } => task::run_rm(&ctx, &id),
                TaskCommands::Log {
                    id,
                    value,
                    date,
                    notes,
                } => task::run_log(&ctx, &id, value, date, notes),
                TaskCommands::Unlog { id, date } => task::run_unlog(&ctx, &id, date),
                TaskCommands::Entries { id, range } => task::run_entries(&ctx, &id, &range),
                TaskCommands::Stats { id } => task::run_stats(&ctx, &id),
            },
            Commands::Export { store, output } => export::run(&ctx, &store, output),
            Commands::Dashboard => dashboard::run(&ctx),
        }
    }
}
