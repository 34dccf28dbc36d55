//! studylog task command implementation
//!
//! Manages the custom task catalog and the values logged against each task.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::{TaskDefinition, TaskUpdate, Unit};
use crate::cli::Context;
use crate::entry::{Entry, TaskValue};
use crate::error::{Error, Result};
use crate::output::{emit_success, format_amount, HumanOutput};
use crate::stats::{self, DateRange, MetricSummary};

/// Options for `studylog task update`
pub struct UpdateOptions {
    pub id: String,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub target: Option<f64>,
    pub enabled: Option<bool>,
}

#[derive(Serialize)]
struct ListReport {
    tasks: Vec<TaskDefinition>,
}

#[derive(Serialize)]
struct TaskReport {
    task: TaskDefinition,
}

#[derive(Serialize)]
struct LogReport {
    task_id: String,
    entry: Entry<TaskValue>,
    replaced: bool,
}

#[derive(Serialize)]
struct UnlogReport {
    task_id: String,
    date: NaiveDate,
    removed: bool,
}

#[derive(Serialize)]
struct EntriesReport {
    task_id: String,
    range: DateRange,
    total: f64,
    entries: Vec<Entry<TaskValue>>,
}

#[derive(Serialize)]
struct StatsReport {
    task: TaskDefinition,
    #[serde(flatten)]
    summary: MetricSummary,
}

/// A day with any positive value counts toward a task streak
const TASK_STREAK_THRESHOLD: f64 = f64::MIN_POSITIVE;

fn describe(task: &TaskDefinition) -> String {
    let state = if task.enabled { "" } else { "  (disabled)" };
    format!(
        "{}  {}  target {} {}{}",
        task.id,
        task.name,
        format_amount(task.target),
        task.unit,
        state
    )
}

pub fn run_list(ctx: &Context, all: bool) -> Result<()> {
    let catalog = ctx.catalog()?;
    let tasks = if all {
        catalog.list_all()?
    } else {
        catalog.list_enabled()?
    };

    let mut human = HumanOutput::new(format!("studylog task list: {} task(s)", tasks.len()));
    for task in &tasks {
        human.push_detail(describe(task));
    }
    if tasks.is_empty() {
        human.push_next_step("studylog task add <name> --unit pages --target 100");
    }

    emit_success(ctx.output, "task list", &ListReport { tasks }, Some(&human))
}

pub fn run_add(ctx: &Context, name: &str, unit: &str, target: f64) -> Result<()> {
    let unit: Unit = unit.parse()?;
    let task = ctx.catalog()?.add(name, unit, target)?;

    let mut human = HumanOutput::new(format!("studylog task add: {}", task.id));
    human.push_summary("id", task.id.clone());
    human.push_summary("name", task.name.clone());
    human.push_summary("target", format!("{} {}", format_amount(task.target), task.unit));
    human.push_next_step(format!("studylog task log {} --value 1", task.id));

    emit_success(ctx.output, "task add", &TaskReport { task }, Some(&human))
}

pub fn run_update(ctx: &Context, options: UpdateOptions) -> Result<()> {
    let update = TaskUpdate {
        name: options.name,
        unit: options.unit.as_deref().map(str::parse::<Unit>).transpose()?,
        target: options.target,
        enabled: options.enabled,
    };
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update: pass --name, --unit, --target, --enable or --disable".to_string(),
        ));
    }

    let task = ctx.catalog()?.update(&options.id, update)?;

    let mut human = HumanOutput::new(format!("studylog task update: {}", task.id));
    human.push_detail(describe(&task));

    emit_success(ctx.output, "task update", &TaskReport { task }, Some(&human))
}

pub fn run_rm(ctx: &Context, id: &str) -> Result<()> {
    let task = ctx.catalog()?.delete(id)?;

    let mut human = HumanOutput::new(format!("studylog task rm: {}", task.id));
    human.push_warning("all values logged for this task were deleted");

    emit_success(ctx.output, "task rm", &TaskReport { task }, Some(&human))
}

pub fn run_log(
    ctx: &Context,
    id: &str,
    value: f64,
    date: Option<NaiveDate>,
    notes: String,
) -> Result<()> {
    let catalog = ctx.catalog()?;
    let store = catalog.store(id)?;
    let date = date.unwrap_or(ctx.today);

    let replaced = store.get(date)?.is_some();
    let entry = store.upsert(date, TaskValue::new(value), notes)?;
    tracing::info!(task = id, %date, value, replaced, "logged task value");

    let mut human = HumanOutput::new(format!(
        "studylog task log: {} {} on {}",
        id,
        format_amount(value),
        date
    ));
    if replaced {
        human.push_warning(format!("replaced the existing entry for {date}"));
    }
    human.push_next_step(format!("studylog task stats {id}"));

    emit_success(
        ctx.output,
        "task log",
        &LogReport {
            task_id: id.to_string(),
            entry,
            replaced,
        },
        Some(&human),
    )
}

pub fn run_unlog(ctx: &Context, id: &str, date: NaiveDate) -> Result<()> {
    let store = ctx.catalog()?.store(id)?;
    let removed = store.delete(date)?;

    let header = if removed {
        format!("studylog task unlog: removed {id} on {date}")
    } else {
        format!("studylog task unlog: nothing logged for {id} on {date}")
    };

    emit_success(
        ctx.output,
        "task unlog",
        &UnlogReport {
            task_id: id.to_string(),
            date,
            removed,
        },
        Some(&HumanOutput::new(header)),
    )
}

pub fn run_entries(ctx: &Context, id: &str, range: &str) -> Result<()> {
    let range: DateRange = range.parse()?;
    let store = ctx.catalog()?.store(id)?;
    let entries = range.apply(&store.load()?, ctx.today);
    let total = stats::total_value(&entries, |fields| fields.value);

    let mut human = HumanOutput::new(format!(
        "studylog task entries: {} ({} day(s), total {})",
        id,
        entries.len(),
        format_amount(total)
    ));
    for entry in &entries {
        let mut line = format!("{}  {}", entry.date, format_amount(entry.fields.value));
        if !entry.notes.is_empty() {
            line.push_str(&format!("  {}", entry.notes));
        }
        human.push_detail(line);
    }

    emit_success(
        ctx.output,
        "task entries",
        &EntriesReport {
            task_id: id.to_string(),
            range,
            total,
            entries,
        },
        Some(&human),
    )
}

pub fn run_stats(ctx: &Context, id: &str) -> Result<()> {
    let catalog = ctx.catalog()?;
    let task = catalog
        .get(id)?
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
    let entries = catalog.store(id)?.load()?;
    let summary = task_summary(&task, &entries, ctx.today);

    let mut human = HumanOutput::new(format!(
        "studylog task stats: {} {:.1}%",
        task.id, summary.progress_percentage
    ));
    human.push_summary(
        "total",
        format!(
            "{} / {} {}",
            format_amount(summary.total),
            format_amount(summary.target),
            task.unit
        ),
    );
    human.push_summary("days logged", summary.days_logged.to_string());
    human.push_summary("daily average", format_amount(summary.average_daily));
    human.push_summary("current streak", format!("{} day(s)", summary.current_streak));
    human.push_summary("longest streak", format!("{} day(s)", summary.longest_streak));
    if let Some(best) = &summary.best_day {
        human.push_summary("best day", format!("{} ({})", best.date, format_amount(best.value)));
    }
    if let Some(eta) = summary.estimated_completion {
        human.push_summary("estimated completion", eta.to_string());
    }
    human.push_detail(summary.milestone.message());

    emit_success(
        ctx.output,
        "task stats",
        &StatsReport { task, summary },
        Some(&human),
    )
}

pub(crate) fn task_summary(
    task: &TaskDefinition,
    entries: &[Entry<TaskValue>],
    today: NaiveDate,
) -> MetricSummary {
    MetricSummary::compute(
        entries,
        |fields| fields.value,
        task.target,
        TASK_STREAK_THRESHOLD,
        today,
    )
}
