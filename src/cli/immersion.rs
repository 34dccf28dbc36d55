//! studylog immersion command implementation
//!
//! Logs, removes, lists and summarizes daily immersion minutes.

use chrono::NaiveDate;
use serde::Serialize;

use crate::cli::Context;
use crate::entry::{Entry, ImmersionMinutes};
use crate::error::Result;
use crate::output::{emit_success, format_minutes, HumanOutput};
use crate::stats::{self, DateRange, MetricSummary};
use crate::store::ImmersionStore;

#[derive(Serialize)]
struct AddReport {
    entry: Entry<ImmersionMinutes>,
    replaced: bool,
}

#[derive(Serialize)]
struct RemoveReport {
    date: NaiveDate,
    removed: bool,
}

#[derive(Serialize)]
struct ListReport {
    range: DateRange,
    total_minutes: f64,
    entries: Vec<Entry<ImmersionMinutes>>,
}

pub fn run_add(
    ctx: &Context,
    date: Option<NaiveDate>,
    hours: u32,
    minutes: u32,
    notes: String,
) -> Result<()> {
    let total = stats::validate_study_time(hours, minutes)?;
    let date = date.unwrap_or(ctx.today);
    let store = ImmersionStore::immersion(ctx.backend.clone());

    let replaced = store.get(date)?.is_some();
    let entry = store.upsert(date, ImmersionMinutes::new(total), notes)?;
    tracing::info!(%date, minutes = total, replaced, "logged immersion");

    let mut human = HumanOutput::new(format!(
        "studylog immersion add: {} on {}",
        format_minutes(f64::from(total)),
        date
    ));
    human.push_summary("date", date.to_string());
    human.push_summary("minutes", total.to_string());
    if !entry.notes.is_empty() {
        human.push_summary("notes", entry.notes.clone());
    }
    if replaced {
        human.push_warning(format!("replaced the existing entry for {date}"));
    }
    human.push_next_step("studylog immersion stats");

    emit_success(
        ctx.output,
        "immersion add",
        &AddReport { entry, replaced },
        Some(&human),
    )
}

pub fn run_rm(ctx: &Context, date: NaiveDate) -> Result<()> {
    let store = ImmersionStore::immersion(ctx.backend.clone());
    let removed = store.delete(date)?;

    let header = if removed {
        format!("studylog immersion rm: removed {date}")
    } else {
        format!("studylog immersion rm: nothing logged on {date}")
    };
    let human = HumanOutput::new(header);

    emit_success(
        ctx.output,
        "immersion rm",
        &RemoveReport { date, removed },
        Some(&human),
    )
}

pub fn run_list(ctx: &Context, range: &str) -> Result<()> {
    let range: DateRange = range.parse()?;
    let store = ImmersionStore::immersion(ctx.backend.clone());
    let entries = range.apply(&store.load()?, ctx.today);
    let total_minutes = stats::total_value(&entries, |fields| f64::from(fields.minutes));

    let mut human = HumanOutput::new(format!(
        "studylog immersion list: {} day(s), {}",
        entries.len(),
        format_minutes(total_minutes)
    ));
    for entry in &entries {
        let mut line = format!(
            "{}  {}",
            entry.date,
            format_minutes(f64::from(entry.fields.minutes))
        );
        if !entry.notes.is_empty() {
            line.push_str(&format!("  {}", entry.notes));
        }
        human.push_detail(line);
    }
    if entries.is_empty() {
        human.push_next_step("studylog immersion add --minutes 30");
    }

    emit_success(
        ctx.output,
        "immersion list",
        &ListReport {
            range,
            total_minutes,
            entries,
        },
        Some(&human),
    )
}

pub fn run_stats(ctx: &Context) -> Result<()> {
    let store = ImmersionStore::immersion(ctx.backend.clone());
    let entries = store.load()?;
    let summary = MetricSummary::immersion(
        &entries,
        ctx.config.immersion.goal_minutes as f64,
        ctx.config.immersion.streak_min_minutes,
        ctx.today,
    );

    let human = immersion_human(&summary);
    emit_success(ctx.output, "immersion stats", &summary, Some(&human))
}

fn immersion_human(summary: &MetricSummary) -> HumanOutput {
    let mut human = HumanOutput::new(format!(
        "studylog immersion stats: {:.1}% of {}",
        summary.progress_percentage,
        format_minutes(summary.target)
    ));
    human.push_summary("total", format_minutes(summary.total));
    human.push_summary("days logged", summary.days_logged.to_string());
    human.push_summary("daily average", format_minutes(summary.average_daily));
    human.push_summary("median", format_minutes(summary.median));
    human.push_summary("current streak", format!("{} day(s)", summary.current_streak));
    human.push_summary("longest streak", format!("{} day(s)", summary.longest_streak));
    if let Some(best) = &summary.best_day {
        human.push_summary("best day", format!("{} ({})", best.date, format_minutes(best.value)));
    }
    if let Some(eta) = summary.estimated_completion {
        human.push_summary("estimated completion", eta.to_string());
    }
    human.push_detail(summary.milestone.message());
    human
}
