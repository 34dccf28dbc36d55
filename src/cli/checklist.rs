//! studylog checklist command implementation

use chrono::NaiveDate;
use serde::Serialize;

use crate::cli::Context;
use crate::entry::{ChecklistDay, Entry, CHECKLIST_ITEMS};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::stats::{ChecklistSummary, DateRange};
use crate::store::ChecklistStore;

#[derive(Serialize)]
struct AddReport {
    entry: Entry<ChecklistDay>,
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
    entries: Vec<Entry<ChecklistDay>>,
}

fn mark(done: bool) -> &'static str {
    if done {
        "x"
    } else {
        " "
    }
}

fn checklist_line(entry: &Entry<ChecklistDay>) -> String {
    let fields = &entry.fields;
    let mut line = format!(
        "{}  [{}] shadowing  [{}] vocabulary  [{}] reading  {}/{}",
        entry.date,
        mark(fields.shadowing),
        mark(fields.vocabulary),
        mark(fields.reading),
        fields.total_completed(),
        CHECKLIST_ITEMS
    );
    if !entry.notes.is_empty() {
        line.push_str(&format!("  {}", entry.notes));
    }
    line
}

pub fn run_add(
    ctx: &Context,
    date: Option<NaiveDate>,
    day: ChecklistDay,
    notes: String,
) -> Result<()> {
    let date = date.unwrap_or(ctx.today);
    let store = ChecklistStore::checklist(ctx.backend.clone());

    let replaced = store.get(date)?.is_some();
    let entry = store.upsert(date, day, notes)?;
    tracing::info!(%date, completed = entry.fields.total_completed(), replaced, "recorded checklist");

    let mut human = HumanOutput::new(format!(
        "studylog checklist add: {}/{} on {}",
        entry.fields.total_completed(),
        CHECKLIST_ITEMS,
        date
    ));
    human.push_detail(checklist_line(&entry));
    if replaced {
        human.push_warning(format!("replaced the existing entry for {date}"));
    }
    if entry.fields.is_perfect() {
        human.push_next_step("studylog checklist stats");
    }

    emit_success(
        ctx.output,
        "checklist add",
        &AddReport { entry, replaced },
        Some(&human),
    )
}

pub fn run_rm(ctx: &Context, date: NaiveDate) -> Result<()> {
    let store = ChecklistStore::checklist(ctx.backend.clone());
    let removed = store.delete(date)?;

    let header = if removed {
        format!("studylog checklist rm: removed {date}")
    } else {
        format!("studylog checklist rm: nothing recorded on {date}")
    };

    emit_success(
        ctx.output,
        "checklist rm",
        &RemoveReport { date, removed },
        Some(&HumanOutput::new(header)),
    )
}

pub fn run_list(ctx: &Context, range: &str) -> Result<()> {
    let range: DateRange = range.parse()?;
    let store = ChecklistStore::checklist(ctx.backend.clone());
    let entries = range.apply(&store.load()?, ctx.today);

    let mut human = HumanOutput::new(format!(
        "studylog checklist list: {} day(s)",
        entries.len()
    ));
    for entry in &entries {
        human.push_detail(checklist_line(entry));
    }

    emit_success(
        ctx.output,
        "checklist list",
        &ListReport { range, entries },
        Some(&human),
    )
}

pub fn run_stats(ctx: &Context) -> Result<()> {
    let store = ChecklistStore::checklist(ctx.backend.clone());
    let entries = store.load()?;
    let summary = ChecklistSummary::compute(&entries, ctx.config.checklist.recent_window, ctx.today);

    let mut human = HumanOutput::new(format!(
        "studylog checklist stats: {} day(s) recorded",
        summary.total_days
    ));
    human.push_summary("shadowing", format!("{:.1}%", summary.shadowing_rate));
    human.push_summary("vocabulary", format!("{:.1}%", summary.vocabulary_rate));
    human.push_summary("reading", format!("{:.1}%", summary.reading_rate));
    human.push_summary(
        "average per day",
        format!("{:.2}/{}", summary.average_tasks_per_day, CHECKLIST_ITEMS),
    );
    human.push_summary(
        format!("last {} days", ctx.config.checklist.recent_window),
        format!("{:.2}/{}", summary.recent_average, CHECKLIST_ITEMS),
    );
    human.push_summary("perfect days", summary.perfect_days.to_string());
    human.push_summary(
        "current perfect streak",
        format!("{} day(s)", summary.current_perfect_streak),
    );
    human.push_summary(
        "longest perfect streak",
        format!("{} day(s)", summary.longest_perfect_streak),
    );

    emit_success(ctx.output, "checklist stats", &summary, Some(&human))
}
