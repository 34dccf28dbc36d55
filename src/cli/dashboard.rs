//! studylog dashboard command implementation
//!
//! One-screen overview: immersion progress, checklist rates, and every
//! enabled custom task.

use serde::Serialize;

use crate::catalog::TaskDefinition;
use crate::cli::task::task_summary;
use crate::cli::Context;
use crate::error::Result;
use crate::output::{emit_success, format_amount, format_minutes, HumanOutput};
use crate::stats::{ChecklistSummary, MetricSummary};
use crate::store::{ChecklistStore, ImmersionStore};

#[derive(Serialize)]
struct TaskProgress {
    task: TaskDefinition,
    #[serde(flatten)]
    summary: MetricSummary,
}

#[derive(Serialize)]
struct DashboardReport {
    today: chrono::NaiveDate,
    immersion: MetricSummary,
    checklist: ChecklistSummary,
    tasks: Vec<TaskProgress>,
}

pub fn run(ctx: &Context) -> Result<()> {
    let immersion_entries = ImmersionStore::immersion(ctx.backend.clone()).load()?;
    let immersion = MetricSummary::immersion(
        &immersion_entries,
        ctx.config.immersion.goal_minutes as f64,
        ctx.config.immersion.streak_min_minutes,
        ctx.today,
    );

    let checklist_entries = ChecklistStore::checklist(ctx.backend.clone()).load()?;
    let checklist =
        ChecklistSummary::compute(&checklist_entries, ctx.config.checklist.recent_window, ctx.today);

    let catalog = ctx.catalog()?;
    let mut tasks = Vec::new();
    for task in catalog.list_enabled()? {
        let entries = catalog.store(&task.id)?.load()?;
        let summary = task_summary(&task, &entries, ctx.today);
        tasks.push(TaskProgress { task, summary });
    }

    let mut human = HumanOutput::new(format!("studylog dashboard: {}", ctx.today));
    human.push_summary(
        "immersion",
        format!(
            "{} / {} ({:.1}%), streak {} day(s)",
            format_minutes(immersion.total),
            format_minutes(immersion.target),
            immersion.progress_percentage,
            immersion.current_streak
        ),
    );
    human.push_summary(
        "checklist",
        format!(
            "{} perfect day(s), streak {} day(s)",
            checklist.perfect_days, checklist.current_perfect_streak
        ),
    );
    for progress in &tasks {
        human.push_detail(format!(
            "{}: {} / {} {} ({:.1}%)",
            progress.task.name,
            format_amount(progress.summary.total),
            format_amount(progress.summary.target),
            progress.task.unit,
            progress.summary.progress_percentage
        ));
    }
    if immersion.days_logged == 0 && checklist.total_days == 0 {
        human.push_next_step("studylog immersion add --minutes 30");
    }

    emit_success(
        ctx.output,
        "dashboard",
        &DashboardReport {
            today: ctx.today,
            immersion,
            checklist,
            tasks,
        },
        Some(&human),
    )
}
