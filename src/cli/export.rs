//! studylog export command implementation

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::Context;
use crate::error::{Error, Result};
use crate::export;
use crate::output::{emit_success, HumanOutput};
use crate::storage;
use crate::store::{ChecklistStore, ImmersionStore};

/// Which store an export reads from
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportSource {
    Immersion,
    Checklist,
    Task(String),
}

impl std::str::FromStr for ExportSource {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "immersion" => Ok(ExportSource::Immersion),
            "checklist" => Ok(ExportSource::Checklist),
            other => match other.strip_prefix("task:") {
                Some(id) if !id.is_empty() => Ok(ExportSource::Task(id.to_string())),
                _ => Err(Error::InvalidArgument(format!(
                    "invalid store '{}': must be immersion, checklist, or task:<id>",
                    s
                ))),
            },
        }
    }
}

#[derive(Serialize)]
struct ExportReport {
    store: String,
    rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    csv: Option<String>,
}

pub fn run(ctx: &Context, store: &str, output: Option<PathBuf>) -> Result<()> {
    let source: ExportSource = store.parse()?;

    let (rows, csv) = match &source {
        ExportSource::Immersion => {
            let entries = ImmersionStore::immersion(ctx.backend.clone()).load()?;
            (entries.len(), export::to_csv_string(&entries)?)
        }
        ExportSource::Checklist => {
            let entries = ChecklistStore::checklist(ctx.backend.clone()).load()?;
            (entries.len(), export::to_csv_string(&entries)?)
        }
        ExportSource::Task(id) => {
            let entries = ctx.catalog()?.store(id)?.load()?;
            (entries.len(), export::to_csv_string(&entries)?)
        }
    };

    match output {
        Some(path) => {
            storage::write_atomic(&path, csv.as_bytes())?;
            tracing::info!(store, rows, path = %path.display(), "exported csv");

            let mut human = HumanOutput::new(format!(
                "studylog export: {} row(s) to {}",
                rows,
                path.display()
            ));
            human.push_summary("store", store);

            emit_success(
                ctx.output,
                "export",
                &ExportReport {
                    store: store.to_string(),
                    rows,
                    path: Some(path),
                    csv: None,
                },
                Some(&human),
            )
        }
        None if ctx.output.json => emit_success(
            ctx.output,
            "export",
            &ExportReport {
                store: store.to_string(),
                rows,
                path: None,
                csv: Some(csv),
            },
            None,
        ),
        None => {
            print!("{csv}");
            Ok(())
        }
    }
}
