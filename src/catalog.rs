//! Custom task catalog.
//!
//! The catalog is a single `tasks.json` document holding task definitions in
//! insertion order. Every mutation loads the document, changes it and writes
//! it back whole. Each definition owns one [`TaskStore`] for its values.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::{self, Backend, SharedBackend};
use crate::store::TaskStore;

/// Maximum task name length, in characters, after trimming
pub const MAX_NAME_LEN: usize = 50;

/// Largest accepted target value
pub const MAX_TARGET: f64 = 1_000_000.0;

/// Unit a custom task is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Minutes,
    Hours,
    Count,
    Questions,
    Items,
    Pages,
    Chapters,
    Pieces,
    Sessions,
    Days,
}

impl Unit {
    pub const ALL: [Unit; 10] = [
        Unit::Minutes,
        Unit::Hours,
        Unit::Count,
        Unit::Questions,
        Unit::Items,
        Unit::Pages,
        Unit::Chapters,
        Unit::Pieces,
        Unit::Sessions,
        Unit::Days,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Minutes => "minutes",
            Unit::Hours => "hours",
            Unit::Count => "count",
            Unit::Questions => "questions",
            Unit::Items => "items",
            Unit::Pages => "pages",
            Unit::Chapters => "chapters",
            Unit::Pieces => "pieces",
            Unit::Sessions => "sessions",
            Unit::Days => "days",
        }
    }

    /// Localized label accepted as an alias on input
    pub fn localized(&self) -> &'static str {
        match self {
            Unit::Minutes => "分",
            Unit::Hours => "時間",
            Unit::Count => "回",
            Unit::Questions => "問",
            Unit::Items => "題",
            Unit::Pages => "ページ",
            Unit::Chapters => "章",
            Unit::Pieces => "個",
            Unit::Sessions => "本",
            Unit::Days => "日",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();
        Unit::ALL
            .iter()
            .copied()
            .find(|unit| unit.as_str() == lowered || unit.localized() == trimmed)
            .ok_or_else(|| {
                let names: Vec<&str> = Unit::ALL.iter().map(Unit::as_str).collect();
                Error::Validation(format!(
                    "unknown unit '{}': must be one of {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// A user-configured custom metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub name: String,
    pub unit: Unit,
    pub target: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

/// Partial update of a task definition; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub unit: Option<Unit>,
    pub target: Option<f64>,
    pub enabled: Option<bool>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.unit.is_none() && self.target.is_none() && self.enabled.is_none()
    }
}

/// Persisted catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub tasks: Vec<TaskDefinition>,
}

impl CatalogDocument {
    fn find(&self, id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut TaskDefinition> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Ids must be unique and every definition must pass validation
    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !ids.insert(task.id.as_str()) {
                return Err(Error::CorruptData {
                    store: storage::CATALOG_KEY.to_string(),
                    reason: format!("duplicate task id '{}'", task.id),
                });
            }
            if task.id.is_empty() {
                return Err(Error::CorruptData {
                    store: storage::CATALOG_KEY.to_string(),
                    reason: "task with empty id".to_string(),
                });
            }
            validate_target(task.target).map_err(|err| Error::CorruptData {
                store: storage::CATALOG_KEY.to_string(),
                reason: format!("task '{}': {}", task.id, err),
            })?;
        }
        Ok(())
    }

    /// Built-in defaults for a fresh data directory
    pub fn defaults(now: DateTime<Utc>) -> Self {
        let task = |id: &str, name: &str, unit: Unit, target: f64| TaskDefinition {
            id: id.to_string(),
            name: name.to_string(),
            unit,
            target,
            enabled: true,
            created_at: now,
            updated_at: None,
        };

        Self {
            tasks: vec![
                task("immersion", "Immersion study", Unit::Minutes, 60_000.0),
                task("toeic_shadowing", "Shadowing practice", Unit::Count, 365.0),
                task("toeic_vocabulary", "Vocabulary test", Unit::Questions, 73_000.0),
                task("toeic_reading", "Reading comprehension", Unit::Items, 1_095.0),
            ],
        }
    }
}

/// Registry of custom task definitions
#[derive(Clone)]
pub struct TaskCatalog {
    backend: SharedBackend,
}

impl TaskCatalog {
    /// Catalog over a backend; a missing document reads as empty
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Open the catalog, seeding the built-in defaults when no catalog
    /// document exists yet and `seed_defaults` is set
    pub fn open(backend: SharedBackend, seed_defaults: bool) -> Result<Self> {
        let catalog = Self::new(backend);
        if seed_defaults && catalog.backend.read_all(storage::CATALOG_KEY)?.is_none() {
            let document = CatalogDocument::defaults(Utc::now());
            catalog.save(&document)?;
            for task in &document.tasks {
                catalog.task_store(&task.id).init()?;
            }
            tracing::info!(tasks = document.tasks.len(), "seeded default task catalog");
        }
        Ok(catalog)
    }

    /// All definitions in insertion order
    pub fn list_all(&self) -> Result<Vec<TaskDefinition>> {
        Ok(self.load()?.tasks)
    }

    /// Enabled definitions in insertion order
    pub fn list_enabled(&self) -> Result<Vec<TaskDefinition>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|task| task.enabled)
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<TaskDefinition>> {
        Ok(self.load()?.find(id).cloned())
    }

    /// Create a definition and its empty store
    pub fn add(&self, name: &str, unit: Unit, target: f64) -> Result<TaskDefinition> {
        let name = validate_name(name)?;
        validate_target(target)?;

        let mut document = self.load()?;
        let id = unique_id(&slugify(&name), &document);

        let task = TaskDefinition {
            id,
            name,
            unit,
            target,
            enabled: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        // Empty the store before the definition becomes visible.
        self.task_store(&task.id).reset()?;
        document.tasks.push(task.clone());
        self.save(&document)?;

        tracing::info!(id = %task.id, unit = %task.unit, target = task.target, "added task");
        Ok(task)
    }

    /// Apply a partial update; unknown ids are an error
    pub fn update(&self, id: &str, update: TaskUpdate) -> Result<TaskDefinition> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(target) = update.target {
            validate_target(target)?;
        }

        let mut document = self.load()?;
        let task = document
            .find_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        if let Some(name) = name {
            task.name = name;
        }
        if let Some(unit) = update.unit {
            task.unit = unit;
        }
        if let Some(target) = update.target {
            task.target = target;
        }
        if let Some(enabled) = update.enabled {
            task.enabled = enabled;
        }
        task.updated_at = Some(Utc::now());

        let updated = task.clone();
        self.save(&document)?;

        tracing::info!(id = %updated.id, "updated task");
        Ok(updated)
    }

    /// Remove a definition and irreversibly purge its logged values
    pub fn delete(&self, id: &str) -> Result<TaskDefinition> {
        let mut document = self.load()?;
        let idx = document
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let removed = document.tasks.remove(idx);

        self.save(&document)?;
        self.task_store(id).purge()?;

        tracing::info!(id = %removed.id, "deleted task and its data");
        Ok(removed)
    }

    /// Store of a known task
    pub fn store(&self, id: &str) -> Result<TaskStore> {
        if self.load()?.find(id).is_none() {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        Ok(self.task_store(id))
    }

    fn task_store(&self, id: &str) -> TaskStore {
        TaskStore::task(SharedBackend::clone(&self.backend), id)
    }

    fn load(&self) -> Result<CatalogDocument> {
        let content = match self.backend.read_all(storage::CATALOG_KEY)? {
            Some(content) if !content.trim().is_empty() => content,
            _ => return Ok(CatalogDocument::default()),
        };

        let document: CatalogDocument =
            serde_json::from_str(&content).map_err(|err| Error::CorruptData {
                store: storage::CATALOG_KEY.to_string(),
                reason: err.to_string(),
            })?;
        document.validate()?;
        Ok(document)
    }

    fn save(&self, document: &CatalogDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        self.backend.write_all(storage::CATALOG_KEY, &json)
    }
}

/// Trimmed name with its length checked
fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("task name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "task name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_target(target: f64) -> Result<()> {
    if !target.is_finite() || target <= 0.0 {
        return Err(Error::Validation(format!(
            "target must be greater than 0, got {target}"
        )));
    }
    if target > MAX_TARGET {
        return Err(Error::Validation(format!(
            "target must be at most 1,000,000, got {target}"
        )));
    }
    Ok(())
}

/// Lower-case the name and turn every whitespace character into `_`
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .collect()
}

/// Append `_1`, `_2`, ... until the id is free
fn unique_id(base: &str, document: &CatalogDocument) -> String {
    let mut id = base.to_string();
    let mut counter = 1;
    while document.find(&id).is_some() {
        id = format!("{base}_{counter}");
        counter += 1;
    }
    id
}
