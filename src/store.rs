//! Date-keyed upsert store.
//!
//! A [`DateMetricStore`] holds at most one [`Entry`] per calendar date and
//! always hands entries back sorted ascending by date. Every mutation is a
//! load-modify-save cycle that rewrites the whole document.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::NaiveDate;

use crate::entry::{ChecklistDay, Entry, FieldSet, ImmersionMinutes, TaskValue};
use crate::error::{Error, Result};
use crate::storage::{self, Backend, SharedBackend};

/// Store for one metric stream
pub struct DateMetricStore<F> {
    backend: SharedBackend,
    key: String,
    _fields: PhantomData<F>,
}

/// Immersion minutes per day
pub type ImmersionStore = DateMetricStore<ImmersionMinutes>;

/// Shadowing / vocabulary / reading checklist per day
pub type ChecklistStore = DateMetricStore<ChecklistDay>;

/// Logged values of one custom task
pub type TaskStore = DateMetricStore<TaskValue>;

impl<F> Clone for DateMetricStore<F> {
    fn clone(&self) -> Self {
        Self {
            backend: SharedBackend::clone(&self.backend),
            key: self.key.clone(),
            _fields: PhantomData,
        }
    }
}

impl DateMetricStore<ImmersionMinutes> {
    pub fn immersion(backend: SharedBackend) -> Self {
        Self::new(backend, storage::IMMERSION_KEY)
    }
}

impl DateMetricStore<ChecklistDay> {
    pub fn checklist(backend: SharedBackend) -> Self {
        Self::new(backend, storage::CHECKLIST_KEY)
    }
}

impl DateMetricStore<TaskValue> {
    pub fn task(backend: SharedBackend, task_id: &str) -> Self {
        Self::new(backend, storage::task_store_key(task_id))
    }
}

impl<F: FieldSet> DateMetricStore<F> {
    pub fn new(backend: SharedBackend, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            _fields: PhantomData,
        }
    }

    /// Storage key of the backing document
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load all entries, sorted ascending by date.
    ///
    /// A missing document is an empty store. If the document holds several
    /// rows for one date, the last row wins.
    pub fn load(&self) -> Result<Vec<Entry<F>>> {
        let content = match self.backend.read_all(&self.key)? {
            Some(content) => content,
            None => {
                tracing::debug!(store = %self.key, "store missing, treating as empty");
                return Ok(Vec::new());
            }
        };

        let rows: Vec<Entry<F>> = storage::decode_jsonl(&self.key, &content)?;
        let row_count = rows.len();

        let mut by_date = BTreeMap::new();
        for mut row in rows {
            row.fields.validate().map_err(|err| Error::CorruptData {
                store: self.key.clone(),
                reason: format!("{}: {}", row.date, err),
            })?;
            row.fields = row.fields.normalize();
            by_date.insert(row.date, row);
        }

        if by_date.len() != row_count {
            tracing::warn!(
                store = %self.key,
                rows = row_count,
                dates = by_date.len(),
                "duplicate dates in store, keeping the last row for each"
            );
        }

        tracing::debug!(store = %self.key, entries = by_date.len(), "loaded store");
        Ok(by_date.into_values().collect())
    }

    /// Entry for one date, if any
    pub fn get(&self, date: NaiveDate) -> Result<Option<Entry<F>>> {
        Ok(self.load()?.into_iter().find(|entry| entry.date == date))
    }

    /// Insert or replace the entry for `date`, then rewrite the store.
    ///
    /// On error nothing is considered persisted.
    pub fn upsert(&self, date: NaiveDate, fields: F, notes: impl Into<String>) -> Result<Entry<F>> {
        fields.validate()?;
        let entry = Entry::new(date, fields.normalize(), notes);

        let mut by_date: BTreeMap<NaiveDate, Entry<F>> = self
            .load()?
            .into_iter()
            .map(|existing| (existing.date, existing))
            .collect();
        let replaced = by_date.insert(date, entry.clone()).is_some();

        let entries: Vec<Entry<F>> = by_date.into_values().collect();
        self.save(&entries)?;

        tracing::debug!(store = %self.key, %date, replaced, "upserted entry");
        Ok(entry)
    }

    /// Remove the entry for `date`.
    ///
    /// Returns whether an entry was removed; an absent date is a successful
    /// no-op and leaves the document untouched.
    pub fn delete(&self, date: NaiveDate) -> Result<bool> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|entry| entry.date != date);
        if entries.len() == before {
            return Ok(false);
        }

        self.save(&entries)?;
        tracing::debug!(store = %self.key, %date, "deleted entry");
        Ok(true)
    }

    /// Create an empty document if none exists yet
    pub fn init(&self) -> Result<()> {
        if self.backend.read_all(&self.key)?.is_none() {
            self.backend.write_all(&self.key, "")?;
        }
        Ok(())
    }

    /// Replace the backing document with an empty one, discarding any rows
    pub fn reset(&self) -> Result<()> {
        self.backend.write_all(&self.key, "")?;
        tracing::debug!(store = %self.key, "reset store");
        Ok(())
    }

    /// Irreversibly remove the backing document
    pub fn purge(&self) -> Result<()> {
        self.backend.remove(&self.key)?;
        tracing::debug!(store = %self.key, "purged store");
        Ok(())
    }

    fn save(&self, entries: &[Entry<F>]) -> Result<()> {
        let content = storage::encode_jsonl(entries)?;
        self.backend.write_all(&self.key, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FsBackend, MemoryBackend};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        s.parse().expect("date")
    }

    fn memory() -> (Arc<MemoryBackend>, SharedBackend) {
        let backend = Arc::new(MemoryBackend::new());
        let shared: SharedBackend = backend.clone();
        (backend, shared)
    }

    #[test]
    fn missing_store_loads_empty() {
        let (_, backend) = memory();
        let store = ImmersionStore::immersion(backend);
        assert!(store.load().unwrap().is_empty());
        assert!(store.get(date("2024-01-01")).unwrap().is_none());
    }

    #[test]
    fn upsert_replaces_existing_date() {
        let (_, backend) = memory();
        let store = ImmersionStore::immersion(backend);
        let day = date("2024-06-01");

        store.upsert(day, ImmersionMinutes::new(30), "first").unwrap();
        store.upsert(day, ImmersionMinutes::new(50), "second").unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields.minutes, 50);
        assert_eq!(entries[0].notes, "second");
    }

    #[test]
    fn upsert_is_idempotent() {
        let (raw, backend) = memory();
        let store = ImmersionStore::immersion(backend);
        let day = date("2024-06-01");

        store.upsert(day, ImmersionMinutes::new(30), "n").unwrap();
        let first = raw.read_all(store.key()).unwrap();
        let loaded = store.load().unwrap();

        store.upsert(day, ImmersionMinutes::new(30), "n").unwrap();
        assert_eq!(raw.read_all(store.key()).unwrap(), first);
        assert_eq!(store.load().unwrap(), loaded);
    }

    #[test]
    fn entries_stay_sorted() {
        let (_, backend) = memory();
        let store = ImmersionStore::immersion(backend);

        for (day, minutes) in [("2024-03-05", 5), ("2024-01-02", 2), ("2024-02-10", 10)] {
            store.upsert(date(day), ImmersionMinutes::new(minutes), "").unwrap();
        }
        store.delete(date("2024-02-10")).unwrap();
        store.upsert(date("2023-12-31"), ImmersionMinutes::new(1), "").unwrap();

        let dates: Vec<_> = store.load().unwrap().iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date("2023-12-31"), date("2024-01-02"), date("2024-03-05")]
        );
    }

    #[test]
    fn delete_absent_is_noop_success() {
        let (raw, backend) = memory();
        let store = ImmersionStore::immersion(backend);

        assert!(!store.delete(date("2024-01-01")).unwrap());
        assert!(raw.keys().is_empty());

        store.upsert(date("2024-01-01"), ImmersionMinutes::new(3), "").unwrap();
        assert!(store.delete(date("2024-01-01")).unwrap());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn checklist_total_recomputed_on_write() {
        let (_, backend) = memory();
        let store = ChecklistStore::checklist(backend);

        let entry = store
            .upsert(date("2024-01-01"), ChecklistDay::new(true, false, true), "")
            .unwrap();
        assert_eq!(entry.fields.total_completed(), 2);

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].fields.total_completed(), 2);
    }

    #[test]
    fn load_repairs_duplicates_and_stale_totals() {
        let (raw, backend) = memory();
        let store = ChecklistStore::checklist(backend);
        raw.insert_raw(
            store.key(),
            concat!(
                r#"{"date":"2024-01-02","shadowing":true,"vocabulary":true,"reading":true,"total_completed":3,"notes":"a"}"#,
                "\n",
                r#"{"date":"2024-01-01","shadowing":true,"vocabulary":false,"reading":false,"total_completed":0,"notes":""}"#,
                "\n",
                r#"{"date":"2024-01-02","shadowing":false,"vocabulary":true,"reading":false,"notes":"b"}"#,
                "\n",
            ),
        );

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, date("2024-01-01"));
        assert_eq!(entries[0].fields.total_completed(), 1);
        assert_eq!(entries[1].notes, "b");
        assert_eq!(entries[1].fields.total_completed(), 1);
    }

    #[test]
    fn corrupt_rows_are_reported() {
        let (raw, backend) = memory();
        let store = TaskStore::task(backend, "pages");
        raw.insert_raw(store.key(), "{\"date\":\"2024-01-01\",\"value\":-4}\n");

        assert!(matches!(store.load(), Err(Error::CorruptData { .. })));

        raw.insert_raw(store.key(), "garbage\n");
        let err = store
            .upsert(date("2024-01-02"), TaskValue::new(1.0), "")
            .unwrap_err();
        assert!(matches!(err, Error::CorruptData { .. }));
        assert_eq!(raw.read_all(store.key()).unwrap().as_deref(), Some("garbage\n"));
    }

    #[test]
    fn invalid_fields_rejected_before_write() {
        let (raw, backend) = memory();
        let store = TaskStore::task(backend, "pages");

        let err = store
            .upsert(date("2024-01-01"), TaskValue::new(-2.0), "")
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(raw.keys().is_empty());
    }

    #[test]
    fn write_failure_is_surfaced() {
        let (raw, backend) = memory();
        let store = ImmersionStore::immersion(backend);
        store.upsert(date("2024-01-01"), ImmersionMinutes::new(10), "").unwrap();

        raw.set_fail_writes(true);
        let err = store
            .upsert(date("2024-01-02"), ImmersionMinutes::new(20), "")
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(store.delete(date("2024-01-01")).is_err());

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields.minutes, 10);
    }

    #[test]
    fn init_and_purge() {
        let (raw, backend) = memory();
        let store = TaskStore::task(backend, "pages");

        store.init().unwrap();
        assert_eq!(raw.keys(), vec!["tasks/pages.jsonl".to_string()]);
        assert!(store.load().unwrap().is_empty());

        store.upsert(date("2024-01-01"), TaskValue::new(4.5), "").unwrap();
        store.init().unwrap();
        assert_eq!(store.load().unwrap().len(), 1);

        store.purge().unwrap();
        assert!(raw.keys().is_empty());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn reset_discards_existing_rows() {
        let (raw, backend) = memory();
        let store = TaskStore::task(backend, "pages");
        store.upsert(date("2024-01-01"), TaskValue::new(4.5), "").unwrap();

        store.reset().unwrap();
        assert_eq!(raw.keys(), vec!["tasks/pages.jsonl".to_string()]);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn filesystem_round_trip() {
        let temp = TempDir::new().unwrap();
        let backend: SharedBackend = Arc::new(FsBackend::new(temp.path()));
        let store = ImmersionStore::immersion(Arc::clone(&backend));

        store.upsert(date("2024-06-02"), ImmersionMinutes::new(45), "").unwrap();
        store.upsert(date("2024-06-01"), ImmersionMinutes::new(30), "anime").unwrap();

        let content = std::fs::read_to_string(temp.path().join("immersion.jsonl")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("2024-06-01"));

        let reopened = ImmersionStore::immersion(backend);
        assert_eq!(reopened.load().unwrap(), store.load().unwrap());
    }
}
