//! Date-keyed entries and the field sets they carry.
//!
//! Each store holds exactly one kind of field set, fixed by its type:
//! immersion minutes, the three-item checklist, or a custom task value.

use std::fmt;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};

/// One date-keyed record: a field set plus free-text notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<F> {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub fields: F,
    #[serde(default)]
    pub notes: String,
}

impl<F> Entry<F> {
    pub fn new(date: NaiveDate, fields: F, notes: impl Into<String>) -> Self {
        Self {
            date,
            fields,
            notes: notes.into(),
        }
    }
}

/// Statically shaped field set of a store.
pub trait FieldSet: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug {
    /// Column names between `date` and `notes`, in persisted order
    const COLUMNS: &'static [&'static str];

    /// Reject values the store must never hold
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Recompute derived fields
    fn normalize(self) -> Self {
        self
    }

    /// Column values for tabular export, aligned with `COLUMNS`
    fn columns(&self) -> Vec<String>;
}

/// Minutes of immersion study on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmersionMinutes {
    pub minutes: u32,
}

impl ImmersionMinutes {
    pub fn new(minutes: u32) -> Self {
        Self { minutes }
    }
}

impl FieldSet for ImmersionMinutes {
    const COLUMNS: &'static [&'static str] = &["minutes"];

    fn columns(&self) -> Vec<String> {
        vec![self.minutes.to_string()]
    }
}

/// Number of items on the daily checklist
pub const CHECKLIST_ITEMS: u8 = 3;

/// One day of the shadowing / vocabulary / reading checklist.
///
/// `total_completed` is derived from the three flags and cannot be set on its
/// own; it is recomputed whenever the day is written or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistDay {
    pub shadowing: bool,
    pub vocabulary: bool,
    pub reading: bool,
    #[serde(default)]
    total_completed: u8,
}

impl ChecklistDay {
    pub fn new(shadowing: bool, vocabulary: bool, reading: bool) -> Self {
        Self {
            shadowing,
            vocabulary,
            reading,
            total_completed: 0,
        }
        .normalize()
    }

    pub fn total_completed(&self) -> u8 {
        self.total_completed
    }

    /// All checklist items done
    pub fn is_perfect(&self) -> bool {
        self.total_completed == CHECKLIST_ITEMS
    }
}

impl FieldSet for ChecklistDay {
    const COLUMNS: &'static [&'static str] =
        &["shadowing", "vocabulary", "reading", "total_completed"];

    fn normalize(mut self) -> Self {
        self.total_completed = [self.shadowing, self.vocabulary, self.reading]
            .iter()
            .filter(|done| **done)
            .count() as u8;
        self
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.shadowing.to_string(),
            self.vocabulary.to_string(),
            self.reading.to_string(),
            self.total_completed.to_string(),
        ]
    }
}

/// Logged amount for a custom task (pages, repetitions, ...)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskValue {
    pub value: f64,
}

impl TaskValue {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl FieldSet for TaskValue {
    const COLUMNS: &'static [&'static str] = &["value"];

    fn validate(&self) -> Result<()> {
        if !self.value.is_finite() {
            return Err(Error::Validation(format!(
                "value must be a finite number, got {}",
                self.value
            )));
        }
        if self.value < 0.0 {
            return Err(Error::Validation(format!(
                "value cannot be negative, got {}",
                self.value
            )));
        }
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        vec![self.value.to_string()]
    }
}
