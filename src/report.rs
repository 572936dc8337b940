//! Result containers produced by the pipeline
//!
//! A [`RecordReport`] maps analyzer names to [`Outcome`]s for one record, and a
//! [`BatchReport`] maps record headers to record reports. Both keep first-insertion
//! order; inserting an existing key replaces its value in place.

use std::collections::HashMap;

use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{AnalysisValue, Error};

/// What went wrong, as far as the caller needs to distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The analyzer itself failed on the record
    Analysis,
    /// The analyzer could not read or write the cache
    Cache,
}

/// A typed description of an analyzer failure on one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisFailure {
    pub analyzer: String,
    pub kind: FailureKind,
    pub message: String,
}
impl AnalysisFailure {
    #[must_use]
    pub fn new(analyzer: &str, error: &Error) -> Self {
        let kind = if error.is_cache() {
            FailureKind::Cache
        } else {
            FailureKind::Analysis
        };
        Self {
            analyzer: analyzer.to_string(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Either an analyzer's value or the reason it has none
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Value(AnalysisValue),
    Error(AnalysisFailure),
}
impl Outcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    #[must_use]
    pub fn value(&self) -> Option<&AnalysisValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&AnalysisFailure> {
        match self {
            Self::Value(_) => None,
            Self::Error(failure) => Some(failure),
        }
    }
}

/// A string-keyed map that remembers first-insertion order
#[derive(Debug, Clone)]
pub struct ResultMap<V> {
    entries: Vec<(String, V)>,
    by_key: HashMap<String, usize>,
}
impl<V> Default for ResultMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
        }
    }
}
impl<V: PartialEq> PartialEq for ResultMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
impl<V> ResultMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            by_key: HashMap::with_capacity(capacity),
        }
    }

    /// Inserts `value` under `key`, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(&index) = self.by_key.get(&key) {
            return Some(std::mem::replace(&mut self.entries[index].1, value));
        }
        self.by_key.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.by_key.get(key).map(|&index| &self.entries[index].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
impl<V> IntoIterator for ResultMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
impl<V: Serialize> Serialize for ResultMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Analyzer name → outcome, for a single record
pub type RecordReport = ResultMap<Outcome>;

/// Record header → per-record report, for a batch of records
pub type BatchReport = ResultMap<RecordReport>;

impl RecordReport {
    /// Number of analyzers that failed on this record
    #[must_use]
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|(_, o)| !o.is_ok()).count()
    }
}

impl BatchReport {
    /// Number of failed analyzer runs across every record
    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.entries.iter().map(|(_, r)| r.failures()).sum()
    }
}
