use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::HeaderError;

type DedupFn = dyn Fn(Vec<String>) -> Result<Vec<String>, HeaderError> + Send + Sync;

/// Strategy for repeated column names.
#[derive(Clone, Default)]
pub enum Deduplicator {
    /// Later occurrences get `1`, `2`, ... appended, in place.
    #[default]
    AutoSuffix,
    /// Fail with `DuplicateHeaderColumn` listing the repeated names.
    Raise,
    /// Keep duplicates.
    None,
    Custom(Arc<DedupFn>),
}

impl Deduplicator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Vec<String>) -> Result<Vec<String>, HeaderError> + Send + Sync + 'static,
    {
        Deduplicator::Custom(Arc::new(f))
    }

    pub fn apply(&self, columns: Vec<String>) -> Result<Vec<String>, HeaderError> {
        match self {
            Deduplicator::AutoSuffix => Ok(deduplicate(&columns)),
            Deduplicator::Raise => {
                let duplicates = duplicated_items(&columns);
                if duplicates.is_empty() {
                    Ok(columns)
                } else {
                    Err(HeaderError::DuplicateHeaderColumn(duplicates))
                }
            }
            Deduplicator::None => Ok(columns),
            Deduplicator::Custom(f) => f(columns),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Deduplicator::AutoSuffix => "deduplicate",
            Deduplicator::Raise => "raise",
            Deduplicator::None => "none",
            Deduplicator::Custom(_) => "custom",
        }
    }
}

impl FromStr for Deduplicator {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deduplicate" | "auto_suffix" | "auto-suffix" => Ok(Deduplicator::AutoSuffix),
            "raise" => Ok(Deduplicator::Raise),
            "none" => Ok(Deduplicator::None),
            _ => Err(HeaderError::UnknownDeduplicationStrategy(s.to_string())),
        }
    }
}

impl fmt::Debug for Deduplicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Auto-suffix deduplication: `[a, a, b]` becomes `[a, a1, b]`.
///
/// Positions never move. A suffixed name that would collide with another
/// column is skipped, so `[a, a, a1]` becomes `[a, a2, a1]`.
pub fn deduplicate(columns: &[String]) -> Vec<String> {
    let taken: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let mut assigned: HashSet<String> = HashSet::with_capacity(columns.len());
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::with_capacity(columns.len());

    for column in columns {
        if assigned.insert(column.clone()) {
            out.push(column.clone());
            continue;
        }
        let counter = counters.entry(column.as_str()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{column}{counter}");
            if !taken.contains(candidate.as_str()) && !assigned.contains(&candidate) {
                assigned.insert(candidate.clone());
                out.push(candidate);
                break;
            }
        }
    }
    out
}

/// Names occurring more than once, in order of first appearance.
fn duplicated_items(columns: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for column in columns {
        *counts.entry(column.as_str()).or_insert(0) += 1;
    }
    let mut reported = HashSet::new();
    columns
        .iter()
        .filter(|c| counts[c.as_str()] > 1 && reported.insert(c.as_str()))
        .cloned()
        .collect()
}
