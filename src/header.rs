use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

use crate::write::csv_line;
use crate::{CsvResult, HeaderError, HeaderOptions, RawRow};

/// Canonical, non-blank column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(name: impl Into<String>) -> Result<Self, HeaderError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(HeaderError::MissingHeaderColumn { index: None });
        }
        Ok(FieldId(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for FieldId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for FieldId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FieldId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The CSV header: original cells plus the canonical columns built from them.
#[derive(Debug, Clone)]
pub struct Header {
    original: RawRow,
    columns: Arc<[FieldId]>,
}

impl Header {
    /// Header built with the default normalizer and auto-suffix deduplication.
    pub fn new(raw: RawRow) -> Result<Self, HeaderError> {
        Self::with_options(raw, &HeaderOptions::default())
    }

    pub fn with_options(raw: RawRow, options: &HeaderOptions) -> Result<Self, HeaderError> {
        if raw.is_empty() {
            return Err(HeaderError::MissingHeader);
        }

        let valid: HashSet<&str> = options.valid_columns.iter().map(String::as_str).collect();
        let mut columns = Vec::with_capacity(raw.len());
        for (index, cell) in raw.iter().enumerate() {
            let column = options.normalizer.normalize(cell.as_deref(), index)?;
            if column.trim().is_empty() {
                return Err(HeaderError::MissingHeaderColumn { index: Some(index) });
            }
            if !valid.is_empty() && !valid.contains(column.as_str()) {
                return Err(HeaderError::UnknownHeaderColumn(column));
            }
            columns.push(column);
        }

        let expected = columns.len();
        let columns = options.deduplicator.apply(columns)?;
        if columns.len() != expected {
            return Err(HeaderError::DeduplicatedLength {
                expected,
                actual: columns.len(),
            });
        }
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(index, column)| {
                FieldId::new(column)
                    .map_err(|_| HeaderError::MissingHeaderColumn { index: Some(index) })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            columns = columns.len(),
            deduplicator = options.deduplicator.name(),
            "built header"
        );
        Ok(Self {
            original: raw,
            columns: columns.into(),
        })
    }

    pub fn original(&self) -> &[Option<String>] {
        &self.original
    }

    pub fn columns(&self) -> &[FieldId] {
        &self.columns
    }

    pub(crate) fn shared_columns(&self) -> Arc<[FieldId]> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldId> {
        self.columns.iter()
    }

    /// Header as a CSV line, optionally restricted to `columns` (header order is kept).
    pub fn to_csv(&self, columns: Option<&[&str]>) -> CsvResult<String> {
        csv_line(
            selected_indices(&self.columns, columns)
                .into_iter()
                .map(|i| Some(self.columns[i].to_string())),
        )
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a FieldId;
    type IntoIter = std::slice::Iter<'a, FieldId>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Positions of `columns` that appear in `selection`, in column order.
pub(crate) fn selected_indices(columns: &[FieldId], selection: Option<&[&str]>) -> Vec<usize> {
    match selection {
        None => (0..columns.len()).collect(),
        Some(selection) => {
            let wanted: HashSet<&str> = selection.iter().copied().collect();
            columns
                .iter()
                .enumerate()
                .filter(|(_, c)| wanted.contains(c.as_str()))
                .map(|(i, _)| i)
                .collect()
        }
    }
}
