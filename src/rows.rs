use std::collections::HashSet;
use std::ops::Index;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::{CsvResult, FieldId, Row, RowBuilder, RowError, ToCsv};

/// Built records, in input order. `Row`s unless the builder maps them to
/// another type.
#[derive(Debug, Clone)]
pub struct Rows<T = Row> {
    columns: Arc<[FieldId]>,
    rows: Vec<T>,
}

/// Blank line as delivered by a tokenizer: no cells, or a single absent one.
pub(crate) fn is_blank(raw: &[Option<String>]) -> bool {
    matches!(raw, [] | [None])
}

impl<T> Rows<T> {
    /// Build every non-blank raw row. The first failing row aborts the build.
    pub fn new<I, R>(raw_rows: I, builder: &RowBuilder<T>) -> CsvResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[Option<String>]>,
    {
        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for (line, raw) in raw_rows.into_iter().enumerate() {
            let raw = raw.as_ref();
            if is_blank(raw) {
                trace!(line, "skipping blank row");
                skipped += 1;
                continue;
            }
            rows.push(builder.build(raw)?);
        }
        debug!(built = rows.len(), skipped, "built rows");

        Ok(Self {
            columns: builder.shared_columns(),
            rows,
        })
    }

    pub(crate) fn from_built(columns: Arc<[FieldId]>, rows: Vec<T>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[FieldId] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.rows.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.rows.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.rows
    }
}

impl<T: ToCsv> Rows<T> {
    pub fn to_csv(&self, columns: Option<&[&str]>) -> CsvResult<String> {
        self.to_csv_filtered(columns, |_| true)
    }

    /// Records for which `predicate` holds, one CSV line each. No header line.
    pub fn to_csv_filtered<F>(&self, columns: Option<&[&str]>, mut predicate: F) -> CsvResult<String>
    where
        F: FnMut(&T) -> bool,
    {
        let mut out = String::new();
        for row in self.rows.iter().filter(|row| predicate(row)) {
            out.push_str(&row.to_csv_line(columns)?);
        }
        Ok(out)
    }
}

impl Rows<Row> {
    /// Both collections' rows, this one's first. Columns must be the same set
    /// (order may differ); rows of `other` are reordered to these columns.
    pub fn merge(&self, other: &Rows) -> CsvResult<Rows> {
        let ours: HashSet<&str> = self.columns.iter().map(FieldId::as_str).collect();
        let theirs: HashSet<&str> = other.columns.iter().map(FieldId::as_str).collect();
        if ours != theirs {
            return Err(RowError::IncompatibleColumns {
                left: self.columns.iter().map(ToString::to_string).collect(),
                right: other.columns.iter().map(ToString::to_string).collect(),
            }
            .into());
        }

        let mut rows = Vec::with_capacity(self.rows.len() + other.rows.len());
        rows.extend(self.rows.iter().cloned());
        rows.extend(
            other
                .rows
                .iter()
                .cloned()
                .map(|row| row.realigned(&self.columns)),
        );
        Ok(Self::from_built(Arc::clone(&self.columns), rows))
    }
}

impl<T> Index<usize> for Rows<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.rows[index]
    }
}

impl<'a, T> IntoIterator for &'a Rows<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<T> IntoIterator for Rows<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
