use anyhow::anyhow;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use crate::header::selected_indices;
use crate::write::csv_line;
use crate::{ConvertError, CsvResult, FieldId, ToCsv, Value};

/// One record: values bound positionally to the header's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[FieldId]>,
    values: Vec<Value>,
}

impl Row {
    /// Bind `values` to `columns`; both must have the same length.
    pub fn from_values(columns: Arc<[FieldId]>, values: Vec<Value>) -> Result<Self, ConvertError> {
        if columns.len() != values.len() {
            return Err(ConvertError::LengthMismatch {
                expected: columns.len(),
                actual: values.len(),
            });
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[FieldId] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.as_str() == field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.position(field).map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.position(field).map(|i| &mut self.values[i])
    }

    /// Replace the value of `field`, returning the previous one.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<Value, ConvertError> {
        let slot = self
            .get_mut(field)
            .ok_or_else(|| anyhow!("no member '{field}' in row"))?;
        Ok(std::mem::replace(slot, value.into()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &Value)> {
        self.columns.iter().zip(self.values.iter())
    }

    /// Row as a CSV line, optionally restricted to `columns` (row order is kept).
    pub fn to_csv(&self, columns: Option<&[&str]>) -> CsvResult<String> {
        let fields = selected_indices(&self.columns, columns)
            .into_iter()
            .map(|i| self.values[i].to_csv_field())
            .collect::<CsvResult<Vec<_>>>()?;
        csv_line(fields)
    }

    pub(crate) fn value_at_mut(&mut self, index: usize) -> &mut Value {
        &mut self.values[index]
    }

    /// Same bindings reordered to `columns`, which must hold the same names.
    pub(crate) fn realigned(mut self, columns: &Arc<[FieldId]>) -> Row {
        if Arc::ptr_eq(&self.columns, columns) || *self.columns == **columns {
            return self;
        }
        let values = columns
            .iter()
            .map(|c| {
                self.position(c.as_str())
                    .map(|i| std::mem::take(&mut self.values[i]))
                    .unwrap_or_default()
            })
            .collect();
        Row {
            columns: Arc::clone(columns),
            values,
        }
    }
}

impl Index<&str> for Row {
    type Output = Value;

    /// Panics when `field` is not a column of this row.
    fn index(&self, field: &str) -> &Value {
        match self.get(field) {
            Some(value) => value,
            None => panic!("no member '{field}' in row"),
        }
    }
}

impl ToCsv for Row {
    fn to_csv_field(&self) -> CsvResult<String> {
        self.to_csv(None)
    }

    fn to_csv_line(&self, columns: Option<&[&str]>) -> CsvResult<String> {
        self.to_csv(columns)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Row(")?;
        for (i, (column, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::String(s) => write!(f, "{column}={s:?}")?,
                Value::Null => write!(f, "{column}=nil")?,
                other => write!(f, "{column}={other}")?,
            }
        }
        f.write_str(")")
    }
}
