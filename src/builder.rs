use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::{
    ConvertError, Converter, ConverterRegistry, CsvResult, CsvShapeError, FieldId, Row, RowError,
    TypeError, Value,
};

/// What to run on one field: a registry key, an inline converter, or a
/// pipeline of either applied left to right.
#[derive(Clone, Debug)]
pub enum ConverterSpec {
    Key(String),
    Func(Converter),
    Pipeline(Vec<ConverterSpec>),
}

impl ConverterSpec {
    fn resolve_into(
        &self,
        registry: &ConverterRegistry,
        out: &mut Vec<Converter>,
    ) -> Result<(), TypeError> {
        match self {
            ConverterSpec::Key(key) => out.push(registry.lookup(key)?.clone()),
            ConverterSpec::Func(converter) => out.push(converter.clone()),
            ConverterSpec::Pipeline(specs) => {
                for spec in specs {
                    spec.resolve_into(registry, out)?;
                }
            }
        }
        Ok(())
    }
}

impl From<&str> for ConverterSpec {
    fn from(key: &str) -> Self {
        ConverterSpec::Key(key.to_string())
    }
}

impl From<String> for ConverterSpec {
    fn from(key: String) -> Self {
        ConverterSpec::Key(key)
    }
}

impl From<Converter> for ConverterSpec {
    fn from(converter: Converter) -> Self {
        ConverterSpec::Func(converter)
    }
}

impl From<Vec<ConverterSpec>> for ConverterSpec {
    fn from(specs: Vec<ConverterSpec>) -> Self {
        ConverterSpec::Pipeline(specs)
    }
}

impl<const N: usize> From<[&str; N]> for ConverterSpec {
    fn from(keys: [&str; N]) -> Self {
        ConverterSpec::Pipeline(keys.into_iter().map(ConverterSpec::from).collect())
    }
}

/// Per-field conversions, applied in insertion order.
#[derive(Clone, Debug, Default)]
pub struct TypeMap {
    entries: Vec<(String, ConverterSpec)>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversion for `field`; an existing entry keeps its position.
    pub fn insert(&mut self, field: impl Into<String>, spec: impl Into<ConverterSpec>) -> &mut Self {
        let field = field.into();
        let spec = spec.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = spec,
            None => self.entries.push((field, spec)),
        }
        self
    }

    pub fn with(mut self, field: impl Into<String>, spec: impl Into<ConverterSpec>) -> Self {
        self.insert(field, spec);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConverterSpec)> {
        self.entries.iter().map(|(f, s)| (f.as_str(), s))
    }
}

/// `a=integer,b=strip|upcase`: comma separated `field=key` pairs, keys
/// chained left to right with `|`.
impl FromStr for TypeMap {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut map = TypeMap::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, keys) = pair
                .split_once('=')
                .ok_or_else(|| TypeError::InvalidTypeMap(pair.to_string()))?;
            let keys: Vec<ConverterSpec> = keys
                .split('|')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ConverterSpec::from)
                .collect();
            if field.trim().is_empty() || keys.is_empty() {
                return Err(TypeError::InvalidTypeMap(pair.to_string()));
            }
            map.insert(field.trim(), keys);
        }
        Ok(map)
    }
}

impl<K, V> FromIterator<(K, V)> for TypeMap
where
    K: Into<String>,
    V: Into<ConverterSpec>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TypeMap::new();
        for (field, spec) in iter {
            map.insert(field, spec);
        }
        map
    }
}

type FinalizeFn<T> = dyn Fn(Row) -> Result<T, ConvertError> + Send + Sync;

/// Post-processing run on every built row.
///
/// A `Finalizer<Row>` adjusts the row in place; any other `T` turns each row
/// into a caller-defined record (see `RowBuilder::with_output`).
pub struct Finalizer<T = Row>(Arc<FinalizeFn<T>>);

impl<T> Finalizer<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Row) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        Finalizer(Arc::new(f))
    }

    pub fn call(&self, row: Row) -> Result<T, ConvertError> {
        (self.0)(row)
    }
}

impl<T> Clone for Finalizer<T> {
    fn clone(&self) -> Self {
        Finalizer(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Finalizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Finalizer(<fn>)")
    }
}

#[derive(Clone, Debug)]
struct FieldConversion {
    index: usize,
    column: FieldId,
    converters: Vec<Converter>,
}

/// Builds one record per raw row for a fixed set of columns.
///
/// Registry keys in the type map are resolved here, once, so later registry
/// changes do not affect an existing builder. Records are `Row`s unless the
/// builder was created with `with_output`.
pub struct RowBuilder<T = Row> {
    columns: Arc<[FieldId]>,
    conversions: Vec<FieldConversion>,
    finalizer: Finalizer<T>,
}

impl RowBuilder<Row> {
    pub fn new(
        columns: impl Into<Arc<[FieldId]>>,
        type_map: &TypeMap,
        registry: &ConverterRegistry,
        finalizer: Option<Finalizer>,
    ) -> CsvResult<Self> {
        let finalizer = finalizer.unwrap_or_else(|| Finalizer::new(Ok));
        Self::with_output(columns, type_map, registry, finalizer)
    }
}

impl<T> RowBuilder<T> {
    /// Builder whose finalizer maps each converted row to a `T`.
    pub fn with_output(
        columns: impl Into<Arc<[FieldId]>>,
        type_map: &TypeMap,
        registry: &ConverterRegistry,
        finalizer: Finalizer<T>,
    ) -> CsvResult<Self> {
        let columns = columns.into();
        if columns.is_empty() {
            return Err(RowError::EmptyRowColumns.into());
        }

        let mut conversions = Vec::with_capacity(type_map.len());
        for (field, spec) in type_map.iter() {
            let index = columns
                .iter()
                .position(|c| c.as_str() == field)
                .ok_or_else(|| RowError::UnknownTypeMapColumn(field.to_string()))?;
            let mut converters = Vec::new();
            spec.resolve_into(registry, &mut converters)?;
            conversions.push(FieldConversion {
                index,
                column: columns[index].clone(),
                converters,
            });
        }

        Ok(Self {
            columns,
            conversions,
            finalizer,
        })
    }

    pub fn columns(&self) -> &[FieldId] {
        &self.columns
    }

    pub(crate) fn shared_columns(&self) -> Arc<[FieldId]> {
        Arc::clone(&self.columns)
    }

    /// Build one record. Rows shorter than the columns are padded with nulls;
    /// longer rows fail with `InvalidRowLength`.
    pub fn build(&self, raw: &[Option<String>]) -> CsvResult<T> {
        if raw.len() > self.columns.len() {
            return Err(self.invalid_length(raw));
        }

        let mut values: Vec<Value> = raw.iter().cloned().map(Value::from).collect();
        values.resize(self.columns.len(), Value::Null);
        let mut row = Row::from_values(Arc::clone(&self.columns), values)
            .map_err(|_| self.invalid_length(raw))?;

        for conversion in &self.conversions {
            let slot = row.value_at_mut(conversion.index);
            let mut value = std::mem::take(slot);
            for converter in &conversion.converters {
                value = converter.call(value).map_err(|source| match source {
                    ConvertError::LengthMismatch { .. } => self.invalid_length(raw),
                    source => CsvShapeError::Conversion {
                        column: conversion.column.to_string(),
                        source,
                    },
                })?;
            }
            *slot = value;
        }

        self.finalizer.call(row).map_err(|e| match e {
            ConvertError::LengthMismatch { .. } => self.invalid_length(raw),
            e => CsvShapeError::Finalize(e),
        })
    }

    fn invalid_length(&self, raw: &[Option<String>]) -> CsvShapeError {
        RowError::InvalidRowLength {
            row_len: raw.len(),
            column_len: self.columns.len(),
            row: inspect_row(raw),
        }
        .into()
    }
}

impl<T> Clone for RowBuilder<T> {
    fn clone(&self) -> Self {
        RowBuilder {
            columns: Arc::clone(&self.columns),
            conversions: self.conversions.clone(),
            finalizer: self.finalizer.clone(),
        }
    }
}

impl<T> fmt::Debug for RowBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBuilder")
            .field("columns", &self.columns)
            .field("conversions", &self.conversions)
            .field("finalizer", &self.finalizer)
            .finish()
    }
}

fn inspect_row(raw: &[Option<String>]) -> String {
    let cells: Vec<String> = raw
        .iter()
        .map(|cell| match cell {
            Some(s) => format!("{s:?}"),
            None => "nil".to_string(),
        })
        .collect();
    format!("[{}]", cells.join(", "))
}
