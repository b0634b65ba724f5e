//! Typed rows from messy, human-authored CSV.
//!
//! - Header path: raw header cells are normalized into canonical field
//!   identifiers, then deduplicated under a selectable strategy.
//! - Row path: each raw row is bound positionally to those identifiers,
//!   converted per field through a type map, then optionally finalized.
//! - Input: in-memory matrices, or async readers (gzip/zstd, any charset).
//! - Fast local path: feature `fast_local`, mmap + parallel row building.
//!
//! Data shape:
//! - `Table { header: Header, rows: Rows }`
//! - `Row`: ordered `FieldId -> Value` bindings, serializable back to CSV
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod builder;
mod codec;
mod config;
pub mod convert;
mod dedup;
#[cfg(feature = "fast_local")]
mod fast;
mod header;
mod normalize;
mod registry;
mod row;
mod rows;
mod source;
mod table;
mod value;
mod write;

pub use crate::builder::{ConverterSpec, Finalizer, RowBuilder, TypeMap};
pub use crate::config::{Configuration, HeaderOptions};
pub use crate::dedup::{deduplicate, Deduplicator};
#[cfg(feature = "fast_local")]
pub use crate::fast::fast_local_matrix;
pub use crate::header::{FieldId, Header};
pub use crate::normalize::{normalize_column, ColumnRename, HeaderNormalizer};
pub use crate::registry::{Converter, ConverterRegistry};
pub use crate::row::Row;
pub use crate::rows::Rows;
pub use crate::source::{build_source_reader, read_matrix, reader_from_path, ReadOptions, SourceMeta};
pub use crate::table::{Table, TableOptions};
pub use crate::value::{ToCsv, Value};

use thiserror::Error;

/// One raw record as delivered by a tokenizer; `None` is an absent cell.
pub type RawRow = Vec<Option<String>>;

/// Raw rows, header row included unless supplied separately.
pub type Matrix = Vec<RawRow>;

/// Errors raised while building the header.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("CSV header can't be empty")]
    MissingHeader,
    #[error(
        "CSV header column can't be empty (column {}). When you pass your own \
         normalizer make sure that it never returns an empty string. Instead generate \
         unique column names.",
        column_label(.index)
    )]
    MissingHeaderColumn { index: Option<usize> },
    #[error("all columns must be unique, duplicates are: {}", .0.join(", "))]
    DuplicateHeaderColumn(Vec<String>),
    #[error("column '{0}' is not in the list of valid columns")]
    UnknownHeaderColumn(String),
    #[error("unknown deduplication strategy '{0}'")]
    UnknownDeduplicationStrategy(String),
    #[error("deduplication returned {actual} columns for a header of {expected}")]
    DeduplicatedLength { expected: usize, actual: usize },
}

/// Errors raised while building rows.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("expected at least one column, but columns were empty")]
    EmptyRowColumns,
    #[error("row length {row_len}, column length {column_len}, row: {row}")]
    InvalidRowLength {
        row_len: usize,
        column_len: usize,
        row: String,
    },
    #[error("type map references unknown column '{0}'")]
    UnknownTypeMapColumn(String),
    #[error("can't merge rows with different columns: [{}] vs [{}]", .left.join(", "), .right.join(", "))]
    IncompatibleColumns { left: Vec<String>, right: Vec<String> },
}

/// Converter registry errors.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("type '{0}' already exists")]
    TypeExists(String),
    #[error("invalid type map entry '{0}', expected field=type")]
    InvalidTypeMap(String),
}

/// Error returned by converters and finalizers.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("can't convert {value:?} to {target}")]
    Invalid { target: &'static str, value: String },
    #[error("can't convert nil to {target}")]
    Null { target: &'static str },
    /// A row was rebuilt with a different number of values than columns.
    #[error("row size differs: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error type returned by this crate when not using `anyhow`.
#[derive(Debug, Error)]
pub enum CsvShapeError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Row(#[from] RowError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error("failed to convert column '{column}': {source}")]
    Conversion {
        column: String,
        #[source]
        source: ConvertError,
    },
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("row finalizer failed: {0}")]
    Finalize(#[source] ConvertError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
    #[error(transparent)]
    CsvWrite(#[from] csv::Error),
}

fn column_label(index: &Option<usize>) -> String {
    match index {
        Some(i) => i.to_string(),
        None => "unknown".to_string(),
    }
}

pub type CsvResult<T> = std::result::Result<T, CsvShapeError>;
