use std::path::Path;
use tokio::io::AsyncRead;

use crate::source::{build_source_reader, read_matrix, reader_from_path, ReadOptions, SourceMeta};
use crate::{
    Configuration, CsvResult, FieldId, Finalizer, Header, Matrix, RawRow, Row, RowBuilder, Rows,
    TypeMap,
};

/// Per-table inputs besides the matrix itself.
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    /// Header to use instead of the matrix's first row.
    pub header: Option<RawRow>,
    pub type_map: TypeMap,
    pub finalizer: Option<Finalizer>,
}

/// A header plus the rows built against it.
#[derive(Debug, Clone)]
pub struct Table {
    header: Header,
    rows: Rows,
}

impl Table {
    /// Table from a matrix whose first row is the header, default configuration.
    pub fn new(matrix: Matrix) -> CsvResult<Self> {
        Self::with_options(matrix, &TableOptions::default(), &Configuration::default())
    }

    pub fn with_options(
        matrix: Matrix,
        options: &TableOptions,
        config: &Configuration,
    ) -> CsvResult<Self> {
        let mut raw_rows = matrix.into_iter();
        let header_row = match &options.header {
            Some(header) => header.clone(),
            None => raw_rows.next().unwrap_or_default(),
        };

        let header = Header::with_options(header_row, &config.header)?;
        let builder = RowBuilder::new(
            header.shared_columns(),
            &options.type_map,
            &config.converters,
            options.finalizer.clone(),
        )?;
        let rows = Rows::new(raw_rows, &builder)?;
        Ok(Self { header, rows })
    }

    /// Tokenize delimited text from `reader`, then build the table.
    pub async fn from_reader<R>(
        reader: R,
        read: &ReadOptions,
        options: &TableOptions,
        config: &Configuration,
    ) -> CsvResult<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let meta = SourceMeta {
            charset: read.charset,
            ..Default::default()
        };
        let (reader, _meta) = build_source_reader(reader, meta, read.skip_lines.clone());
        let matrix = read_matrix(reader, read).await?;
        Self::with_options(matrix, options, config)
    }

    /// Like `from_reader`, for a local file (gzip/zstd detected by extension).
    pub async fn from_path(
        path: &Path,
        read: &ReadOptions,
        options: &TableOptions,
        config: &Configuration,
    ) -> CsvResult<Self> {
        let (reader, _meta) = reader_from_path(path, read).await?;
        let matrix = read_matrix(reader, read).await?;
        Self::with_options(matrix, options, config)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn columns(&self) -> &[FieldId] {
        self.header.columns()
    }

    pub fn rows(&self) -> &Rows {
        &self.rows
    }

    pub fn into_rows(self) -> Rows {
        self.rows
    }

    pub fn each_row(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Header line followed by every row.
    pub fn to_csv(&self, columns: Option<&[&str]>) -> CsvResult<String> {
        self.to_csv_filtered(columns, |_| true)
    }

    /// Header line followed by the rows for which `predicate` holds.
    pub fn to_csv_filtered<F>(&self, columns: Option<&[&str]>, predicate: F) -> CsvResult<String>
    where
        F: FnMut(&Row) -> bool,
    {
        let mut out = self.header.to_csv(columns)?;
        out.push_str(&self.rows.to_csv_filtered(columns, predicate)?);
        Ok(out)
    }
}
