use crate::{ConverterRegistry, Deduplicator, HeaderNormalizer};

/// Header construction options.
#[derive(Debug, Clone, Default)]
pub struct HeaderOptions {
    pub normalizer: HeaderNormalizer,
    pub deduplicator: Deduplicator,
    /// Allow-list of column names; empty accepts any column.
    pub valid_columns: Vec<String>,
}

/// Everything a table build reads besides its input.
///
/// Build one and pass it by reference; there is no process-wide default.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub converters: ConverterRegistry,
    pub header: HeaderOptions,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_normalizer(mut self, normalizer: HeaderNormalizer) -> Self {
        self.header.normalizer = normalizer;
        self
    }

    pub fn with_deduplicator(mut self, deduplicator: Deduplicator) -> Self {
        self.header.deduplicator = deduplicator;
        self
    }

    pub fn with_valid_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header.valid_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}
