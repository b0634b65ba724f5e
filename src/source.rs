use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use csv_async::AsyncReaderBuilder;
use futures::StreamExt;
use regex::Regex;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::codec::LineDecoder;
use crate::{CsvResult, Matrix};

/// Transport hints for a byte source; all fields are optional.
#[derive(Debug, Clone)]
pub struct SourceMeta {
    /// MIME type, e.g. `application/gzip`.
    pub content_type: String,
    /// HTTP-style content encoding list, e.g. `gzip` or `zstd`.
    pub content_encoding: String,
    /// File or object name; its extension is the last resort.
    pub name_hint: String,
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for SourceMeta {
    fn default() -> Self {
        SourceMeta {
            content_type: String::new(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

/// How delimited text is tokenized into a raw matrix.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: u8,
    pub quote: u8,
    /// Lines matching this pattern are dropped before tokenizing.
    pub skip_lines: Option<Regex>,
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            delimiter: b',',
            quote: b'"',
            skip_lines: None,
            charset: encoding_rs::UTF_8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    Plain,
    Gzip,
    Zstd,
}

impl Compression {
    fn from_extension(name: &str) -> Self {
        match name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("gz") => Compression::Gzip,
            Some("zst") => Compression::Zstd,
            _ => Compression::Plain,
        }
    }

    /// Content encoding wins over content type, which wins over the name.
    fn detect(meta: &SourceMeta) -> Self {
        let encodings = meta.content_encoding.to_ascii_lowercase();
        for encoding in encodings.split(',').map(str::trim) {
            match encoding {
                "gzip" | "x-gzip" => return Compression::Gzip,
                "zstd" => return Compression::Zstd,
                _ => {}
            }
        }
        match meta.content_type.to_ascii_lowercase().as_str() {
            "application/gzip" | "application/x-gzip" => Compression::Gzip,
            "application/zstd" => Compression::Zstd,
            _ => Compression::from_extension(&meta.name_hint),
        }
    }

    fn hints(self) -> (&'static str, &'static str) {
        match self {
            Compression::Gzip => ("application/gzip", "gzip"),
            Compression::Zstd => ("application/zstd", "zstd"),
            Compression::Plain => ("text/csv", ""),
        }
    }
}

/// Wrap a raw byte source with optional decompression, transcoding to UTF-8
/// and skip-line filtering. Returns the reader plus the meta that was used.
pub fn build_source_reader<R>(
    raw: R,
    meta: SourceMeta,
    skip_lines: Option<Regex>,
) -> (impl AsyncRead + Unpin + Send, SourceMeta)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buffered = BufReader::with_capacity(1 << 20, raw);
    let bytes: Box<dyn AsyncRead + Unpin + Send> = match Compression::detect(&meta) {
        Compression::Gzip => Box::new(GzipDecoder::new(buffered)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buffered)),
        Compression::Plain => Box::new(buffered),
    };

    // plain UTF-8 without skip patterns passes through untouched
    let text: Box<dyn AsyncRead + Unpin + Send> =
        if meta.charset == encoding_rs::UTF_8 && skip_lines.is_none() {
            bytes
        } else {
            let lines = FramedRead::new(bytes, LineDecoder::new(meta.charset, skip_lines));
            Box::new(StreamReader::new(lines))
        };

    (text, meta)
}

/// Open a local file; compression is inferred from the extension.
pub async fn reader_from_path(
    path: &Path,
    options: &ReadOptions,
) -> CsvResult<(impl AsyncRead + Unpin + Send, SourceMeta)> {
    let name_hint = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (content_type, content_encoding) = Compression::from_extension(&name_hint).hints();
    let meta = SourceMeta {
        content_type: content_type.to_string(),
        content_encoding: content_encoding.to_string(),
        name_hint,
        charset: options.charset,
    };

    let file = File::open(path).await?;
    debug!(path = %path.display(), encoding = %meta.content_encoding, "opened csv source");
    Ok(build_source_reader(file, meta, options.skip_lines.clone()))
}

/// Tokenize delimited text into a raw matrix. Blank lines are dropped and
/// empty cells become `None`.
///
/// Charset and skip lines are applied by `build_source_reader`; pass a reader
/// built by it when those options matter.
pub async fn read_matrix<R>(reader: R, options: &ReadOptions) -> CsvResult<Matrix>
where
    R: AsyncRead + Unpin + Send,
{
    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .quote(options.quote)
        // Larger internal buffer reduces syscalls and allocator churn
        .buffer_capacity(1 << 20)
        .create_reader(reader);

    let mut matrix = Matrix::new();
    let mut records = rdr.records();
    while let Some(record) = records.next().await {
        let record = record?;
        matrix.push(
            record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }
    Ok(matrix)
}
