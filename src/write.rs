use csv::{Terminator, WriterBuilder};
use std::io;

use crate::CsvResult;

/// One `\n`-terminated CSV line. Fields are quoted only when they contain the
/// delimiter, a quote or a line break; `None` is written as an empty field.
///
/// A line holding nothing or a single `None` is a bare `\n`; a single empty
/// string is still written as `""` so it reads back as one field.
pub(crate) fn csv_line<I>(fields: I) -> CsvResult<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let fields: Vec<Option<String>> = fields.into_iter().collect();
    if matches!(fields.as_slice(), [] | [None]) {
        return Ok("\n".to_string());
    }
    let fields: Vec<String> = fields.into_iter().map(Option::unwrap_or_default).collect();

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(64));
    writer.write_record(&fields)?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}
