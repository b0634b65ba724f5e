use memchr::memchr_iter;
use memmap2::MmapOptions;
use std::fs::File;
use std::io;
use std::path::Path;
use std::thread;
use tracing::debug;

use crate::rows::is_blank;
use crate::{CsvResult, CsvShapeError, Matrix, RawRow, RowBuilder, Rows};

fn worker_panicked() -> CsvShapeError {
    io::Error::other("worker thread panicked").into()
}

/// Fast local tokenizer for uncompressed UTF-8 files using mmap and parallel chunking.
/// Assumptions: UTF-8, no quoted fields, no embedded newlines.
pub fn fast_local_matrix(path: &Path, delimiter: u8, line_break: u8) -> CsvResult<Matrix> {
    let file = File::open(path)?;
    let len = file.metadata()?.len() as usize;
    if len == 0 {
        return Ok(Matrix::new());
    }
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    let data: &[u8] = &mmap[..];

    // Chunk starts, each moved forward to just after a line break
    let cores = num_cpus::get().max(1);
    let approx = (len / cores).max(1);
    let mut starts = vec![0usize];
    let mut pos = approx;
    while starts.len() < cores && pos < len {
        let next = memchr_iter(line_break, &data[pos..])
            .next()
            .map(|off| pos + off + 1)
            .unwrap_or(len);
        if next >= len {
            break;
        }
        if next > *starts.last().unwrap_or(&0) {
            starts.push(next);
        }
        pos = next + approx;
    }
    starts.push(len);

    let parts: Vec<CsvResult<Vec<RawRow>>> = thread::scope(|s| {
        let handles: Vec<_> = starts
            .windows(2)
            .map(|w| {
                let slice = &data[w[0]..w[1]];
                s.spawn(move || split_lines(slice, delimiter, line_break))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(worker_panicked())))
            .collect()
    });

    let mut matrix = Matrix::new();
    for part in parts {
        matrix.extend(part?);
    }
    debug!(rows = matrix.len(), chunks = starts.len() - 1, "fast local matrix");
    Ok(matrix)
}

fn split_lines(slice: &[u8], delimiter: u8, line_break: u8) -> CsvResult<Vec<RawRow>> {
    let mut rows = Vec::new();
    let mut cursor = 0usize;
    let mut push_line = |line: &[u8]| -> CsvResult<()> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            return Ok(());
        }
        let mut row = RawRow::new();
        let mut start = 0usize;
        for i in memchr_iter(delimiter, line).chain(std::iter::once(line.len())) {
            let field = std::str::from_utf8(&line[start..i])
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            row.push((!field.is_empty()).then(|| field.to_string()));
            start = i + 1;
        }
        rows.push(row);
        Ok(())
    };

    for nl in memchr_iter(line_break, slice) {
        push_line(&slice[cursor..nl])?;
        cursor = nl + 1;
    }
    // last line without a trailing break
    if cursor < slice.len() {
        push_line(&slice[cursor..])?;
    }
    Ok(rows)
}

impl<T: Send> Rows<T> {
    /// Build rows across one worker per CPU. Output keeps input order and the
    /// reported error is the first failing row in input order.
    pub fn new_parallel(raw_rows: &[RawRow], builder: &RowBuilder<T>) -> CsvResult<Self> {
        let workers = num_cpus::get().max(1);
        let chunk = raw_rows.len().div_ceil(workers).max(1);

        let parts: Vec<CsvResult<Vec<T>>> = thread::scope(|s| {
            let handles: Vec<_> = raw_rows
                .chunks(chunk)
                .map(|part| {
                    s.spawn(move || {
                        part.iter()
                            .filter(|raw| !is_blank(raw))
                            .map(|raw| builder.build(raw))
                            .collect::<CsvResult<Vec<_>>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|_| Err(worker_panicked())))
                .collect()
        });

        let mut rows = Vec::with_capacity(raw_rows.len());
        for part in parts {
            rows.extend(part?);
        }
        debug!(built = rows.len(), workers, "built rows in parallel");
        Ok(Rows::from_built(builder.shared_columns(), rows))
    }
}
