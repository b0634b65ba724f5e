use bytes::{Buf, BytesMut};
use encoding_rs::CoderResult;
use regex::Regex;
use std::io;
use tokio_util::codec::Decoder;

/// Transcodes any `encoding_rs` charset to UTF-8 (dropping a leading BOM) and
/// emits whole lines, leaving out lines that match the skip pattern.
///
/// Works on physical lines: a quoted field spanning lines is only safe when
/// none of its continuation lines match the pattern.
pub struct LineDecoder {
    decoder: encoding_rs::Decoder,
    skip: Option<Regex>,
    pending: String,
    finished: bool,
}

impl LineDecoder {
    pub fn new(charset: &'static encoding_rs::Encoding, skip: Option<Regex>) -> Self {
        Self {
            decoder: charset.new_decoder(),
            skip,
            pending: String::new(),
            finished: false,
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(src.len())
                .unwrap_or_else(|| src.len() * 3 + 4);
            self.pending.reserve(needed);
            let (result, read, _had_errors) =
                self.decoder
                    .decode_to_string(&src[..], &mut self.pending, last);
            src.advance(read);
            if let CoderResult::InputEmpty = result {
                break;
            }
        }
    }

    fn keep_lines(&self, text: &str) -> BytesMut {
        let mut out = BytesMut::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\r', '\n']);
            if let Some(skip) = &self.skip {
                if skip.is_match(content) {
                    continue;
                }
            }
            out.extend_from_slice(line.as_bytes());
        }
        out
    }
}

impl Decoder for LineDecoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            self.transcode(src, false);
        }

        let Some(last_break) = self.pending.rfind('\n') else {
            return Ok(None);
        };
        let complete: String = self.pending.drain(..=last_break).collect();
        let out = self.keep_lines(&complete);
        Ok((!out.is_empty()).then_some(out))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !self.finished {
            self.transcode(buf, true);
            self.finished = true;
        }
        buf.clear();

        if self.pending.is_empty() {
            return Ok(None);
        }
        let rest = std::mem::take(&mut self.pending);
        let out = self.keep_lines(&rest);
        Ok((!out.is_empty()).then_some(out))
    }
}
