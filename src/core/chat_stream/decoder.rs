//! Line-oriented decoding of streamed chat responses.
//!
//! Bytes arrive in arbitrary chunks; [`LineBuffer`] cuts them into lines and
//! [`StreamAccumulator`] turns `data: ` lines into accumulated reply text.
//! A `data: ` payload that does not decode is skipped and counted instead of
//! failing the stream. Other lines and the `[DONE]` sentinel are ignored.

use crate::api::ChatResponse;
use crate::core::constants::{SSE_DATA_PREFIX, SSE_DONE_SENTINEL};
use memchr::memchr;
use tracing::debug;

#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete line, without its `\n` or `\r\n` terminator.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let newline_pos = memchr(b'\n', &self.buffer)?;
        let mut line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    /// Whatever trails the last newline once the body has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buffer);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// A fragment was appended to the accumulated text.
    Appended,
    /// Not a `data: ` line.
    Ignored,
    /// The end-of-stream sentinel.
    Done,
    /// A `data: ` line that did not decode or carried no content.
    Skipped,
}

#[derive(Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    skipped_lines: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// `data: ` payloads that were dropped, not counting the sentinel.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn ingest_bytes(&mut self, line: &[u8]) -> LineOutcome {
        match std::str::from_utf8(line) {
            Ok(text) => self.ingest_line(text),
            Err(err) => {
                debug!(error = %err, "Skipping stream line with invalid UTF-8");
                self.skipped_lines += 1;
                LineOutcome::Skipped
            }
        }
    }

    pub fn ingest_line(&mut self, line: &str) -> LineOutcome {
        let Some(payload) = line.strip_prefix(SSE_DATA_PREFIX) else {
            return LineOutcome::Ignored;
        };
        if payload.trim() == SSE_DONE_SENTINEL {
            return LineOutcome::Done;
        }

        match serde_json::from_str::<ChatResponse>(payload) {
            Ok(response) => match response.into_fragment() {
                Some(fragment) => {
                    self.content.push_str(&fragment);
                    LineOutcome::Appended
                }
                None => {
                    self.skipped_lines += 1;
                    LineOutcome::Skipped
                }
            },
            Err(err) => {
                debug!(error = %err, payload, "Skipping undecodable stream line");
                self.skipped_lines += 1;
                LineOutcome::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> String {
        format!(r#"data: {{"choices":[{{"delta":{{"content":"{content}"}}}}]}}"#)
    }

    #[test]
    fn accumulates_fragments_and_skips_sentinel() {
        let mut acc = StreamAccumulator::new();
        let mut progress = Vec::new();

        for line in [chunk("Hel"), chunk("lo"), "data: [DONE]".to_string()] {
            if acc.ingest_line(&line) == LineOutcome::Appended {
                progress.push(acc.content().to_string());
            }
        }

        assert_eq!(progress, vec!["Hel", "Hello"]);
        assert_eq!(acc.skipped_lines(), 0);
    }

    #[test]
    fn non_data_lines_are_ignored_without_counting() {
        let mut acc = StreamAccumulator::new();
        assert_eq!(acc.ingest_line(""), LineOutcome::Ignored);
        assert_eq!(acc.ingest_line(": keep-alive"), LineOutcome::Ignored);
        assert_eq!(acc.ingest_line("event: ping"), LineOutcome::Ignored);
        // The prefix is literal, including the space.
        assert_eq!(
            acc.ingest_line(r#"data:{"choices":[{"delta":{"content":"x"}}]}"#),
            LineOutcome::Ignored
        );
        assert_eq!(acc.skipped_lines(), 0);
        assert_eq!(acc.content(), "");
    }

    #[test]
    fn malformed_and_empty_payloads_are_counted() {
        let mut acc = StreamAccumulator::new();
        assert_eq!(acc.ingest_line("data: {not json"), LineOutcome::Skipped);
        assert_eq!(
            acc.ingest_line(r#"data: {"choices":[{"delta":{}}]}"#),
            LineOutcome::Skipped
        );
        assert_eq!(acc.ingest_bytes(b"data: \xff\xfe"), LineOutcome::Skipped);
        assert_eq!(acc.ingest_line(&chunk("ok")), LineOutcome::Appended);
        assert_eq!(acc.skipped_lines(), 3);
        assert_eq!(acc.into_content(), "ok");
    }

    #[test]
    fn line_buffer_handles_split_chunks_and_crlf() {
        let mut lines = LineBuffer::new();
        lines.push(b"data: a\r\nda");
        assert_eq!(lines.next_line(), Some(b"data: a".to_vec()));
        assert_eq!(lines.next_line(), None);

        lines.push(b"ta: b\n\ntrailing");
        assert_eq!(lines.next_line(), Some(b"data: b".to_vec()));
        assert_eq!(lines.next_line(), Some(Vec::new()));
        assert_eq!(lines.next_line(), None);
        assert_eq!(lines.finish(), Some(b"trailing".to_vec()));
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn multibyte_characters_split_across_chunks_survive() {
        let line = chunk("héllo");
        let bytes = line.as_bytes();
        let split = line.find('é').expect("has accent") + 1;

        let mut lines = LineBuffer::new();
        let mut acc = StreamAccumulator::new();
        lines.push(&bytes[..split]);
        assert!(lines.next_line().is_none());
        lines.push(&bytes[split..]);
        lines.push(b"\n");

        let complete = lines.next_line().expect("line");
        assert_eq!(acc.ingest_bytes(&complete), LineOutcome::Appended);
        assert_eq!(acc.content(), "héllo");
    }
}
