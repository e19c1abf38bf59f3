use bytes::BytesMut;
use engine_logging::engine_trace;
use serde_json::Value;

/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Text reassembled from a newline-delimited chat response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamedAnswer {
    pub text: String,
    /// A record carried `"done": true`.
    pub completed: bool,
    /// Non-blank lines that were not valid JSON.
    pub skipped_lines: usize,
}

/// Incremental parser for newline-delimited JSON chat fragments.
///
/// Bytes may arrive split anywhere; only complete lines are parsed. Lines that
/// are not JSON, or that grow past [`MAX_LINE_BYTES`], are skipped. Once a
/// record reports `done`, everything after it is ignored.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    pending: BytesMut,
    /// Dropping the rest of an over-long line up to its newline.
    discarding: bool,
    answer: StreamedAnswer,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next chunk of the body. Returns true once the stream is done.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        if self.answer.completed {
            return true;
        }
        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line = self.pending.split_to(pos + 1);
            if self.discarding {
                self.discarding = false;
                continue;
            }
            self.consume_line(&line[..pos]);
            if self.answer.completed {
                self.pending.clear();
                return true;
            }
        }
        if self.pending.len() > MAX_LINE_BYTES {
            if !self.discarding {
                engine_trace!("Skipping stream line longer than {} bytes", MAX_LINE_BYTES);
                self.answer.skipped_lines += 1;
                self.discarding = true;
            }
            self.pending.clear();
        }
        false
    }

    pub fn is_done(&self) -> bool {
        self.answer.completed
    }

    /// Flushes a trailing line without a newline and returns the answer.
    pub fn finish(mut self) -> StreamedAnswer {
        if !self.answer.completed && !self.discarding && !self.pending.is_empty() {
            let rest = self.pending.split();
            self.consume_line(&rest);
        }
        self.answer
    }

    fn consume_line(&mut self, raw: &[u8]) {
        let Ok(line) = std::str::from_utf8(raw) else {
            self.answer.skipped_lines += 1;
            return;
        };
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let record: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                engine_trace!("Skipping unparsable stream line: {}", err);
                self.answer.skipped_lines += 1;
                return;
            }
        };
        if let Some(content) = record
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
        {
            self.answer.text.push_str(content);
        }
        if record.get("done").and_then(Value::as_bool) == Some(true) {
            self.answer.completed = true;
        }
    }
}

/// Reassembles a complete response body in one go.
pub fn assemble_response(body: &str) -> StreamedAnswer {
    let mut assembler = ResponseAssembler::new();
    assembler.feed(body.as_bytes());
    assembler.finish()
}
