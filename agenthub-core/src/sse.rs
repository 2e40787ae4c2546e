//! Server-Sent Events decoding for AgentCore runtime responses.
//!
//! AgentCore streams `text/event-stream` where each `data:` line carries one
//! chunk of agent output, usually as a JSON-escaped string literal. The stream
//! ends with a `data: [DONE]` sentinel.
//!
//! [`LineDecoder`] turns arbitrary byte chunks into complete lines,
//! [`parse_line`] classifies one line, and [`decode_stream`] glues them into a
//! stream of text chunks. Nothing is buffered beyond the current partial line.

use futures::stream::{Stream, StreamExt};

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One classified SSE line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// A `data:` line, already unescaped.
    Data(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Anything else: `event:`, `id:`, `retry:`, comments, blank lines.
    Ignored,
}

/// Classify a single line (without its trailing newline).
pub fn parse_line(line: &str) -> SseLine {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some(payload) = line.strip_prefix("data:") else {
        return SseLine::Ignored;
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == DONE_SENTINEL {
        return SseLine::Done;
    }

    SseLine::Data(unescape_payload(payload))
}

/// Strip one pair of surrounding double quotes and undo `\n`, `\"` and `\\`.
///
/// Other backslash sequences are kept verbatim; payloads are not required to
/// be valid JSON.
pub fn unescape_payload(payload: &str) -> String {
    let inner = if payload.len() >= 2 && payload.starts_with('"') && payload.ends_with('"') {
        &payload[1..payload.len() - 1]
    } else {
        payload
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Reassembles lines from byte chunks that may split lines or UTF-8 sequences.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(String::from_utf8_lossy(&self.pending[start..end]).into_owned());
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Flush a trailing line that had no newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

/// Decode a byte stream into text chunks.
///
/// Stops at `[DONE]` or at the end of the input. A transport error ends the
/// stream with one synthetic chunk produced by `on_error`.
pub fn decode_stream<S, B, E, F>(bytes: S, on_error: F) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Send,
    F: Fn(E) -> String + Send,
{
    async_stream::stream! {
        let mut decoder = LineDecoder::new();
        let mut bytes = std::pin::pin!(bytes);

        while let Some(item) = bytes.next().await {
            match item {
                Ok(chunk) => {
                    for line in decoder.push(chunk.as_ref()) {
                        match parse_line(&line) {
                            SseLine::Data(text) => yield text,
                            SseLine::Done => return,
                            SseLine::Ignored => {}
                        }
                    }
                }
                Err(e) => {
                    yield on_error(e);
                    return;
                }
            }
        }

        if let Some(line) = decoder.finish() {
            if let SseLine::Data(text) = parse_line(&line) {
                yield text;
            }
        }
    }
}

/// Collect all chunks of a decoded stream into one string.
pub async fn collect_text<S>(stream: S) -> String
where
    S: Stream<Item = String>,
{
    stream
        .fold(String::new(), |mut acc, chunk| async move {
            acc.push_str(&chunk);
            acc
        })
        .await
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
