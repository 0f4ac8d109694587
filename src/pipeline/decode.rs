//! Incremental byte -> SSE line decoding
//!
//! Upstream bodies arrive in arbitrary chunks: a multi-byte character or an
//! SSE line may be split across reads. Both decoders here keep the incomplete
//! tail and only hand back what is complete.

/// Decodes UTF-8 across chunk boundaries.
///
/// A sequence cut at the end of a chunk is held back until the next chunk
/// completes it. Bytes that can never be valid are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // incomplete sequence at the end, wait for more bytes
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is still held back at end of stream.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Splits decoded text into complete lines, retaining the trailing fragment.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    utf8: Utf8Decoder,
    buffer: String,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read; returns every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        self.buffer.push_str(&text);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);
            lines.push(line);
        }
        lines
    }

    /// The unterminated last line, if the stream ended without a newline.
    pub fn finish(&mut self) -> Option<String> {
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim_end_matches('\r');
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

/// Sentinel payload that ends an OpenAI-style event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Meaning of one SSE line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// `data:` line with its payload (prefix and surrounding whitespace removed).
    Data(&'a str),
    /// `data: [DONE]`
    Done,
    /// Blank lines, comments, `event:`/`id:` fields.
    Ignored,
}

pub fn classify_line(line: &str) -> SseLine<'_> {
    let Some(payload) = line.strip_prefix("data:") else {
        return SseLine::Ignored;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        SseLine::Done
    } else if payload.is_empty() {
        SseLine::Ignored
    } else {
        SseLine::Data(payload)
    }
}
