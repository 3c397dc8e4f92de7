//! Incremental event-stream frame decoder.
//!
//! The upstream streams its reply as newline-separated frames of the form
//! `data: <json>`, terminated by `data: [DONE]`. Network reads land on
//! arbitrary byte boundaries, so the decoder keeps the trailing partial
//! line (as raw bytes, which also keeps split UTF-8 sequences intact)
//! between calls.

use serde::Deserialize;

const EVENT_MARKER: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Decoder state carried between successive reads of one response body.
///
/// Guarantees no data loss across chunk boundaries and at most one line
/// of latency per call: splitting the same byte sequence at any offset
/// over multiple `decode` calls yields the same delta sequence as one
/// call. Once the termination sentinel has been seen, no further deltas
/// are emitted.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    carry: Vec<u8>,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the termination sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feeds one chunk of the response body and returns the content
    /// deltas completed by it, in transmission order.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }
        self.carry.extend_from_slice(chunk);

        while let Some(newline) = self.carry.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.carry.drain(..=newline).collect();
            if self.done {
                continue;
            }
            if let Some(delta) = self.decode_line(&line) {
                deltas.push(delta);
            }
        }
        deltas
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<String> {
        let Ok(line) = std::str::from_utf8(line) else {
            tracing::warn!("skipping non-UTF-8 stream line");
            return None;
        };
        let payload = line.trim().strip_prefix(EVENT_MARKER)?.trim();
        if payload == DONE_SENTINEL {
            self.done = true;
            return None;
        }
        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => event
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|content| !content.is_empty()),
            Err(err) => {
                // A single malformed frame never aborts the stream.
                tracing::warn!(%err, payload, "dropping malformed stream event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(content: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n")
    }

    fn stream(parts: &[&str]) -> Vec<u8> {
        let mut raw = String::new();
        for part in parts {
            raw.push_str(&event(part));
        }
        raw.push_str("data: [DONE]\n");
        raw.into_bytes()
    }

    #[test]
    fn decodes_a_whole_stream_in_one_call() {
        let mut decoder = FrameDecoder::new();
        let deltas = decoder.decode(&stream(&["Hello", ", ", "world"]));
        assert_eq!(deltas, vec!["Hello", ", ", "world"]);
        assert!(decoder.is_done());
    }

    #[test]
    fn split_at_any_byte_offset_yields_the_same_deltas() {
        let raw = stream(&["alpha", "beta", "gamma"]);
        let mut whole = FrameDecoder::new();
        let expected = whole.decode(&raw);

        for split in 0..=raw.len() {
            let mut decoder = FrameDecoder::new();
            let mut deltas = decoder.decode(&raw[..split]);
            deltas.extend(decoder.decode(&raw[split..]));
            assert_eq!(deltas, expected, "split at byte {split}");
        }
    }

    #[test]
    fn partial_line_is_carried_until_its_newline_arrives() {
        let mut decoder = FrameDecoder::new();
        let raw = event("carried");
        let (head, tail) = raw.as_bytes().split_at(raw.len() - 5);

        assert!(decoder.decode(head).is_empty());
        assert_eq!(decoder.decode(tail), vec!["carried"]);
    }

    #[test]
    fn multibyte_utf8_split_across_chunks_survives() {
        let raw = event("héllo…");
        // Split in the middle of the two-byte 'é'.
        let split = raw.find('é').unwrap() + 1;
        let mut decoder = FrameDecoder::new();
        let mut deltas = decoder.decode(&raw.as_bytes()[..split]);
        deltas.extend(decoder.decode(&raw.as_bytes()[split..]));
        assert_eq!(deltas, vec!["héllo…"]);
    }

    #[test]
    fn done_sentinel_emits_nothing_and_ends_emission() {
        let mut decoder = FrameDecoder::new();
        let mut raw = event("before");
        raw.push_str("data: [DONE]\n");
        raw.push_str(&event("after"));

        assert_eq!(decoder.decode(raw.as_bytes()), vec!["before"]);
        assert!(decoder.is_done());
        assert!(decoder.decode(event("later").as_bytes()).is_empty());
    }

    #[test]
    fn malformed_json_line_is_swallowed() {
        let mut decoder = FrameDecoder::new();
        let raw = format!("data: {{not json\n{}", event("ok"));
        assert_eq!(decoder.decode(raw.as_bytes()), vec!["ok"]);
    }

    #[test]
    fn event_without_delta_content_yields_nothing() {
        let mut decoder = FrameDecoder::new();
        let raw = "data: {\"choices\":[{\"delta\":{}}]}\ndata: {\"choices\":[]}\n";
        assert!(decoder.decode(raw.as_bytes()).is_empty());
    }

    #[test]
    fn non_event_lines_are_ignored() {
        let mut decoder = FrameDecoder::new();
        let raw = format!(": keep-alive\n\n{}", event("ok"));
        assert_eq!(decoder.decode(raw.as_bytes()), vec!["ok"]);
    }
}
