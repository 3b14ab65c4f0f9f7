//! Server-sent event framing.
//!
//! Network chunks split SSE lines arbitrarily; the decoder buffers bytes and
//! yields the `data:` payload of every complete event.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the payloads of events completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            // Only whole lines are decoded; a multi-byte character can straddle chunks.
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }

            if line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                self.data.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        events
    }

    /// Payload of a trailing event the server did not terminate with a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if self.data.is_empty() {
            None
        } else {
            let payload = self.data.join("\n");
            self.data.clear();
            Some(payload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ping\ndata: {\"type\":").is_empty());
        let events = decoder.push(b"\"ping\"}\n\n");
        assert_eq!(events, vec![r#"{"type":"ping"}"#]);
    }

    #[test]
    fn test_multiple_events_and_comments() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\n\ndata: a\n\ndata:b\r\n\r\n");
        assert_eq!(events, vec!["a", "b"]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let payload = "data: {\"t\":\"★\"}\n\n".as_bytes();
        let star = payload.iter().position(|&b| b == 0xE2).unwrap();

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&payload[..=star]).is_empty());
        let events = decoder.push(&payload[star + 1..]);
        assert_eq!(events, vec![r#"{"t":"★"}"#]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail\n").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert_eq!(decoder.finish(), None);
    }
}
