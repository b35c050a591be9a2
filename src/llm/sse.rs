/// One decoded `data:` line of an OpenAI-compatible stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseData {
    Delta(String),
    Done,
}

/// Splits a chunked byte stream into lines and decodes content deltas.
///
/// Bytes are buffered until a newline so multi-byte characters split across
/// chunks survive.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseData> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = decode_line(&String::from_utf8_lossy(&line)) {
                out.push(data);
            }
        }
        out
    }

    /// Decode a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Option<SseData> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&String::from_utf8_lossy(&rest))
    }
}

fn decode_line(line: &str) -> Option<SseData> {
    let line = line.trim();
    let payload = line.strip_prefix("data:")?.trim_start();
    if payload == "[DONE]" {
        return Some(SseData::Done);
    }
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Skipping undecodable stream line: {}", e);
            return None;
        }
    };
    value["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| SseData::Delta(s.to_string()))
}
