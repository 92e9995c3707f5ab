/// Incremental Server-Sent Events decoder. Bytes go in as they arrive, and
/// complete `data` payloads come out in order.
///
/// CRLF, LF and bare CR line endings are all accepted, mixed freely.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Last pushed byte was a CR whose LF may still arrive in the next chunk.
    pending_cr: bool,
}

impl SseDecoder {
    /// Buffers `chunk` with every line ending rewritten to LF.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.reserve(chunk.len());
        for &byte in chunk {
            if std::mem::take(&mut self.pending_cr) && byte == b'\n' {
                continue;
            }
            if byte == b'\r' {
                self.buffer.push(b'\n');
                self.pending_cr = true;
            } else {
                self.buffer.push(byte);
            }
        }
    }

    /// Next complete event carrying data. Comment-only and empty events are
    /// skipped.
    pub fn next_payload(&mut self) -> Option<String> {
        loop {
            let end = self.buffer.windows(2).position(|w| w == b"\n\n")?;
            let raw: Vec<u8> = self.buffer.drain(..end + 2).take(end).collect();
            let text = String::from_utf8_lossy(&raw);
            if let Some(data) = event_data(&text) {
                return Some(data);
            }
        }
    }
}

fn event_data(event: &str) -> Option<String> {
    let mut lines = Vec::new();
    for line in event.split('\n') {
        if let Some(rest) = line.strip_prefix("data:") {
            lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        } else if line == "data" {
            lines.push("");
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
