// Event-stream framing
//
// One frame per event, in server-sent-events layout:
//
//   event: data
//   data: {"workspace_id":"...","reason":"prebuild_claimed"}
//   <blank line>
//
// Keepalives are `event: ping` frames with no data.

use super::error::ReinitStreamError;
use super::event::ReinitializationEvent;

/// Content type of a response carrying the event stream.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Keepalive frame.
pub const PING_FRAME: &[u8] = b"event: ping\n\n";

const EVENT_TYPE_DATA: &str = "data";
const EVENT_TYPE_PING: &str = "ping";

/// Encode one event as a complete frame.
pub fn encode_event(event: &ReinitializationEvent) -> Result<Vec<u8>, ReinitStreamError> {
    let payload = serde_json::to_string(event)?;
    let mut frame = Vec::with_capacity(payload.len() + 24);
    frame.extend_from_slice(b"event: ");
    frame.extend_from_slice(EVENT_TYPE_DATA.as_bytes());
    frame.extend_from_slice(b"\ndata: ");
    frame.extend_from_slice(payload.as_bytes());
    frame.extend_from_slice(b"\n\n");
    Ok(frame)
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// JSON payload of a data frame.
    Data(String),
    Ping,
}

/// Line-at-a-time frame decoder. Holds the fields of the frame being read.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    event_type: Option<String>,
    data: Vec<String>,
    in_frame: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while some fields of an unterminated frame have been read.
    pub fn has_partial_frame(&self) -> bool {
        self.in_frame
    }

    /// Feed one line (with or without its line terminator). Returns a frame
    /// when the line completes one.
    pub fn push_line(&mut self, line: &str) -> Result<Option<Frame>, ReinitStreamError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            if !self.in_frame {
                return Ok(None);
            }
            return self.dispatch().map(Some);
        }

        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => {
                self.event_type = Some(value.to_string());
                self.in_frame = true;
            }
            "data" => {
                self.data.push(value.to_string());
                self.in_frame = true;
            }
            // Unused by this stream.
            _ => {}
        }
        Ok(None)
    }

    fn dispatch(&mut self) -> Result<Frame, ReinitStreamError> {
        let event_type = self.event_type.take();
        let data = std::mem::take(&mut self.data);
        self.in_frame = false;

        match event_type.as_deref().unwrap_or(EVENT_TYPE_DATA) {
            EVENT_TYPE_DATA if data.is_empty() => Err(ReinitStreamError::Decode(
                "data frame without payload".to_string(),
            )),
            EVENT_TYPE_DATA => Ok(Frame::Data(data.join("\n"))),
            EVENT_TYPE_PING => Ok(Frame::Ping),
            other => Err(ReinitStreamError::Decode(format!(
                "unknown event type {:?}",
                other
            ))),
        }
    }
}
