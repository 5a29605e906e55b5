// Receiver - agent side of the reinitialization event stream

use super::error::ReinitStreamError;
use super::event::ReinitializationEvent;
use super::frame::{Frame, FrameDecoder};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Longest line accepted from the peer, terminator included.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Reads reinitialization events off a byte stream, one per `receive` call.
///
/// Partially read lines survive a canceled `receive`, so the next call picks
/// up where the previous one stopped.
pub struct Receiver<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    decoder: FrameDecoder,
}

impl<R> Receiver<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::new(),
            decoder: FrameDecoder::new(),
        }
    }

    /// Wait for the next event.
    ///
    /// An already-cancelled `ctx` returns [`ReinitStreamError::Canceled`]
    /// without touching the stream. A clean close by the peer returns
    /// [`ReinitStreamError::EndOfStream`].
    pub async fn receive(
        &mut self,
        ctx: &CancellationToken,
    ) -> Result<ReinitializationEvent, ReinitStreamError> {
        if ctx.is_cancelled() {
            return Err(ReinitStreamError::Canceled);
        }

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ReinitStreamError::Canceled),
            result = self.next_event() => result,
        }
    }

    async fn next_event(&mut self) -> Result<ReinitializationEvent, ReinitStreamError> {
        loop {
            // Stays >= 1: an over-long line is rejected below before looping.
            let limit = (MAX_LINE_LENGTH + 1 - self.line.len()) as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.line)
                .await?;
            if read == 0 {
                if !self.line.is_empty() || self.decoder.has_partial_frame() {
                    self.line.clear();
                    warn!("Event stream closed in the middle of a frame");
                    return Err(ReinitStreamError::Decode(
                        "stream ended mid-frame".to_string(),
                    ));
                }
                return Err(ReinitStreamError::EndOfStream);
            }
            if !self.line.ends_with(b"\n") && self.line.len() > MAX_LINE_LENGTH {
                self.line.clear();
                self.decoder = FrameDecoder::new();
                warn!(limit = MAX_LINE_LENGTH, "Event stream line too long");
                return Err(ReinitStreamError::Decode("line too long".to_string()));
            }
            if !self.line.ends_with(b"\n") {
                // Unterminated line; the next read reports EOF.
                continue;
            }

            let line = std::mem::take(&mut self.line);
            let text = match std::str::from_utf8(&line) {
                Ok(text) => text,
                Err(_) => {
                    self.decoder = FrameDecoder::new();
                    return Err(ReinitStreamError::Decode(
                        "frame is not valid UTF-8".to_string(),
                    ));
                }
            };

            match self.decoder.push_line(text) {
                Ok(None) => continue,
                Ok(Some(Frame::Ping)) => {
                    trace!("Received keepalive");
                    continue;
                }
                Ok(Some(Frame::Data(payload))) => {
                    return serde_json::from_str(&payload).map_err(|e| {
                        warn!("Undecodable reinitialization event: {}", e);
                        ReinitStreamError::Decode(format!("invalid event payload: {}", e))
                    });
                }
                Err(e) => {
                    warn!("Malformed event frame: {}", e);
                    return Err(e);
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}
