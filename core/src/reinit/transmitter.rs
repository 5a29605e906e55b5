// Transmitter - server side of the reinitialization event stream
//
// Owns the write side of one connection. Drains an event source, writing
// and flushing one frame per event, until the source closes, the caller
// cancels, the peer disconnects, or a write fails.

use super::error::ReinitStreamError;
use super::event::ReinitializationEvent;
use super::frame::{encode_event, PING_FRAME};
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default spacing of keepalive frames.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

pub struct Transmitter<W> {
    writer: W,
    /// Cancelled by the transport when the peer goes away.
    peer_closed: CancellationToken,
    heartbeat_interval: Option<Duration>,
    frames_sent: u64,
}

impl<W> Transmitter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W, peer_closed: CancellationToken) -> Self {
        Self {
            writer,
            peer_closed,
            heartbeat_interval: Some(DEFAULT_HEARTBEAT_INTERVAL),
            frames_sent: 0,
        }
    }

    /// Set the keepalive spacing. `None` disables keepalives.
    pub fn with_heartbeat(mut self, interval: Option<Duration>) -> Self {
        self.heartbeat_interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Stream events from `source` to the peer.
    ///
    /// Returns `Ok(())` once the source is exhausted. Consumes the
    /// transmitter; the write side is released on every exit path.
    pub async fn transmit<S>(
        mut self,
        ctx: &CancellationToken,
        mut source: S,
    ) -> Result<(), ReinitStreamError>
    where
        S: Stream<Item = ReinitializationEvent> + Unpin,
    {
        let result = self.run(ctx, &mut source).await;

        match &result {
            Ok(()) => {
                info!(frames = self.frames_sent, "Event source closed, ending stream");
                let peer_closed = self.peer_closed.clone();
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {}
                    _ = peer_closed.cancelled() => {}
                    shutdown = self.writer.shutdown() => {
                        if let Err(e) = shutdown {
                            debug!("Failed to shut down event stream writer: {}", e);
                        }
                    }
                }
            }
            Err(ReinitStreamError::Canceled) => {
                debug!(frames = self.frames_sent, "Event stream canceled");
            }
            Err(e) => {
                warn!(frames = self.frames_sent, "Event stream ended: {}", e);
            }
        }
        result
    }

    async fn run<S>(&mut self, ctx: &CancellationToken, source: &mut S) -> Result<(), ReinitStreamError>
    where
        S: Stream<Item = ReinitializationEvent> + Unpin,
    {
        let mut heartbeat = self.heartbeat_interval.map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(ReinitStreamError::Canceled),
                _ = self.peer_closed.cancelled() => return Err(ReinitStreamError::PeerDisconnected),
                next = source.next() => match next {
                    Some(event) => {
                        let frame = encode_event(&event)?;
                        self.send(ctx, &frame).await?;
                        debug!(
                            workspace_id = %event.workspace_id,
                            reason = %event.reason,
                            "Sent reinitialization event"
                        );
                    }
                    None => return Ok(()),
                },
                _ = next_tick(&mut heartbeat) => {
                    self.send(ctx, PING_FRAME).await?;
                }
            }
        }
    }

    /// Write one frame, giving up as soon as either token fires. A peer
    /// that stops reading must not pin the write side.
    async fn send(&mut self, ctx: &CancellationToken, frame: &[u8]) -> Result<(), ReinitStreamError> {
        let peer_closed = self.peer_closed.clone();
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ReinitStreamError::Canceled),
            _ = peer_closed.cancelled() => Err(ReinitStreamError::PeerDisconnected),
            result = self.write_frame(frame) => result,
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), ReinitStreamError> {
        self.writer.write_all(frame).await?;
        self.writer.flush().await?;
        self.frames_sent += 1;
        Ok(())
    }
}

async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
