// Event publisher - multi-producer queue feeding one transmitter

use super::event::ReinitializationEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Event queue is full")]
    Full,
    #[error("Event stream is closed")]
    Closed,
}

/// Create a bounded event queue. The publisher is cloneable; the source is
/// handed to exactly one [`Transmitter`](super::Transmitter).
pub fn event_channel(capacity: usize) -> (EventPublisher, EventSource) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventPublisher { tx }, EventSource { rx })
}

/// Producer handle. The source ends once every publisher is dropped.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<ReinitializationEvent>,
}

impl EventPublisher {
    /// Enqueue an event, waiting for queue capacity.
    pub async fn publish(&self, event: ReinitializationEvent) -> Result<(), PublishError> {
        self.tx.send(event).await.map_err(|_| PublishError::Closed)
    }

    /// Enqueue an event without waiting.
    pub fn try_publish(&self, event: ReinitializationEvent) -> Result<(), PublishError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PublishError::Full,
            mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
        })
    }

    /// True once the source has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the queue.
#[derive(Debug)]
pub struct EventSource {
    rx: mpsc::Receiver<ReinitializationEvent>,
}

impl Stream for EventSource {
    type Item = ReinitializationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
