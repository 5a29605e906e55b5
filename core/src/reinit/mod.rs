//! Reinitialization event stream
//!
//! A one-way, cancellable push channel from the coordinating server to an
//! agent. The server runs one [`Transmitter`] per connection, fed by an
//! [`EventSource`]; the agent drains the stream with a [`Receiver`].

pub mod error;
pub mod event;
pub mod frame;
pub mod publisher;
pub mod receiver;
pub mod transmitter;

pub use error::ReinitStreamError;
pub use event::{ReinitializationEvent, ReinitializeReason};
pub use frame::EVENT_STREAM_CONTENT_TYPE;
pub use publisher::{event_channel, EventPublisher, EventSource, PublishError};
pub use receiver::{Receiver, MAX_LINE_LENGTH};
pub use transmitter::{Transmitter, DEFAULT_HEARTBEAT_INTERVAL};
