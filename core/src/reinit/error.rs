// Error types for the reinitialization event stream

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReinitStreamError {
    /// The caller's cancellation token fired.
    #[error("Operation canceled")]
    Canceled,
    /// The peer closed the stream cleanly; no more events will arrive.
    #[error("End of event stream")]
    EndOfStream,
    /// The peer sent a frame that could not be decoded.
    #[error("Malformed event frame: {0}")]
    Decode(String),
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Stream I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Peer disconnected")]
    PeerDisconnected,
}

impl ReinitStreamError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, ReinitStreamError::Canceled)
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReinitStreamError::EndOfStream)
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, ReinitStreamError::Decode(_))
    }
}
