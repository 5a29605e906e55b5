// Agentlink Core - control plane between agents and the coordinating server
//
// Version negotiation, the reinitialization event stream, and per-client
// relay map rewriting. The tunnel data plane lives elsewhere.

pub mod audit;
pub mod config;
pub mod protocol;
pub mod reinit;
pub mod relay;
pub mod session;

pub use config::{ConfigError, ControlPlaneConfig};
pub use protocol::{
    current_supported_versions, negotiate_with_peer, HandshakeError, ProtocolVersion,
    ProtocolVersionList, VersionError, PROTOCOL_VERSIONS_HEADER,
};
pub use reinit::{
    event_channel, EventPublisher, EventSource, ReinitStreamError, ReinitializationEvent,
    ReinitializeReason, Receiver, Transmitter,
};
pub use relay::{AccessUrl, RelayMap, RelayMapCache, RelayNode, RelayRegion};
pub use session::ControlPlane;

/// Install the default `tracing` subscriber, filtered by `RUST_LOG`
/// (default `info`). Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
