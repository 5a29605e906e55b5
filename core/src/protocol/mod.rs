// Protocol module - version advertisement and negotiation

pub mod handshake;
pub mod version;

pub use handshake::{negotiate_with_peer, HandshakeError, PROTOCOL_VERSIONS_HEADER};
pub use version::{
    current_supported_versions, ProtocolVersion, ProtocolVersionList, VersionError,
};
