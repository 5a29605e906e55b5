// Version handshake - agree on a protocol version before any event flows
//
// Both sides send their supported list in the `Agent-Protocol-Versions`
// header. The receiving side parses the peer's list and negotiates it
// against its own.

use super::version::{ProtocolVersion, ProtocolVersionList, VersionError};
use thiserror::Error;
use tracing::{debug, warn};

/// Header carrying a peer's comma-separated version advertisement.
pub const PROTOCOL_VERSIONS_HEADER: &str = "Agent-Protocol-Versions";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("Invalid version advertisement: {0}")]
    InvalidAdvertisement(#[from] VersionError),
    #[error("No compatible protocol version (local {local}, peer {peer})")]
    Incompatible {
        local: ProtocolVersionList,
        peer: ProtocolVersionList,
    },
}

/// Negotiate `local` against the raw advertisement received from a peer.
pub fn negotiate_with_peer(
    local: &ProtocolVersionList,
    peer_advertisement: &str,
) -> Result<ProtocolVersion, HandshakeError> {
    let peer = ProtocolVersionList::parse(peer_advertisement.trim()).map_err(|e| {
        warn!("Rejecting peer version advertisement {:?}: {}", peer_advertisement, e);
        e
    })?;

    match local.negotiate(&peer) {
        Some(version) => {
            debug!(local = %local, peer = %peer, negotiated = %version, "Negotiated protocol version");
            Ok(version)
        }
        None => {
            warn!(local = %local, peer = %peer, "No compatible protocol version");
            Err(HandshakeError::Incompatible {
                local: local.clone(),
                peer,
            })
        }
    }
}
