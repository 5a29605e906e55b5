// Control plane - per-process state shared by every client connection
//
// Holds the immutable supported-version list, the relay map cache and the
// audit backends, and builds the per-connection pieces from them.

use crate::audit::{
    export_to_all, AuditBackend, AuditError, AuditLog, BackendDetails, ExportDecision,
    MemoryStorage, SledStorage, StorageBackend, StoreAuditBackend,
};
use crate::config::{ConfigError, ControlPlaneConfig};
use crate::protocol::{negotiate_with_peer, HandshakeError, ProtocolVersion, ProtocolVersionList};
use crate::reinit::{event_channel, EventPublisher, EventSource, Transmitter};
use crate::relay::{AccessUrl, RelayMap, RelayMapCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct ControlPlane {
    supported: ProtocolVersionList,
    heartbeat_interval: Option<Duration>,
    event_queue_capacity: usize,
    relays: RelayMapCache,
    audit_backends: Vec<Arc<dyn AuditBackend>>,
}

impl ControlPlane {
    /// Build from a validated config. Opens the audit store if one is set.
    pub fn from_config(config: &ControlPlaneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let supported = config.supported_version_list()?;

        let storage: Arc<dyn StorageBackend> = match &config.audit_store_path {
            Some(path) => Arc::new(SledStorage::new(path).map_err(ConfigError::Invalid)?),
            None => Arc::new(MemoryStorage::new()),
        };
        let audit = StoreAuditBackend::new(storage, ExportDecision::All)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        info!(versions = %supported, "Control plane configured");

        Ok(Self {
            supported,
            heartbeat_interval: config.heartbeat_interval(),
            event_queue_capacity: config.event_queue_capacity,
            relays: RelayMapCache::default(),
            audit_backends: vec![Arc::new(audit)],
        })
    }

    pub fn supported_versions(&self) -> &ProtocolVersionList {
        &self.supported
    }

    /// Value for our own version advertisement header.
    pub fn advertisement(&self) -> String {
        self.supported.to_string()
    }

    /// Agree on a version with a peer from its advertisement header.
    pub fn negotiate(&self, peer_advertisement: &str) -> Result<ProtocolVersion, HandshakeError> {
        negotiate_with_peer(&self.supported, peer_advertisement)
    }

    /// A fresh event queue for one connection.
    pub fn event_channel(&self) -> (EventPublisher, EventSource) {
        event_channel(self.event_queue_capacity)
    }

    /// A transmitter for one connection's write side.
    pub fn transmitter<W>(&self, writer: W, peer_closed: CancellationToken) -> Transmitter<W>
    where
        W: AsyncWrite + Unpin,
    {
        Transmitter::new(writer, peer_closed).with_heartbeat(self.heartbeat_interval)
    }

    pub fn relays(&self) -> &RelayMapCache {
        &self.relays
    }

    /// The relay map as the client at `access` must see it.
    pub fn relay_map_for(&self, access: &AccessUrl) -> RelayMap {
        self.relays.map_for_client(access)
    }

    pub fn add_audit_backend(&mut self, backend: Arc<dyn AuditBackend>) {
        self.audit_backends.push(backend);
    }

    pub async fn audit(
        &self,
        ctx: &CancellationToken,
        entry: &AuditLog,
        details: &BackendDetails,
    ) -> Result<(), AuditError> {
        export_to_all(&self.audit_backends, ctx, entry, details).await
    }
}
