// Audit export - write audit entries to one or more backends
//
// Export is a plain write sink: one attempt per call, failures are returned
// to the caller and never retried here.

use super::storage::StorageBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

const AUDIT_PREFIX: &[u8] = b"audit_";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit export canceled")]
    Canceled,
    #[error("Audit storage error: {0}")]
    Storage(String),
    #[error("Audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// DATA TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Write,
    Delete,
    Start,
    Stop,
    Login,
    Logout,
}

/// One audited action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    /// Unix timestamp in seconds
    pub time: u64,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: Uuid,
    pub status_code: u16,
    #[serde(default)]
    pub additional_fields: serde_json::Value,
}

impl AuditLog {
    /// An entry with fresh identifiers, for tests and fixtures.
    pub fn random() -> Self {
        Self {
            id: Uuid::new_v4(),
            time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            user_id: Uuid::new_v4(),
            action: AuditAction::Write,
            resource_type: "workspace".to_string(),
            resource_id: Uuid::new_v4(),
            status_code: 200,
            additional_fields: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status_code >= 400
    }
}

/// Per-call context a backend may use, e.g. for enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendDetails {
    pub actor_name: Option<String>,
}

/// Which entries a backend wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDecision {
    All,
    FailuresOnly,
}

impl ExportDecision {
    pub fn wants(&self, entry: &AuditLog) -> bool {
        match self {
            ExportDecision::All => true,
            ExportDecision::FailuresOnly => entry.is_failure(),
        }
    }
}

// ============================================================================
// BACKENDS
// ============================================================================

#[async_trait]
pub trait AuditBackend: Send + Sync {
    fn decision(&self) -> ExportDecision;

    async fn export(
        &self,
        ctx: &CancellationToken,
        entry: &AuditLog,
        details: &BackendDetails,
    ) -> Result<(), AuditError>;
}

/// Persists entries as JSON into a [`StorageBackend`], in export order.
pub struct StoreAuditBackend {
    storage: Arc<dyn StorageBackend>,
    decision: ExportDecision,
    next_seq: AtomicU64,
}

impl StoreAuditBackend {
    pub fn new(storage: Arc<dyn StorageBackend>, decision: ExportDecision) -> Result<Self, AuditError> {
        let existing = storage
            .count_prefix(AUDIT_PREFIX)
            .map_err(AuditError::Storage)?;
        Ok(Self {
            storage,
            decision,
            next_seq: AtomicU64::new(existing as u64),
        })
    }

    /// Up to `limit` entries, newest first, skipping the `offset` newest.
    pub fn logs_offset(&self, offset: usize, limit: usize) -> Result<Vec<AuditLog>, AuditError> {
        let entries = self
            .storage
            .scan_prefix(AUDIT_PREFIX)
            .map_err(AuditError::Storage)?;
        entries
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .map(|(_, value)| serde_json::from_slice(value).map_err(AuditError::from))
            .collect()
    }

    fn key_for(seq: u64) -> Vec<u8> {
        let mut key = AUDIT_PREFIX.to_vec();
        key.extend_from_slice(format!("{:020}", seq).as_bytes());
        key
    }
}

#[async_trait]
impl AuditBackend for StoreAuditBackend {
    fn decision(&self) -> ExportDecision {
        self.decision
    }

    async fn export(
        &self,
        ctx: &CancellationToken,
        entry: &AuditLog,
        details: &BackendDetails,
    ) -> Result<(), AuditError> {
        if ctx.is_cancelled() {
            return Err(AuditError::Canceled);
        }

        let value = serde_json::to_vec(entry)?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.storage
            .put(&Self::key_for(seq), &value)
            .map_err(AuditError::Storage)?;
        self.storage.flush().map_err(AuditError::Storage)?;

        debug!(
            id = %entry.id,
            actor = details.actor_name.as_deref().unwrap_or("-"),
            "Exported audit entry"
        );
        Ok(())
    }
}

/// Offer `entry` to every backend that wants it. All backends are tried;
/// the first failure is returned.
pub async fn export_to_all(
    backends: &[Arc<dyn AuditBackend>],
    ctx: &CancellationToken,
    entry: &AuditLog,
    details: &BackendDetails,
) -> Result<(), AuditError> {
    let mut first_error = None;
    for backend in backends {
        if !backend.decision().wants(entry) {
            continue;
        }
        if let Err(e) = backend.export(ctx, entry, details).await {
            warn!(id = %entry.id, "Audit export failed: {}", e);
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
