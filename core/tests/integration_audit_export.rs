// Integration tests for the sled-backed audit export sink

use agentlink_core::audit::{
    AuditBackend, AuditLog, BackendDetails, ExportDecision, SledStorage, StoreAuditBackend,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_sled_backend_export() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("audit");
    let path = path.to_str().expect("utf-8 temp path");

    let ctx = CancellationToken::new();
    let entry = AuditLog::random();
    {
        let storage = Arc::new(SledStorage::new(path).map_err(anyhow::Error::msg)?);
        let backend = StoreAuditBackend::new(storage, ExportDecision::All)?;
        backend
            .export(
                &ctx,
                &entry,
                &BackendDetails {
                    actor_name: Some("admin".to_string()),
                },
            )
            .await?;

        let got = backend.logs_offset(0, 1)?;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, entry.id);
    }

    // Entries survive reopening, and new ones sort after them.
    let storage = Arc::new(SledStorage::new(path).map_err(anyhow::Error::msg)?);
    let backend = StoreAuditBackend::new(storage, ExportDecision::All)?;
    let newer = AuditLog::random();
    backend.export(&ctx, &newer, &BackendDetails::default()).await?;

    let got = backend.logs_offset(0, 10)?;
    assert_eq!(got.iter().map(|e| e.id).collect::<Vec<_>>(), vec![newer.id, entry.id]);
    Ok(())
}
