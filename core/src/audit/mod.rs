// Audit module - export sink for audit entries

pub mod export;
pub mod storage;

pub use export::{
    export_to_all, AuditAction, AuditBackend, AuditError, AuditLog, BackendDetails,
    ExportDecision, StoreAuditBackend,
};
pub use storage::{MemoryStorage, SledStorage, StorageBackend};
