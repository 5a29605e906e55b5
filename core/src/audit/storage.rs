// Storage abstraction for audit persistence

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Ordered key-value storage used by the audit sink.
pub trait StorageBackend: Send + Sync {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), String>;
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, String>;
    /// All entries under `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, String>;
    fn count_prefix(&self, prefix: &[u8]) -> Result<usize, String>;
    fn flush(&self) -> Result<(), String>;
}

/// In-memory storage useful for testing
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), String> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, String> {
        Ok(self.data.read().get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, String> {
        Ok(self
            .data
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn count_prefix(&self, prefix: &[u8]) -> Result<usize, String> {
        Ok(self
            .data
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .count())
    }

    fn flush(&self) -> Result<(), String> {
        Ok(())
    }
}

/// sled-backed persistent storage
pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    pub fn new(path: &str) -> std::result::Result<Self, String> {
        let db = sled::open(path).map_err(|e| e.to_string())?;
        Ok(Self { db })
    }
}

impl StorageBackend for SledStorage {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), String> {
        self.db.insert(key, value).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, String> {
        let value = self.db.get(key).map_err(|e| e.to_string())?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, String> {
        let mut results = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (k, v) = item.map_err(|e| e.to_string())?;
            results.push((k.to_vec(), v.to_vec()));
        }
        Ok(results)
    }

    fn count_prefix(&self, prefix: &[u8]) -> Result<usize, String> {
        self.db
            .scan_prefix(prefix)
            .try_fold(0, |count, item| item.map(|_| count + 1))
            .map_err(|e| e.to_string())
    }

    fn flush(&self) -> Result<(), String> {
        self.db.flush().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn StorageBackend) {
        storage.put(b"a_2", b"two").unwrap();
        storage.put(b"a_1", b"one").unwrap();
        storage.put(b"b_1", b"other").unwrap();

        assert_eq!(storage.get(b"a_1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(storage.get(b"missing").unwrap(), None);
        assert_eq!(storage.count_prefix(b"a_").unwrap(), 2);

        let keys: Vec<_> = storage
            .scan_prefix(b"a_")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"a_1".to_vec(), b"a_2".to_vec()]);
        storage.flush().unwrap();
    }

    #[test]
    fn test_memory_storage() {
        exercise(&MemoryStorage::new());
    }

    #[test]
    fn test_sled_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SledStorage::new(dir.path().join("db").to_str().unwrap()).unwrap();
        exercise(&storage);
    }

    #[test]
    fn test_sled_count_matches_scan_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let storage = SledStorage::new(path.to_str().unwrap()).unwrap();
            for i in 0..5 {
                storage.put(format!("audit_{}", i).as_bytes(), b"{}").unwrap();
            }
            storage.put(b"other", b"{}").unwrap();
            storage.flush().unwrap();
        }

        let storage = SledStorage::new(path.to_str().unwrap()).unwrap();
        let scanned = storage.scan_prefix(b"audit_").unwrap().len();
        assert_eq!(storage.count_prefix(b"audit_").unwrap(), scanned);
        assert_eq!(scanned, 5);
    }
}
