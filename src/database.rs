use crate::config::StorageConfig;
use crate::storage::buffer::BufferPoolManager;
use crate::storage::disk::{BlockStore, FileManager};
use crate::storage::error::StorageResult;
use crate::storage::wal::LogManager;
use log::info;
use std::sync::Arc;

/// Wires the block store, log and buffer pool together for one data directory.
pub struct Database {
    file_manager: Arc<FileManager>,
    log_manager: Arc<LogManager>,
    buffer_pool: BufferPoolManager,
}

impl Database {
    /// Opens the database in `config.data_dir`, creating it if needed.
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let file_manager = Arc::new(FileManager::open(&config.data_dir, config.block_size)?);
        if file_manager.is_new() {
            info!("Creating new database at {}", config.data_dir.display());
        } else {
            info!("Opening existing database at {}", config.data_dir.display());
        }

        let store: Arc<dyn BlockStore> = file_manager.clone();
        let log_manager = Arc::new(LogManager::new(store.clone(), config.log_file.clone())?);
        let buffer_pool = BufferPoolManager::new(
            store,
            log_manager.clone(),
            config.pool_size,
            config.replacement,
            config.max_pin_wait,
        );

        Ok(Self {
            file_manager,
            log_manager,
            buffer_pool,
        })
    }

    pub fn is_new(&self) -> bool {
        self.file_manager.is_new()
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.file_manager
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.log_manager
    }

    pub fn buffer_pool(&self) -> &BufferPoolManager {
        &self.buffer_pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_id::BlockId;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_open_new_then_existing() -> Result<()> {
        let dir = tempdir()?;
        let config = StorageConfig {
            pool_size: 3,
            ..StorageConfig::new(dir.path().join("db"))
        };

        {
            let db = Database::open(&config)?;
            assert!(db.is_new());
            assert_eq!(db.buffer_pool().capacity(), 3);

            let lsn = db.log_manager().append(b"hello")?;
            db.log_manager().flush(lsn)?;

            let pinned = db.buffer_pool().pin(&BlockId::new("t.tbl", 0))?;
            let mut buffer = pinned.lock();
            buffer.contents_mut().set_int(0, 5);
            buffer.set_modified(1, Some(lsn));
            drop(buffer);
            db.buffer_pool().flush_all(1)?;
        }

        let db = Database::open(&config)?;
        assert!(!db.is_new());
        let records = db
            .log_manager()
            .iterator()?
            .collect::<StorageResult<Vec<_>>>()?;
        assert_eq!(records, vec![b"hello".to_vec()]);

        let pinned = db.buffer_pool().pin(&BlockId::new("t.tbl", 0))?;
        assert_eq!(pinned.lock().contents().get_int(0), 5);
        Ok(())
    }
}
