use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info};
use parking_lot::Mutex;

use super::{BlockStore, IoStats, IoStatsSnapshot};
use crate::storage::block_id::BlockId;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::Page;

/// Files with this prefix are scratch space and do not survive a restart.
const TEMP_FILE_PREFIX: &str = "temp";

/// File-backed block store: one OS file per file name inside a data directory.
pub struct FileManager {
    db_dir: PathBuf,
    block_size: usize,
    is_new: bool,
    open_files: DashMap<String, Arc<Mutex<File>>>,
    stats: IoStats,
}

impl FileManager {
    /// Opens the data directory, creating it if it does not exist.
    pub fn open(db_dir: &Path, block_size: usize) -> StorageResult<Self> {
        let is_new = !db_dir.exists();
        if is_new {
            fs::create_dir_all(db_dir)?;
            info!("Created data directory {}", db_dir.display());
        }

        for entry in fs::read_dir(db_dir)? {
            let entry = entry?;
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with(TEMP_FILE_PREFIX)
            {
                debug!("Removing leftover temporary file {}", entry.path().display());
                fs::remove_file(entry.path())?;
            }
        }

        Ok(Self {
            db_dir: db_dir.to_path_buf(),
            block_size,
            is_new,
            open_files: DashMap::new(),
            stats: IoStats::default(),
        })
    }

    /// Whether `open` had to create the data directory.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    fn file(&self, filename: &str) -> StorageResult<Arc<Mutex<File>>> {
        if let Some(file) = self.open_files.get(filename).map(|e| e.value().clone()) {
            return Ok(file);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.db_dir.join(filename))?;

        Ok(self
            .open_files
            .entry(filename.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(file)))
            .value()
            .clone())
    }

    fn check_page(&self, page: &Page) -> StorageResult<()> {
        if page.len() != self.block_size {
            return Err(StorageError::BlockSizeMismatch {
                expected: self.block_size,
                actual: page.len(),
            });
        }
        Ok(())
    }

    fn block_offset(&self, number: u64) -> u64 {
        number * self.block_size as u64
    }
}

impl BlockStore for FileManager {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read(&self, block: &BlockId, page: &mut Page) -> StorageResult<()> {
        self.check_page(page)?;

        let file = self.file(block.filename())?;
        let mut file = file.lock();
        let offset = self.block_offset(block.number());
        let file_size = file.metadata()?.len();

        let buf = page.contents_mut();
        buf.fill(0);
        if offset < file_size {
            let available = ((file_size - offset) as usize).min(self.block_size);
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf[..available])?;
        }

        self.stats.record_read();
        Ok(())
    }

    fn write(&self, block: &BlockId, page: &Page) -> StorageResult<()> {
        self.check_page(page)?;

        let file = self.file(block.filename())?;
        let mut file = file.lock();
        file.seek(SeekFrom::Start(self.block_offset(block.number())))?;
        file.write_all(page.contents())?;
        file.sync_data()?;

        self.stats.record_write();
        Ok(())
    }

    fn append(&self, filename: &str) -> StorageResult<BlockId> {
        let file = self.file(filename)?;
        let mut file = file.lock();
        let number = file.metadata()?.len() / self.block_size as u64;
        let block = BlockId::new(filename, number);

        file.seek(SeekFrom::Start(self.block_offset(number)))?;
        file.write_all(&vec![0u8; self.block_size])?;
        file.sync_data()?;

        self.stats.record_write();
        Ok(block)
    }

    fn length(&self, filename: &str) -> StorageResult<u64> {
        let file = self.file(filename)?;
        let file = file.lock();
        Ok(file.metadata()?.len() / self.block_size as u64)
    }

    fn stats(&self) -> IoStatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    const BLOCK_SIZE: usize = 128;

    fn page_with(byte: u8) -> Page {
        Page::from_bytes(vec![byte; BLOCK_SIZE])
    }

    #[test]
    fn test_open_creates_directory() -> Result<()> {
        let dir = tempdir()?;
        let db_dir = dir.path().join("db");

        let fm = FileManager::open(&db_dir, BLOCK_SIZE)?;
        assert!(fm.is_new());
        assert!(db_dir.is_dir());

        let fm = FileManager::open(&db_dir, BLOCK_SIZE)?;
        assert!(!fm.is_new());

        Ok(())
    }

    #[test]
    fn test_write_and_read_block() -> Result<()> {
        let dir = tempdir()?;
        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;
        let blk = BlockId::new("test.tbl", 0);

        let mut page = Page::new(BLOCK_SIZE);
        page.set_int(0, 42);
        page.set_string(BLOCK_SIZE - 10, "tail");
        fm.write(&blk, &page)?;

        let mut read = Page::new(BLOCK_SIZE);
        fm.read(&blk, &mut read)?;
        assert_eq!(read.get_int(0), 42);
        assert_eq!(read.get_string(BLOCK_SIZE - 10), "tail");

        Ok(())
    }

    #[test]
    fn test_blocks_do_not_overlap() -> Result<()> {
        let dir = tempdir()?;
        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;

        fm.write(&BlockId::new("f", 0), &page_with(1))?;
        fm.write(&BlockId::new("f", 1), &page_with(2))?;

        let mut read = Page::new(BLOCK_SIZE);
        fm.read(&BlockId::new("f", 0), &mut read)?;
        assert!(read.contents().iter().all(|&b| b == 1));
        fm.read(&BlockId::new("f", 1), &mut read)?;
        assert!(read.contents().iter().all(|&b| b == 2));

        Ok(())
    }

    #[test]
    fn test_read_past_end_is_zeroed() -> Result<()> {
        let dir = tempdir()?;
        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;

        let mut page = page_with(7);
        fm.read(&BlockId::new("empty", 10), &mut page)?;
        assert!(page.contents().iter().all(|&b| b == 0));
        assert_eq!(fm.length("empty")?, 0);

        Ok(())
    }

    #[test]
    fn test_write_past_end_extends_file() -> Result<()> {
        let dir = tempdir()?;
        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;

        fm.write(&BlockId::new("f", 5), &page_with(5))?;
        assert_eq!(fm.length("f")?, 6);

        Ok(())
    }

    #[test]
    fn test_append() -> Result<()> {
        let dir = tempdir()?;
        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;

        assert_eq!(fm.append("log")?, BlockId::new("log", 0));
        assert_eq!(fm.append("log")?, BlockId::new("log", 1));
        assert_eq!(fm.length("log")?, 2);

        let mut page = page_with(3);
        fm.read(&BlockId::new("log", 1), &mut page)?;
        assert!(page.contents().iter().all(|&b| b == 0));

        Ok(())
    }

    #[test]
    fn test_wrong_page_size() -> Result<()> {
        let dir = tempdir()?;
        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;
        let blk = BlockId::new("f", 0);

        let result = fm.write(&blk, &Page::new(BLOCK_SIZE / 2));
        assert!(matches!(
            result,
            Err(StorageError::BlockSizeMismatch { expected: BLOCK_SIZE, actual: 64 })
        ));

        let mut small = Page::new(10);
        assert!(fm.read(&blk, &mut small).is_err());

        Ok(())
    }

    #[test]
    fn test_persistence_across_reopen() -> Result<()> {
        let dir = tempdir()?;
        let blk = BlockId::new("data", 2);

        {
            let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;
            fm.write(&blk, &page_with(99))?;
        }

        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;
        let mut page = Page::new(BLOCK_SIZE);
        fm.read(&blk, &mut page)?;
        assert_eq!(page.contents()[0], 99);
        assert_eq!(fm.length("data")?, 3);

        Ok(())
    }

    #[test]
    fn test_temp_files_removed_on_open() -> Result<()> {
        let dir = tempdir()?;
        {
            let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;
            fm.append("temp_sort_1")?;
            fm.append("keep.tbl")?;
        }

        FileManager::open(dir.path(), BLOCK_SIZE)?;
        assert!(!dir.path().join("temp_sort_1").exists());
        assert!(dir.path().join("keep.tbl").exists());

        Ok(())
    }

    #[test]
    fn test_stats() -> Result<()> {
        let dir = tempdir()?;
        let fm = FileManager::open(dir.path(), BLOCK_SIZE)?;
        let blk = fm.append("f")?;

        let mut page = Page::new(BLOCK_SIZE);
        fm.read(&blk, &mut page)?;
        fm.write(&blk, &page)?;

        assert_eq!(
            fm.stats(),
            IoStatsSnapshot {
                blocks_read: 1,
                blocks_written: 2,
            }
        );

        Ok(())
    }
}
