//! Startup configuration for the storage core.

use std::path::PathBuf;
use std::time::Duration;

use crate::storage::buffer::{ReplacementPolicy, DEFAULT_MAX_PIN_WAIT};

pub const DEFAULT_BLOCK_SIZE: usize = 400;
pub const DEFAULT_POOL_SIZE: usize = 8;
pub const DEFAULT_LOG_FILE: &str = "strata.log";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding every file of the database.
    pub data_dir: PathBuf,
    /// Size of every block, in bytes.
    pub block_size: usize,
    /// Number of buffers in the pool.
    pub pool_size: usize,
    /// Name of the log file inside `data_dir`.
    pub log_file: String,
    /// How long a pin waits for a free buffer.
    pub max_pin_wait: Duration,
    pub replacement: ReplacementPolicy,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("strata_data"),
            block_size: DEFAULT_BLOCK_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
            log_file: DEFAULT_LOG_FILE.to_string(),
            max_pin_wait: DEFAULT_MAX_PIN_WAIT,
            replacement: ReplacementPolicy::FirstUnpinned,
        }
    }
}
