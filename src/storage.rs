//! Storage layer implementation for strata.
//!
//! Key components:
//!
//! - **Page**: fixed-size byte region with typed accessors, the in-memory image of a block
//! - **BlockId**: file name plus block number, the unit of addressing
//! - **BlockStore**: whole-block reads and writes against files (`FileManager`) or memory
//! - **BufferPoolManager**: fixed set of buffers with pin/unpin and block replacement
//! - **LogManager**: write-ahead log appended back-to-front within blocks, read newest first

pub mod block_id;
pub mod buffer;
pub mod disk;
pub mod error;
pub mod page;
pub mod wal;

pub use block_id::BlockId;
pub use buffer::{Buffer, BufferPoolManager, PinnedBuffer, ReplacementPolicy, TxId};
pub use disk::{BlockStore, FileManager, MemoryStore};
pub use error::{StorageError, StorageResult};
pub use page::Page;
pub use wal::{LogIterator, LogManager, Lsn};
