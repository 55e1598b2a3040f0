//! Write-ahead log.
//!
//! The log is a file of fixed-size blocks. Each block starts with a 4-byte
//! boundary: the offset of the oldest record stored in the block. Records are
//! framed as `[4-byte length][payload]` and are written from the end of the
//! block towards the header, so a block always reads oldest-to-newest from
//! its boundary to its end.
//!
//! ```text
//! 0        4                boundary                      block_size
//! +--------+-------- ... ---+----------+----------+-----------+
//! |boundary|   free space    | record 3 | record 2 | record 1  |
//! +--------+-------- ... ---+----------+----------+-----------+
//! ```

pub mod iterator;
pub mod lsn;
pub mod manager;

pub use iterator::LogIterator;
pub use lsn::Lsn;
pub use manager::LogManager;

use crate::storage::block_id::BlockId;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Page, INT_SIZE};

/// Offset of the boundary header in every log block.
pub(crate) const BOUNDARY_OFFSET: usize = 0;

/// Reads and validates a log block's boundary.
///
/// A zero boundary belongs to a block that was allocated but never
/// initialized, and is treated as empty. Otherwise the boundary is either the
/// block length (no records) or the offset of a record header that fits
/// inside the block.
pub(crate) fn read_boundary(block: &BlockId, page: &Page) -> StorageResult<usize> {
    let corrupt = || StorageError::CorruptLogBlock {
        block: block.clone(),
        offset: BOUNDARY_OFFSET,
    };
    if page.len() < 2 * INT_SIZE {
        return Err(corrupt());
    }
    let boundary = page.get_int(BOUNDARY_OFFSET);
    if boundary == 0 {
        return Ok(page.len());
    }
    if boundary < INT_SIZE as i32 {
        return Err(corrupt());
    }
    let boundary = boundary as usize;
    if boundary != page.len() && boundary > page.len() - INT_SIZE {
        return Err(corrupt());
    }
    Ok(boundary)
}
