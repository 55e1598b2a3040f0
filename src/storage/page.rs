//! In-memory image of one block.
//!
//! A [`Page`] is a fixed-length byte buffer with typed accessors at absolute
//! offsets. Offsets are not validated beyond the slice bounds, so an
//! out-of-range offset panics like any other slice index.
//!
//! Encodings:
//! - integer: 4 bytes, big-endian, signed
//! - bytes: 4-byte length header followed by the payload
//! - string: bytes in US-ASCII, one byte per character

use byteorder::{BigEndian, ByteOrder};

/// Size of the integer encoding and of every length header.
pub const INT_SIZE: usize = 4;

const BYTES_PER_CHAR: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    data: Vec<u8>,
}

impl Page {
    /// Creates a zero-filled page of `block_size` bytes.
    pub fn new(block_size: usize) -> Self {
        Self {
            data: vec![0u8; block_size],
        }
    }

    /// Wraps an existing buffer. The page takes ownership of it.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_int(&self, offset: usize) -> i32 {
        BigEndian::read_i32(&self.data[offset..offset + INT_SIZE])
    }

    pub fn set_int(&mut self, offset: usize, n: i32) {
        BigEndian::write_i32(&mut self.data[offset..offset + INT_SIZE], n);
    }

    /// Reads the length header at `offset`, then that many bytes after it.
    pub fn get_bytes(&self, offset: usize) -> &[u8] {
        let len = self.get_int(offset) as u32 as usize;
        let start = offset + INT_SIZE;
        &self.data[start..start + len]
    }

    pub fn set_bytes(&mut self, offset: usize, bytes: &[u8]) {
        self.set_int(offset, bytes.len() as i32);
        let start = offset + INT_SIZE;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn get_string(&self, offset: usize) -> String {
        self.get_bytes(offset)
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect()
    }

    /// Stores `s` as US-ASCII. Characters outside ASCII are written as `?`.
    pub fn set_string(&mut self, offset: usize, s: &str) {
        let encoded: Vec<u8> = s
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect();
        self.set_bytes(offset, &encoded);
    }

    /// Upper bound on the bytes needed to store a string of `strlen` characters.
    pub fn max_length(strlen: usize) -> usize {
        INT_SIZE + strlen * BYTES_PER_CHAR
    }

    /// Raw block image, for block stores copying to and from disk.
    pub(crate) fn contents(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Gives the underlying buffer back.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
