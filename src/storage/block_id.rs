use std::fmt;

/// Identifies one fixed-size block: a file name plus a zero-based block number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    filename: String,
    number: u64,
}

impl BlockId {
    pub fn new(filename: impl Into<String>, number: u64) -> Self {
        Self {
            filename: filename.into(),
            number,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// The block directly before this one in the same file, if any.
    pub fn previous(&self) -> Option<BlockId> {
        self.number
            .checked_sub(1)
            .map(|number| BlockId::new(self.filename.clone(), number))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.filename, self.number)
    }
}
