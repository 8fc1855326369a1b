use std::fmt;

use cid::Cid;
use serde::{Deserialize, Serialize};

/// An immutable identifier + bytes pair: the unit of storage.
///
/// A block is created once and never mutated. The identifier is trusted as
/// given; stores that care re-derive it from the bytes on read.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    cid: Cid,
    data: Vec<u8>,
}

impl Block {
    /// Pair an identifier with the bytes it was derived from.
    pub fn new(cid: Cid, data: Vec<u8>) -> Self {
        Self { cid, data }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Size of the raw bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// The `(key, size)` view of this block.
    pub fn stat(&self) -> BlockStat {
        BlockStat::new(&self.cid, self.size())
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("cid", &self.cid.to_string())
            .field("size", &self.size())
            .finish()
    }
}

/// Derived view of a block: its identifier string and byte length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockStat {
    pub key: String,
    pub size: u64,
}

impl BlockStat {
    pub fn new(cid: &Cid, size: u64) -> Self {
        Self {
            key: cid.to_string(),
            size,
        }
    }
}

impl fmt::Display for BlockStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key: {}\nSize: {}", self.key, self.size)
    }
}
