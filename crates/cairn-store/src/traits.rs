use cairn_types::{Block, Cid};

use crate::error::StoreResult;

/// Content-addressed block store.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once written. Content-addressing guarantees this:
///   the same bytes under the same prefix always produce the same identifier.
/// - `put` is idempotent: storing a block twice leaves the store as storing
///   it once.
/// - Operations on one identifier from concurrent callers never corrupt
///   state. No cross-identifier transaction is provided.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlockStore: Send + Sync {
    /// Read a block by identifier.
    ///
    /// Returns `Ok(None)` if the block does not exist.
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>>;

    /// Store a block and return its identifier.
    fn put(&self, block: &Block) -> StoreResult<Cid>;

    /// Check whether a block exists in the store.
    fn has(&self, cid: &Cid) -> StoreResult<bool>;

    /// Delete a block by identifier. Returns `true` if the block existed.
    fn delete(&self, cid: &Cid) -> StoreResult<bool>;

    /// Size in bytes of a stored block, if present.
    ///
    /// Default implementation reads the block. Backends may override to
    /// avoid loading the bytes.
    fn size(&self, cid: &Cid) -> StoreResult<Option<u64>> {
        Ok(self.get(cid)?.map(|b| b.size()))
    }

    /// Read multiple blocks in a batch.
    fn get_batch(&self, cids: &[Cid]) -> StoreResult<Vec<Option<Block>>> {
        cids.iter().map(|cid| self.get(cid)).collect()
    }

    /// Store multiple blocks in a batch and return their identifiers.
    fn put_batch(&self, blocks: &[Block]) -> StoreResult<Vec<Cid>> {
        blocks.iter().map(|b| self.put(b)).collect()
    }
}

/// The pinning collaborator: marks blocks that must not be removed.
pub trait Pinner: Send + Sync {
    fn is_pinned(&self, cid: &Cid) -> bool;
}
