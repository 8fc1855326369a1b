use std::sync::Arc;

use cairn_crypto::CidBuilder;
use cairn_types::{parse_cid, Block, BlockStat, Cid, Prefix};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// Facade over an injected [`BlockStore`]: get, put and delete by identifier.
///
/// `delete` has no pin awareness; bulk removal layers that on top.
#[derive(Clone)]
pub struct BlockAccess {
    store: Arc<dyn BlockStore>,
}

impl BlockAccess {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }

    /// Fetch a block by a caller-supplied identifier string.
    ///
    /// Empty and malformed strings are rejected before the store is touched.
    pub fn get(&self, key: &str) -> StoreResult<Block> {
        let cid = parse_cid(key)?;
        self.get_cid(&cid)
    }

    /// Fetch a block by parsed identifier.
    pub fn get_cid(&self, cid: &Cid) -> StoreResult<Block> {
        let block = self.store.get(cid)?.ok_or(StoreError::NotFound(*cid))?;
        debug!(cid = %block.cid(), "got block");
        Ok(block)
    }

    /// The `(key, size)` view of a stored block.
    pub fn stat(&self, key: &str) -> StoreResult<BlockStat> {
        Ok(self.get(key)?.stat())
    }

    /// Derive the identifier of `data` under `prefix` and store the block.
    ///
    /// Idempotent: the same bytes under the same prefix always yield the same
    /// identifier and leave the store unchanged the second time.
    pub fn put(&self, prefix: &Prefix, data: Vec<u8>) -> StoreResult<Cid> {
        let cid = CidBuilder::build(prefix, &data)?;
        let block = Block::new(cid, data);
        let stored = self.store.put(&block)?;
        debug!(cid = %stored, %prefix, size = block.size(), "put block");
        Ok(stored)
    }

    /// Remove a block. Fails with [`StoreError::NotFound`] if absent.
    pub fn delete(&self, cid: &Cid) -> StoreResult<()> {
        if self.store.delete(cid)? {
            debug!(%cid, "deleted block");
            Ok(())
        } else {
            Err(StoreError::NotFound(*cid))
        }
    }

    pub fn has(&self, cid: &Cid) -> StoreResult<bool> {
        self.store.has(cid)
    }

    pub fn size(&self, cid: &Cid) -> StoreResult<Option<u64>> {
        self.store.size(cid)
    }
}

impl std::fmt::Debug for BlockAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockAccess").finish_non_exhaustive()
    }
}
