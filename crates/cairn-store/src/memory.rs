use std::collections::HashMap;
use std::sync::RwLock;

use cairn_types::{Block, Cid};
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::BlockStore;

/// In-memory, HashMap-based block store.
///
/// Intended for tests and embedding. All blocks are held in memory behind a
/// `RwLock` for safe concurrent access. Blocks are cloned on read/write.
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<Cid, Block>>,
}

impl InMemoryBlockStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blocks.
    pub fn total_bytes(&self) -> u64 {
        self.blocks
            .read()
            .expect("lock poisoned")
            .values()
            .map(Block::size)
            .sum()
    }

    /// Remove all blocks from the store.
    pub fn clear(&self) {
        self.blocks.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all identifiers in the store.
    pub fn all_cids(&self) -> Vec<Cid> {
        let map = self.blocks.read().expect("lock poisoned");
        let mut cids: Vec<Cid> = map.keys().copied().collect();
        cids.sort();
        cids
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for InMemoryBlockStore {
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.get(cid).cloned())
    }

    fn put(&self, block: &Block) -> StoreResult<Cid> {
        let cid = *block.cid();
        let mut map = self.blocks.write().expect("lock poisoned");
        map.entry(cid).or_insert_with(|| block.clone());
        debug!(%cid, size = block.size(), "block stored");
        Ok(cid)
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.contains_key(cid))
    }

    fn delete(&self, cid: &Cid) -> StoreResult<bool> {
        let mut map = self.blocks.write().expect("lock poisoned");
        Ok(map.remove(cid).is_some())
    }

    fn size(&self, cid: &Cid) -> StoreResult<Option<u64>> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.get(cid).map(Block::size))
    }
}

impl std::fmt::Debug for InMemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryBlockStore")
            .field("block_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_crypto::CidBuilder;
    use cairn_types::Prefix;

    fn make_block(content: &[u8]) -> Block {
        let cid = CidBuilder::build(&Prefix::v0(), content).unwrap();
        Block::new(cid, content.to_vec())
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryBlockStore::new();
        let block = make_block(b"hello world");
        let cid = store.put(&block).unwrap();
        assert_eq!(cid, *block.cid());

        let read_back = store.get(&cid).unwrap().expect("should exist");
        assert_eq!(read_back, block);
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryBlockStore::new();
        let cid = *make_block(b"missing").cid();
        assert!(store.get(&cid).unwrap().is_none());
    }

    #[test]
    fn put_is_idempotent() {
        let store = InMemoryBlockStore::new();
        let block = make_block(b"idempotent");
        let cid1 = store.put(&block).unwrap();
        let cid2 = store.put(&block).unwrap();
        assert_eq!(cid1, cid2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_produces_different_cids() {
        let store = InMemoryBlockStore::new();
        let cid1 = store.put(&make_block(b"aaa")).unwrap();
        let cid2 = store.put(&make_block(b"bbb")).unwrap();
        assert_ne!(cid1, cid2);
        assert_eq!(store.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Has / Delete / Size
    // -----------------------------------------------------------------------

    #[test]
    fn delete_present_block() {
        let store = InMemoryBlockStore::new();
        let cid = store.put(&make_block(b"to-delete")).unwrap();
        assert!(store.delete(&cid).unwrap());
        assert!(!store.has(&cid).unwrap());
        assert!(!store.delete(&cid).unwrap());
    }

    #[test]
    fn size_of_present_and_missing() {
        let store = InMemoryBlockStore::new();
        let cid = store.put(&make_block(b"12345")).unwrap();
        assert_eq!(store.size(&cid).unwrap(), Some(5));
        let missing = *make_block(b"nope").cid();
        assert_eq!(store.size(&missing).unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Batch operations
    // -----------------------------------------------------------------------

    #[test]
    fn put_batch_and_get_batch() {
        let store = InMemoryBlockStore::new();
        let blocks = vec![
            make_block(b"batch-1"),
            make_block(b"batch-2"),
            make_block(b"batch-3"),
        ];
        let cids = store.put_batch(&blocks).unwrap();
        assert_eq!(cids.len(), 3);

        let read_back = store.get_batch(&cids).unwrap();
        for (i, maybe_block) in read_back.into_iter().enumerate() {
            assert_eq!(maybe_block.expect("batch block should exist"), blocks[i]);
        }
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn total_bytes_and_clear() {
        let store = InMemoryBlockStore::new();
        store.put(&make_block(b"12345")).unwrap();
        store.put(&make_block(b"123456789")).unwrap();
        assert_eq!(store.total_bytes(), 14);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn all_cids_is_sorted() {
        let store = InMemoryBlockStore::new();
        for content in [b"aaa", b"bbb", b"ccc"] {
            store.put(&make_block(content)).unwrap();
        }
        let cids = store.all_cids();
        assert_eq!(cids.len(), 3);
        for w in cids.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryBlockStore::new());
        let cid = store.put(&make_block(b"shared data")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let block = store.get(&cid).unwrap().expect("present");
                    assert!(CidBuilder::verify(&cid, block.data()).unwrap());
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlockStore::new();
        store.put(&make_block(b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlockStore"));
        assert!(debug.contains("block_count"));
    }
}
