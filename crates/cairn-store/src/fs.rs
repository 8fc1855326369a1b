//! Local filesystem block store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cairn_crypto::CidBuilder;
use cairn_types::{Block, Cid, Prefix};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// Extension of block files.
const BLOCK_EXTENSION: &str = "data";

/// One file per block, named after the identifier's string form.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a reader never observes a partially written block. Reads
/// re-derive the identifier from the stored bytes and fail with
/// [`StoreError::HashMismatch`] if they diverge.
pub struct FsBlockStore {
    root: PathBuf,
}

impl FsBlockStore {
    /// Open (creating if needed) a block directory.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn block_path(&self, cid: &Cid) -> PathBuf {
        self.root.join(format!("{cid}.{BLOCK_EXTENSION}"))
    }

    fn write_failure(cid: &Cid, err: impl std::fmt::Display) -> StoreError {
        StoreError::WriteFailure {
            cid: *cid,
            reason: err.to_string(),
        }
    }
}

impl BlockStore for FsBlockStore {
    fn get(&self, cid: &Cid) -> StoreResult<Option<Block>> {
        let data = match fs::read(self.block_path(cid)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let computed = CidBuilder::build(&Prefix::of(cid), &data)?;
        if computed != *cid {
            return Err(StoreError::HashMismatch {
                cid: *cid,
                computed: computed.to_string(),
            });
        }
        Ok(Some(Block::new(*cid, data)))
    }

    fn put(&self, block: &Block) -> StoreResult<Cid> {
        let cid = *block.cid();
        let path = self.block_path(&cid);
        if path.exists() {
            return Ok(cid);
        }
        let mut tmp =
            NamedTempFile::new_in(&self.root).map_err(|e| Self::write_failure(&cid, e))?;
        tmp.write_all(block.data())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Self::write_failure(&cid, e))?;
        tmp.persist(&path)
            .map_err(|e| Self::write_failure(&cid, e.error))?;
        debug!(%cid, size = block.size(), path = %path.display(), "block written");
        Ok(cid)
    }

    fn has(&self, cid: &Cid) -> StoreResult<bool> {
        match fs::metadata(self.block_path(cid)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, cid: &Cid) -> StoreResult<bool> {
        match fs::remove_file(self.block_path(cid)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn size(&self, cid: &Cid) -> StoreResult<Option<u64>> {
        match fs::metadata(self.block_path(cid)) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for FsBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlockStore")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_types::{CidFormat, Codec};

    fn make_block(content: &[u8]) -> Block {
        let cid = CidBuilder::build(&Prefix::v0(), content).unwrap();
        Block::new(cid, content.to_vec())
    }

    #[test]
    fn put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(dir.path().join("blocks")).unwrap();
        let block = make_block(b"on disk");
        let cid = store.put(&block).unwrap();
        assert_eq!(store.get(&cid).unwrap(), Some(block));
        assert_eq!(store.size(&cid).unwrap(), Some(7));
    }

    #[test]
    fn v1_truncated_block_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(dir.path()).unwrap();
        let prefix = Prefix::from_format(CidFormat::Raw, 0x13, 20);
        let cid = CidBuilder::build(&prefix, b"short hash").unwrap();
        assert_eq!(cid.codec(), Codec::RAW);
        store.put(&Block::new(cid, b"short hash".to_vec())).unwrap();
        let back = store.get(&cid).unwrap().expect("present");
        assert_eq!(back.data(), b"short hash");
    }

    #[test]
    fn missing_block() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(dir.path()).unwrap();
        let cid = *make_block(b"absent").cid();
        assert!(store.get(&cid).unwrap().is_none());
        assert!(!store.has(&cid).unwrap());
        assert!(!store.delete(&cid).unwrap());
        assert_eq!(store.size(&cid).unwrap(), None);
    }

    #[test]
    fn put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(dir.path()).unwrap();
        let block = make_block(b"twice");
        assert_eq!(store.put(&block).unwrap(), store.put(&block).unwrap());
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(dir.path()).unwrap();
        let cid = store.put(&make_block(b"gone soon")).unwrap();
        assert!(store.has(&cid).unwrap());
        assert!(store.delete(&cid).unwrap());
        assert!(!store.has(&cid).unwrap());
    }

    #[test]
    fn corrupted_block_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlockStore::open(dir.path()).unwrap();
        let cid = store.put(&make_block(b"pristine")).unwrap();
        fs::write(store.block_path(&cid), b"tampered").unwrap();
        let err = store.get(&cid).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }
}
