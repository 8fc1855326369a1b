use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use cairn_types::{parse_cid, Cid};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::Pinner;

/// Set of pinned identifiers, optionally persisted as a JSON array of
/// identifier strings.
pub struct PinSet {
    pins: RwLock<BTreeSet<Cid>>,
    path: Option<PathBuf>,
}

impl PinSet {
    /// An empty, memory-only pin set.
    pub fn new() -> Self {
        Self {
            pins: RwLock::new(BTreeSet::new()),
            path: None,
        }
    }

    /// Load a pin set from `path`, or start empty if the file does not exist.
    /// Every change is written back to `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let pins = match fs::read(&path) {
            Ok(bytes) => Self::decode(&path, &bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = pins.len(), "pin set loaded");
        Ok(Self {
            pins: RwLock::new(pins),
            path: Some(path),
        })
    }

    fn decode(path: &Path, bytes: &[u8]) -> StoreResult<BTreeSet<Cid>> {
        let keys: Vec<String> =
            serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        keys.iter()
            .map(|k| parse_cid(k).map_err(StoreError::from))
            .collect()
    }

    fn persist(&self, pins: &BTreeSet<Cid>) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let keys: Vec<String> = pins.iter().map(Cid::to_string).collect();
        let json = serde_json::to_vec_pretty(&keys).map_err(|e| StoreError::Serialization {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Pin a block. Returns `true` if it was not already pinned.
    ///
    /// The set is left unchanged when the pin file cannot be written.
    pub fn pin(&self, cid: Cid) -> StoreResult<bool> {
        let mut pins = self.pins.write().expect("lock poisoned");
        if pins.contains(&cid) {
            return Ok(false);
        }
        let mut next = pins.clone();
        next.insert(cid);
        self.persist(&next)?;
        *pins = next;
        Ok(true)
    }

    /// Unpin a block. Returns `true` if it was pinned.
    pub fn unpin(&self, cid: &Cid) -> StoreResult<bool> {
        let mut pins = self.pins.write().expect("lock poisoned");
        if !pins.contains(cid) {
            return Ok(false);
        }
        let mut next = pins.clone();
        next.remove(cid);
        self.persist(&next)?;
        *pins = next;
        Ok(true)
    }

    /// All pinned identifiers, sorted.
    pub fn list(&self) -> Vec<Cid> {
        self.pins.read().expect("lock poisoned").iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.pins.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.read().expect("lock poisoned").is_empty()
    }
}

impl Default for PinSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Pinner for PinSet {
    fn is_pinned(&self, cid: &Cid) -> bool {
        self.pins.read().expect("lock poisoned").contains(cid)
    }
}

impl std::fmt::Debug for PinSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinSet")
            .field("pin_count", &self.len())
            .field("path", &self.path)
            .finish()
    }
}
