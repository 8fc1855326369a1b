use std::path::{Path, PathBuf};
use std::sync::Arc;

use cairn_store::{BlockAccess, BlockStore, FsBlockStore, InMemoryBlockStore, PinSet};
use tracing::info;

use crate::cat::{BlockResolver, ContentResolver};
use crate::config::NodeConfig;
use crate::error::CoreResult;
use crate::remove::RemovalPipeline;

/// Directory under the repo root holding one file per block.
pub const BLOCKS_DIR: &str = "blocks";
/// Pin set file under the repo root.
pub const PINS_FILE: &str = "pins.json";

/// A block store, its pin set and a content resolver, wired together.
pub struct Node {
    access: BlockAccess,
    pins: Arc<PinSet>,
    resolver: Arc<dyn ContentResolver>,
    config: NodeConfig,
    repo: Option<PathBuf>,
}

impl Node {
    pub fn new(store: Arc<dyn BlockStore>, pins: Arc<PinSet>, config: NodeConfig) -> Self {
        let access = BlockAccess::new(store);
        let resolver = Arc::new(BlockResolver::new(access.clone()));
        Self {
            access,
            pins,
            resolver,
            config,
            repo: None,
        }
    }

    /// A node backed entirely by memory.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryBlockStore::new()),
            Arc::new(PinSet::new()),
            NodeConfig::default(),
        )
    }

    /// Open (creating if needed) a repo directory.
    pub fn open(repo: impl AsRef<Path>, config: NodeConfig) -> CoreResult<Self> {
        config.validate()?;
        let repo = repo.as_ref();
        let store = FsBlockStore::open(repo.join(BLOCKS_DIR))?;
        let pins = PinSet::open(repo.join(PINS_FILE))?;
        info!(repo = %repo.display(), pins = pins.len(), "node opened");
        let mut node = Self::new(Arc::new(store), Arc::new(pins), config);
        node.repo = Some(repo.to_path_buf());
        Ok(node)
    }

    /// Replace the resolver `cat` uses.
    pub fn with_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn access(&self) -> &BlockAccess {
        &self.access
    }

    pub fn pins(&self) -> &Arc<PinSet> {
        &self.pins
    }

    pub fn resolver(&self) -> &Arc<dyn ContentResolver> {
        &self.resolver
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn repo(&self) -> Option<&Path> {
        self.repo.as_deref()
    }

    /// A removal pipeline over this node's store and pins.
    pub fn removal(&self) -> RemovalPipeline {
        RemovalPipeline::new(self.access.clone(), self.pins.clone())
            .with_capacity(self.config.channel_capacity)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("repo", &self.repo)
            .field("pins", &self.pins.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
