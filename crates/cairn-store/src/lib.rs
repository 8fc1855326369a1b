//! Block storage for cairn.
//!
//! This crate holds the collaborators the block access layer is built on
//! and the [`BlockAccess`] facade that callers use to get, put and delete
//! immutable, hash-identified blocks.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlockStore`] trait:
//!
//! - [`InMemoryBlockStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlockStore`] -- one file per block under a repository directory
//!
//! # Pinning
//!
//! The [`Pinner`] trait answers whether a block is protected from removal.
//! [`PinSet`] is an in-memory implementation with optional JSON persistence.
//!
//! # Design Rules
//!
//! 1. Blocks are immutable once written; `put` of an existing block is a no-op.
//! 2. Stores provide their own per-key consistency; no cross-block transactions.
//! 3. Deletion has no pin awareness. Pin checks belong to bulk removal.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod access;
pub mod error;
pub mod fs;
pub mod memory;
pub mod pins;
pub mod traits;

pub use access::BlockAccess;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlockStore;
pub use memory::InMemoryBlockStore;
pub use pins::PinSet;
pub use traits::{BlockStore, Pinner};
