//! Foundation types for cairn.
//!
//! This crate provides the addressing and structural types shared by every
//! other cairn crate: how a block is identified, how identifiers are derived
//! from a template, and what a stored block looks like.
//!
//! # Key Types
//!
//! - [`Cid`]: self-describing content identifier (re-exported from `cid`)
//! - [`Codec`]: multicodec of the addressed content (raw, dag-pb, dag-cbor)
//! - [`CidFormat`]: user-facing format names (`v0`, `raw`, `cbor`, `protobuf`)
//! - [`Prefix`]: template for deriving an identifier from new bytes
//! - [`Block`]: immutable identifier + bytes pair
//! - [`BlockStat`]: derived `(key, size)` view of a block

pub mod block;
pub mod codec;
pub mod error;
pub mod key;
pub mod prefix;

pub use block::{Block, BlockStat};
pub use cid::{Cid, Version};
pub use codec::{CidFormat, Codec};
pub use error::{TypeError, TypeResult};
pub use key::{parse_cid, strip_path_namespace};
pub use prefix::{Prefix, DEFAULT_HASH_LENGTH};
