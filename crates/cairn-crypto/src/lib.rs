//! Hashing for cairn.
//!
//! Provides the fixed registry of supported multihash functions and the
//! [`CidBuilder`], the single place where raw bytes become an addressable
//! identifier.
//!
//! Digests come from `multihash-codetable`.

pub mod builder;
pub mod hasher;

pub use builder::CidBuilder;
pub use hasher::HashFunction;
