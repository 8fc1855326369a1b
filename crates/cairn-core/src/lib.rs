//! The cairn node.
//!
//! Wires a block store, a pin set and a content resolver into a [`Node`],
//! and exposes every user-facing operation as a variant of the closed
//! [`Command`] table. Each command validates its input, executes against the
//! node, and hands back a streaming [`Response`](cairn_stream::Response)
//! whose producer keeps running after the call returns.

pub mod cat;
pub mod command;
pub mod config;
pub mod error;
pub mod node;
pub mod remove;

pub use cat::{concatenate, BlockResolver, ContentResolver, PayloadProducer, ResolvedContent};
pub use command::{Command, CommandOutput, PutOptions, TextRenderer};
pub use config::NodeConfig;
pub use error::{CoreError, CoreResult};
pub use node::Node;
pub use remove::{RemovalOutcome, RemovalPipeline, RemoveOptions, RemovedBlock, SkipReason};

// Re-export key types
pub use cairn_stream::{CancellationToken, OutputMode, Response, Transform};
pub use cairn_types::{BlockStat, Cid, CidFormat, Prefix};
