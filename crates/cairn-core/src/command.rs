//! The closed table of block commands.
//!
//! Every variant follows the same contract: [`Command::validate`] rejects bad
//! input before anything is touched, [`Command::execute`] performs the work
//! and returns a streaming response, and [`Command::finish`] turns the drain
//! summary into the request's overall result.

use std::io::Write;

use cairn_crypto::{CidBuilder, HashFunction};
use cairn_stream::{
    channel, spawn_producer, CancellationToken, LineRenderer, Payload, RecordError,
    RenderSummary, Response, ResponseKind, StreamError, Transform,
};
use cairn_types::{parse_cid, BlockStat, Cid, CidFormat, Prefix, TypeError, DEFAULT_HASH_LENGTH};
use serde::Serialize;
use tracing::debug;

use crate::cat::{concatenate, PayloadProducer};
use crate::config::NodeConfig;
use crate::error::{CoreError, CoreResult};
use crate::node::Node;
use crate::remove::{RemoveOptions, RemovedBlock};

/// Options for storing a block. Unset names fall back to the node config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutOptions {
    /// `v0`, `raw`, `cbor` or `protobuf`.
    pub format: Option<String>,
    /// Hash function name, such as `sha2-256`.
    pub mhtype: Option<String>,
    /// Digest length in bytes; -1 for the function's natural length.
    pub mhlen: i32,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            format: None,
            mhtype: None,
            mhlen: DEFAULT_HASH_LENGTH,
        }
    }
}

impl PutOptions {
    /// Resolve these options into an identifier template.
    pub fn prefix(&self, config: &NodeConfig) -> CoreResult<Prefix> {
        let format = match &self.format {
            Some(name) => name.parse::<CidFormat>()?,
            None => config.default_format,
        };
        let hash = HashFunction::from_name(self.mhtype.as_deref().unwrap_or(&config.default_hash))?;
        hash.resolve_length(self.mhlen)?;
        Ok(Prefix::from_format(format, hash.code(), self.mhlen))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Stat { key: String },
    Get { key: String },
    Put { data: Vec<u8>, options: PutOptions },
    Rm { keys: Vec<String>, options: RemoveOptions },
    Cat { paths: Vec<String> },
}

/// Items a command response can carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Stat(BlockStat),
    Put(BlockStat),
    Removed(RemovedBlock),
}

impl From<RemovedBlock> for CommandOutput {
    fn from(block: RemovedBlock) -> Self {
        Self::Removed(block)
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stat { .. } => "block/stat",
            Self::Get { .. } => "block/get",
            Self::Put { .. } => "block/put",
            Self::Rm { .. } => "block/rm",
            Self::Cat { .. } => "cat",
        }
    }

    /// What the response of this command carries.
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Get { .. } | Self::Cat { .. } => ResponseKind::Payload,
            Self::Stat { .. } | Self::Put { .. } | Self::Rm { .. } => ResponseKind::Items,
        }
    }

    /// Check arguments and options without touching the store.
    pub fn validate(&self, config: &NodeConfig) -> CoreResult<()> {
        match self {
            Self::Stat { key } | Self::Get { key } => {
                parse_cid(key)?;
            }
            Self::Put { options, .. } => {
                // Building over no bytes applies every format and hash rule.
                CidBuilder::build(&options.prefix(config)?, &[])?;
            }
            Self::Rm { keys, .. } => {
                if keys.is_empty() {
                    return Err(CoreError::InvalidRequest("argument \"hash\" is required".into()));
                }
                for key in keys {
                    parse_cid(key)?;
                }
            }
            Self::Cat { paths } => {
                if paths.is_empty() {
                    return Err(CoreError::InvalidRequest(
                        "argument \"ipfs-path\" is required".into(),
                    ));
                }
                if paths.iter().any(String::is_empty) {
                    return Err(TypeError::EmptyKey.into());
                }
            }
        }
        Ok(())
    }

    /// Validate, run against `node`, and hand back the response stream.
    ///
    /// Single-item commands fail here, before a stream exists. `Rm` returns
    /// as soon as its producer is started and reports per-block failures
    /// inside the stream.
    pub async fn execute(
        self,
        node: &Node,
        cancel: CancellationToken,
    ) -> CoreResult<Response<CommandOutput>> {
        self.validate(node.config())?;
        debug!(command = self.name(), "executing");
        let capacity = node.config().channel_capacity;
        match self {
            Self::Stat { key } => {
                let stat = node.access().stat(&key)?;
                ready(CommandOutput::Stat(stat), cancel).await
            }
            Self::Get { key } => {
                let block = node.access().get(&key)?;
                let payload = Payload::from_bytes(block.into_data());
                Ok(spawn_producer(
                    ResponseKind::Payload,
                    capacity,
                    cancel,
                    PayloadProducer(payload),
                ))
            }
            Self::Put { data, options } => {
                let prefix = options.prefix(node.config())?;
                let size = data.len() as u64;
                let cid = node.access().put(&prefix, data)?;
                ready(CommandOutput::Put(BlockStat::new(&cid, size)), cancel).await
            }
            Self::Rm { keys, options } => {
                let cids = keys
                    .iter()
                    .map(|k| parse_cid(k))
                    .collect::<Result<Vec<Cid>, _>>()?;
                Ok(node.removal().remove_many(cids, options, cancel))
            }
            Self::Cat { paths } => {
                let payload = concatenate(node.resolver().as_ref(), &paths).await?;
                Ok(spawn_producer(
                    ResponseKind::Payload,
                    capacity,
                    cancel,
                    PayloadProducer(payload),
                ))
            }
        }
    }

    /// Line renderer for this command's text output.
    pub fn renderer(&self) -> TextRenderer {
        let quiet = matches!(self, Self::Rm { options, .. } if options.quiet);
        TextRenderer { quiet }
    }

    /// The request's overall result once its response has been drained.
    pub fn finish(&self, summary: RenderSummary) -> CoreResult<RenderSummary> {
        settle(matches!(self, Self::Rm { .. }), summary)
    }

    /// Execute, drain the response through `transform` into `out`, and
    /// settle the overall result.
    pub async fn run(
        self,
        node: &Node,
        transform: Transform,
        out: &mut (dyn Write + Send),
        diag: Box<dyn Write + Send>,
        cancel: CancellationToken,
    ) -> CoreResult<RenderSummary> {
        let renderer = self.renderer();
        let bulk = matches!(self, Self::Rm { .. });
        let response = self.execute(node, cancel).await?;
        let summary = transform.run(response, out, diag, &renderer).await?;
        settle(bulk, summary)
    }
}

fn settle(bulk: bool, summary: RenderSummary) -> CoreResult<RenderSummary> {
    if summary.cancelled {
        return Err(StreamError::Cancelled.into());
    }
    if bulk && summary.is_failed() {
        return Err(CoreError::NotAllRemoved {
            failures: summary.failures,
        });
    }
    Ok(summary.into_result()?)
}

/// A response already holding its single item.
async fn ready(
    item: CommandOutput,
    cancel: CancellationToken,
) -> CoreResult<Response<CommandOutput>> {
    let (mut emitter, response) = channel(ResponseKind::Items, 1, cancel);
    emitter.emit(item).await?;
    emitter.close();
    Ok(response)
}

/// Plain-text rendering of command output.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer {
    pub quiet: bool,
}

impl LineRenderer<CommandOutput> for TextRenderer {
    fn item(&self, item: &CommandOutput) -> Option<String> {
        match item {
            CommandOutput::Stat(stat) => Some(stat.to_string()),
            CommandOutput::Put(stat) => Some(stat.key.clone()),
            CommandOutput::Removed(_) if self.quiet => None,
            CommandOutput::Removed(block) => Some(format!("removed {}", block.hash)),
        }
    }

    fn error(&self, error: &RecordError) -> String {
        match &error.subject {
            Some(subject) => format!("cannot remove {subject}: {}", error.message),
            None => format!("Error: {}", error.message),
        }
    }
}
