//! Pin-aware bulk removal.
//!
//! Every requested identifier is handled on its own: a pinned or missing
//! block becomes an error record for that identifier and the pipeline moves
//! on. With `force`, both are downgraded to a successful removal carrying a
//! warning. Store failures stay failures either way.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cairn_store::{BlockAccess, Pinner};
use cairn_stream::{
    spawn_producer, CancellationToken, ErrorKind, Producer, RecordError, Response,
    ResponseEmitter, ResponseKind, StreamError, StreamRecord, StreamResult,
};
use cairn_types::Cid;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Modifiers for bulk removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Remove pinned blocks and ignore missing ones.
    pub force: bool,
    /// Drop per-block detail from the output.
    pub quiet: bool,
}

/// Why an identifier was not removed cleanly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Pinned,
    NotFound,
    Io(String),
}

impl SkipReason {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Pinned => ErrorKind::Pinned,
            Self::NotFound => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pinned => f.write_str("pinned"),
            Self::NotFound => f.write_str("block not found"),
            Self::Io(reason) => f.write_str(reason),
        }
    }
}

/// Result of handling one identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed {
        cid: Cid,
        size: Option<u64>,
        /// Set when `force` turned a skip into a removal.
        warning: Option<SkipReason>,
    },
    Skipped {
        cid: Cid,
        reason: SkipReason,
    },
}

impl RemovalOutcome {
    pub fn cid(&self) -> &Cid {
        match self {
            Self::Removed { cid, .. } | Self::Skipped { cid, .. } => cid,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }

    /// The stream record reporting this outcome.
    pub fn into_record(self, quiet: bool) -> StreamRecord<RemovedBlock> {
        match self {
            Self::Removed { cid, size, warning } => StreamRecord::Item(RemovedBlock {
                hash: cid.to_string(),
                size: if quiet { None } else { size },
                warning: warning.map(|w| w.to_string()),
            }),
            Self::Skipped { cid, reason } => StreamRecord::Error(
                RecordError::new(reason.kind(), reason.to_string()).with_subject(cid.to_string()),
            ),
        }
    }
}

/// A successfully removed block as it appears in output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemovedBlock {
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<String>,
}

/// Removes many blocks, consulting a pinning collaborator first.
#[derive(Clone)]
pub struct RemovalPipeline {
    access: BlockAccess,
    pins: Arc<dyn Pinner>,
    capacity: usize,
}

impl RemovalPipeline {
    pub fn new(access: BlockAccess, pins: Arc<dyn Pinner>) -> Self {
        Self {
            access,
            pins,
            capacity: 1,
        }
    }

    /// Records that may wait between the pipeline and its consumer.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Decide and apply the removal of a single identifier.
    pub fn remove_one(&self, cid: &Cid, options: RemoveOptions) -> RemovalOutcome {
        let mut warning = None;
        if self.pins.is_pinned(cid) {
            if !options.force {
                return RemovalOutcome::Skipped {
                    cid: *cid,
                    reason: SkipReason::Pinned,
                };
            }
            warning = Some(SkipReason::Pinned);
        }

        let size = match self.access.size(cid) {
            Ok(size) => size,
            Err(e) => return Self::io_failure(cid, e),
        };
        match self.access.store().delete(cid) {
            Ok(true) => RemovalOutcome::Removed {
                cid: *cid,
                size,
                warning,
            },
            Ok(false) if options.force => RemovalOutcome::Removed {
                cid: *cid,
                size: None,
                warning: Some(SkipReason::NotFound),
            },
            Ok(false) => RemovalOutcome::Skipped {
                cid: *cid,
                reason: SkipReason::NotFound,
            },
            Err(e) => Self::io_failure(cid, e),
        }
    }

    fn io_failure(cid: &Cid, err: impl fmt::Display) -> RemovalOutcome {
        warn!(%cid, error = %err, "block removal failed");
        RemovalOutcome::Skipped {
            cid: *cid,
            reason: SkipReason::Io(err.to_string()),
        }
    }

    /// Remove `cids` from a producer task, one outcome per identifier.
    ///
    /// Returns as soon as the task is started. Once `cancel` fires no further
    /// store operation is issued and the stream closes; identifiers not yet
    /// reached produce no outcome.
    pub fn remove_many<T>(
        &self,
        cids: Vec<Cid>,
        options: RemoveOptions,
        cancel: CancellationToken,
    ) -> Response<T>
    where
        T: From<RemovedBlock> + Send + 'static,
    {
        debug!(count = cids.len(), force = options.force, "bulk removal started");
        let producer = RemovalProducer {
            pipeline: self.clone(),
            cids,
            options,
        };
        spawn_producer(ResponseKind::Items, self.capacity, cancel, producer)
    }
}

impl fmt::Debug for RemovalPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalPipeline")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

struct RemovalProducer {
    pipeline: RemovalPipeline,
    cids: Vec<Cid>,
    options: RemoveOptions,
}

#[async_trait]
impl<T> Producer<T> for RemovalProducer
where
    T: From<RemovedBlock> + Send + 'static,
{
    async fn produce(self, emitter: &mut ResponseEmitter<T>) -> StreamResult<()> {
        for cid in &self.cids {
            if emitter.is_cancelled() {
                return Err(StreamError::Cancelled);
            }
            let outcome = self.pipeline.remove_one(cid, self.options);
            debug!(%cid, removed = outcome.is_removed(), "removal outcome");
            match outcome.into_record(self.options.quiet) {
                StreamRecord::Item(block) => emitter.emit(T::from(block)).await?,
                StreamRecord::Error(err) => emitter.emit_error(err).await?,
                StreamRecord::Payload(_) => {}
            }
        }
        Ok(())
    }
}
