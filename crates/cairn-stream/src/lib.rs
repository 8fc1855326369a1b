//! Streaming responses for cairn.
//!
//! A request handler constructs a [`Response`] and returns immediately; an
//! independent producer task pushes records into it through a
//! [`ResponseEmitter`]. The channel between them is bounded, so a slow
//! consumer applies backpressure to the producer instead of letting results
//! pile up in memory.
//!
//! A response is bound to one [`ResponseKind`] for its whole life: either a
//! single [`Payload`] (a byte reader with a declared length) or a sequence of
//! items and per-item errors.
//!
//! On the consumer side, output-mode specific post-processing is applied as
//! a pluggable [`Transform`] (payload passthrough or progress annotation) or
//! drained by a renderer ([`render_lines`], [`render_json`],
//! [`write_payload`]).
//!
//! # State machine
//!
//! `Open` → `Closed` → `Drained`. Closing is irreversible: emitting after
//! close fails with [`StreamError::Closed`], while the consumer can still
//! drain whatever was pushed before.

pub mod error;
pub mod producer;
pub mod progress;
pub mod record;
pub mod render;
pub mod response;
pub mod transform;

pub use error::{StreamError, StreamResult};
pub use producer::{spawn_producer, Producer};
pub use progress::{ProgressBar, ProgressReader};
pub use record::{ErrorKind, Payload, PayloadReader, RecordError, ResponseKind, StreamRecord};
pub use render::{render_json, render_lines, write_payload, LineRenderer, RenderSummary};
pub use response::{channel, Response, ResponseEmitter, StreamState};
pub use tokio_util::sync::CancellationToken;
pub use transform::{OutputMode, Transform, PROGRESS_MIN_SIZE};
