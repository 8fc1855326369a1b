use std::io;

use crate::record::{RecordError, ResponseKind};

/// Errors from producing or consuming a response stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A record was emitted after the stream was closed.
    #[error("stream closed")]
    Closed,

    /// A record does not fit the kind the response was opened with.
    #[error("{record} record not allowed on a {kind} response")]
    ModeMismatch {
        kind: ResponseKind,
        record: &'static str,
    },

    /// The request's cancellation signal fired.
    #[error("request cancelled")]
    Cancelled,

    /// The consumer dropped its end of the stream.
    #[error("response consumer went away")]
    ConsumerGone,

    /// Reading the payload or writing rendered output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The producer reported an error record where a payload was expected.
    #[error(transparent)]
    Record(RecordError),

    /// Draining finished and some items had failed.
    #[error("{failures} of {total} items failed")]
    Failed { failures: usize, total: usize },
}

pub type StreamResult<T> = Result<T, StreamError>;
