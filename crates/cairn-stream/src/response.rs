use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{StreamError, StreamResult};
use crate::record::{Payload, RecordError, ResponseKind, StreamRecord};

/// Lifecycle of a response stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// The producer may still push records.
    Open,
    /// No further pushes; buffered records may still be drained.
    Closed,
    /// The consumer has observed the end of the stream. Terminal.
    Drained,
}

const OPEN: u8 = 0;
const CLOSED: u8 = 1;
const DRAINED: u8 = 2;

/// State shared by both ends of one response.
struct Shared {
    state: AtomicU8,
}

impl Shared {
    fn state(&self) -> StreamState {
        match self.state.load(Ordering::Acquire) {
            OPEN => StreamState::Open,
            CLOSED => StreamState::Closed,
            _ => StreamState::Drained,
        }
    }

    fn close(&self) {
        let _ = self
            .state
            .compare_exchange(OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire);
    }

    fn drain(&self) {
        self.state.store(DRAINED, Ordering::Release);
    }
}

/// Create a connected emitter/response pair.
///
/// `capacity` bounds how many records may wait between producer and
/// consumer; a capacity of 1 is the closest to an unbuffered rendezvous.
/// Zero is treated as 1.
pub fn channel<T>(
    kind: ResponseKind,
    capacity: usize,
    cancel: CancellationToken,
) -> (ResponseEmitter<T>, Response<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let shared = Arc::new(Shared {
        state: AtomicU8::new(OPEN),
    });
    let emitter = ResponseEmitter {
        tx: Some(tx),
        shared: Arc::clone(&shared),
        kind,
        cancel: cancel.clone(),
        emitted: 0,
    };
    let response = Response {
        rx,
        shared,
        kind,
        cancel,
    };
    (emitter, response)
}

/// Producer side of a response.
///
/// Every emit waits for channel capacity, which is how a slow consumer
/// throttles the producer. A pending emit is abandoned with
/// [`StreamError::Cancelled`] as soon as the request is cancelled.
pub struct ResponseEmitter<T> {
    tx: Option<mpsc::Sender<StreamRecord<T>>>,
    shared: Arc<Shared>,
    kind: ResponseKind,
    cancel: CancellationToken,
    emitted: usize,
}

impl<T> ResponseEmitter<T> {
    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    /// Number of records pushed so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Push one item. Only valid on an item-sequence response.
    pub async fn emit(&mut self, item: T) -> StreamResult<()> {
        self.admit("item", self.kind == ResponseKind::Items)?;
        self.send(StreamRecord::Item(item)).await
    }

    /// Push a per-item failure.
    ///
    /// On a payload response an error may stand in for the payload, but
    /// never follow it.
    pub async fn emit_error(&mut self, error: RecordError) -> StreamResult<()> {
        let allowed = self.kind == ResponseKind::Items || self.emitted == 0;
        self.admit("error", allowed)?;
        self.send(StreamRecord::Error(error)).await
    }

    /// Push the single payload of a payload response.
    pub async fn emit_payload(&mut self, payload: Payload) -> StreamResult<()> {
        let allowed = self.kind == ResponseKind::Payload && self.emitted == 0;
        self.admit("payload", allowed)?;
        self.send(StreamRecord::Payload(payload)).await
    }

    /// Close the stream. Irreversible; later emits fail with
    /// [`StreamError::Closed`].
    pub fn close(&mut self) {
        if self.tx.take().is_some() {
            self.shared.close();
        }
    }

    fn admit(&self, record: &'static str, allowed: bool) -> StreamResult<()> {
        if self.tx.is_none() {
            return Err(StreamError::Closed);
        }
        if !allowed {
            return Err(StreamError::ModeMismatch {
                kind: self.kind,
                record,
            });
        }
        Ok(())
    }

    async fn send(&mut self, record: StreamRecord<T>) -> StreamResult<()> {
        let tx = self.tx.as_ref().ok_or(StreamError::Closed)?;
        if self.cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        let sent = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(StreamError::Cancelled),
            res = tx.send(record) => res.map_err(|_| StreamError::ConsumerGone),
        };
        sent?;
        self.emitted += 1;
        Ok(())
    }
}

impl<T> Drop for ResponseEmitter<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> std::fmt::Debug for ResponseEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseEmitter")
            .field("kind", &self.kind)
            .field("state", &self.shared.state())
            .field("emitted", &self.emitted)
            .finish()
    }
}

/// Consumer side of a response.
pub struct Response<T> {
    rx: mpsc::Receiver<StreamRecord<T>>,
    shared: Arc<Shared>,
    kind: ResponseKind,
    cancel: CancellationToken,
}

impl<T> Response<T> {
    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn state(&self) -> StreamState {
        self.shared.state()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fire the request's cancellation signal.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Pull the next record, waiting for the producer if none is buffered.
    ///
    /// Returns `None` once the stream is closed and fully drained; the
    /// response is then in the `Drained` state.
    pub async fn next(&mut self) -> Option<StreamRecord<T>> {
        match self.rx.recv().await {
            Some(record) => Some(record),
            None => {
                self.shared.drain();
                None
            }
        }
    }

    /// Take the payload of a payload response.
    pub async fn into_payload(mut self) -> StreamResult<Payload> {
        match self.next().await {
            Some(StreamRecord::Payload(payload)) => Ok(payload),
            Some(StreamRecord::Error(err)) => Err(StreamError::Record(err)),
            Some(other) => Err(StreamError::ModeMismatch {
                kind: self.kind,
                record: other.name(),
            }),
            None if self.cancel.is_cancelled() => Err(StreamError::Cancelled),
            None => Err(StreamError::Closed),
        }
    }

    /// Drain an item-sequence response into its items and errors, in
    /// delivery order.
    pub async fn collect(mut self) -> (Vec<T>, Vec<RecordError>) {
        let mut items = Vec::new();
        let mut errors = Vec::new();
        while let Some(record) = self.next().await {
            match record {
                StreamRecord::Item(item) => items.push(item),
                StreamRecord::Error(err) => errors.push(err),
                StreamRecord::Payload(_) => {}
            }
        }
        (items, errors)
    }
}

impl<T> std::fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("kind", &self.kind)
            .field("state", &self.shared.state())
            .finish()
    }
}
