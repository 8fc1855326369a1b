use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{StreamError, StreamResult};
use crate::record::{ErrorKind, RecordError, ResponseKind};
use crate::response::{channel, Response, ResponseEmitter};

/// Work that fills a response from its own task.
#[async_trait]
pub trait Producer<T: Send + 'static>: Send + 'static {
    /// Push every record of the response. The emitter is closed once this
    /// returns, whatever the outcome.
    async fn produce(self, emitter: &mut ResponseEmitter<T>) -> StreamResult<()>;
}

/// Start `producer` on a new task and hand back the consumer end at once.
///
/// The caller never waits for production. A producer error other than
/// cancellation or a vanished consumer is pushed as a final error record
/// when the stream still accepts one. A cancelled producer just closes the
/// stream; consumers learn of it from the response's cancellation token.
pub fn spawn_producer<T, P>(
    kind: ResponseKind,
    capacity: usize,
    cancel: CancellationToken,
    producer: P,
) -> Response<T>
where
    T: Send + 'static,
    P: Producer<T>,
{
    let (mut emitter, response) = channel(kind, capacity, cancel);
    tokio::spawn(async move {
        match producer.produce(&mut emitter).await {
            Ok(()) => debug!(emitted = emitter.emitted(), "producer finished"),
            Err(StreamError::Cancelled) => debug!("producer cancelled"),
            Err(StreamError::ConsumerGone) => debug!("consumer went away"),
            Err(err) => {
                warn!(error = %err, "producer failed");
                let record = match err {
                    StreamError::Record(record) => record,
                    StreamError::Io(e) => RecordError::new(ErrorKind::Io, e.to_string()),
                    other => RecordError::new(ErrorKind::Internal, other.to_string()),
                };
                if emitter.is_open() {
                    let _ = emitter.emit_error(record).await;
                }
            }
        }
        emitter.close();
    });
    response
}
