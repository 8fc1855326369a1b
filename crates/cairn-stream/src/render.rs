use std::io::{self, Read, Write};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{StreamError, StreamResult};
use crate::record::{Payload, RecordError, StreamRecord};
use crate::response::Response;

/// Turns items of a sequence response into human-readable lines.
pub trait LineRenderer<T> {
    /// The line for one item, or `None` to print nothing for it.
    fn item(&self, item: &T) -> Option<String>;

    /// The diagnostic line for one failed item.
    fn error(&self, error: &RecordError) -> String {
        format!("Error: {error}")
    }
}

/// Counts gathered while draining a response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub items: usize,
    pub failures: usize,
    pub bytes: u64,
    /// The cancellation signal fired before the drain ended, so the counts
    /// may cover only part of the request.
    pub cancelled: bool,
}

impl RenderSummary {
    pub fn is_failed(&self) -> bool {
        self.failures > 0
    }

    /// [`StreamError::Cancelled`] if the drain was cut short, else
    /// [`StreamError::Failed`] if any item failed.
    pub fn into_result(self) -> StreamResult<Self> {
        if self.cancelled {
            Err(StreamError::Cancelled)
        } else if self.is_failed() {
            Err(StreamError::Failed {
                failures: self.failures,
                total: self.items + self.failures,
            })
        } else {
            Ok(self)
        }
    }
}

/// Drain a sequence response: items to `out`, errors to `diag`.
///
/// A failed item never stops the drain; the summary records it and the
/// caller decides what an overall failure means. A cancelled request ends
/// the drain early with [`RenderSummary::cancelled`] set.
pub async fn render_lines<T, R>(
    mut response: Response<T>,
    out: &mut (dyn Write + Send),
    diag: &mut (dyn Write + Send),
    renderer: &R,
) -> StreamResult<RenderSummary>
where
    T: Send + 'static,
    R: LineRenderer<T> + Sync + ?Sized,
{
    let mut summary = RenderSummary::default();
    while let Some(record) = response.next().await {
        match record {
            StreamRecord::Item(item) => {
                summary.items += 1;
                if let Some(line) = renderer.item(&item) {
                    writeln!(out, "{line}")?;
                }
            }
            StreamRecord::Error(err) => {
                summary.failures += 1;
                writeln!(diag, "{}", renderer.error(&err))?;
            }
            StreamRecord::Payload(payload) => {
                summary.bytes += copy_payload(payload, out, response.cancel_token())?
            }
        }
    }
    out.flush()?;
    summary.cancelled = response.cancel_token().is_cancelled();
    Ok(summary)
}

/// Drain a sequence response as newline-delimited JSON, errors included.
pub async fn render_json<T>(
    mut response: Response<T>,
    out: &mut (dyn Write + Send),
) -> StreamResult<RenderSummary>
where
    T: Serialize + Send + 'static,
{
    let mut summary = RenderSummary::default();
    while let Some(record) = response.next().await {
        match record {
            StreamRecord::Item(item) => {
                summary.items += 1;
                serde_json::to_writer(&mut *out, &item).map_err(io::Error::from)?;
                writeln!(out)?;
            }
            StreamRecord::Error(err) => {
                summary.failures += 1;
                serde_json::to_writer(&mut *out, &err).map_err(io::Error::from)?;
                writeln!(out)?;
            }
            StreamRecord::Payload(payload) => {
                summary.bytes += copy_payload(payload, out, response.cancel_token())?
            }
        }
    }
    out.flush()?;
    summary.cancelled = response.cancel_token().is_cancelled();
    Ok(summary)
}

/// Copy the payload of a payload response to `out`.
///
/// A read failure, or a reader that ends before its declared length, is an
/// [`StreamError::Io`]. The cancellation signal is checked between chunks.
pub async fn write_payload<T: Send + 'static>(
    response: Response<T>,
    out: &mut (dyn Write + Send),
) -> StreamResult<RenderSummary> {
    let cancel = response.cancel_token().clone();
    let payload = response.into_payload().await?;
    let bytes = copy_payload(payload, out, &cancel)?;
    out.flush()?;
    Ok(RenderSummary {
        bytes,
        ..RenderSummary::default()
    })
}

const CHUNK_SIZE: usize = 64 * 1024;

fn copy_payload(
    payload: Payload,
    out: &mut (dyn Write + Send),
    cancel: &CancellationToken,
) -> StreamResult<u64> {
    let (mut reader, length) = payload.into_parts();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        out.write_all(&buf[..n])?;
        copied += n as u64;
    }
    if copied < length {
        return Err(StreamError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("payload ended after {copied} of {length} bytes"),
        )));
    }
    Ok(copied)
}
