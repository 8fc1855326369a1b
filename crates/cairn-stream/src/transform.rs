use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crate::error::StreamResult;
use crate::progress::ProgressReader;
use crate::record::{Payload, ResponseKind, StreamRecord};
use crate::render::{render_json, render_lines, write_payload, LineRenderer, RenderSummary};
use crate::response::{channel, Response};

/// Payloads strictly larger than this get a progress indicator in
/// interactive mode.
pub const PROGRESS_MIN_SIZE: u64 = 8 * 1024 * 1024;

/// How the caller wants a response delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Raw bytes for a pipe or file.
    #[default]
    Binary,
    /// A human watching a terminal.
    Interactive,
    /// Plain text lines.
    Text,
    /// Newline-delimited JSON.
    Json,
}

impl OutputMode {
    /// Whether a payload of `length` bytes should carry a progress indicator.
    pub fn needs_progress(self, length: u64) -> bool {
        self == Self::Interactive && length > PROGRESS_MIN_SIZE
    }
}

/// Consumer-side post-processing of a response.
///
/// Transforms never touch what the producer emitted; they wrap or render it
/// on the way out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transform {
    /// Hand the payload through unchanged.
    Passthrough,
    /// Wrap large payloads so each read advances a progress indicator.
    Progress,
    /// One text line per item, errors to the diagnostic output.
    Lines,
    /// One JSON object per item or error.
    Json,
}

impl Transform {
    pub fn select(mode: OutputMode, kind: ResponseKind) -> Self {
        match (kind, mode) {
            (ResponseKind::Payload, OutputMode::Interactive) => Self::Progress,
            (ResponseKind::Payload, _) => Self::Passthrough,
            (ResponseKind::Items, OutputMode::Json) => Self::Json,
            (ResponseKind::Items, _) => Self::Lines,
        }
    }

    /// Rewrite a payload response, drawing progress on `diag` if this is the
    /// progress transform and the declared length is over the threshold.
    ///
    /// Item responses and every other transform pass through untouched.
    pub async fn apply<T: Send + 'static>(
        self,
        mut response: Response<T>,
        diag: Box<dyn Write + Send>,
    ) -> Response<T> {
        if self != Self::Progress || response.kind() != ResponseKind::Payload {
            return response;
        }
        let cancel = response.cancel_token().clone();
        let first = response.next().await;
        let (mut emitter, wrapped) = channel(ResponseKind::Payload, 1, cancel);
        match first {
            Some(StreamRecord::Payload(payload)) if payload.length() > PROGRESS_MIN_SIZE => {
                let (reader, length) = payload.into_parts();
                debug!(length, "progress indicator attached");
                let reader = ProgressReader::new(reader, length, diag);
                let _ = emitter.emit_payload(Payload::new(Box::new(reader), length)).await;
            }
            Some(StreamRecord::Payload(payload)) => {
                let _ = emitter.emit_payload(payload).await;
            }
            Some(StreamRecord::Error(err)) => {
                let _ = emitter.emit_error(err).await;
            }
            Some(StreamRecord::Item(_)) | None => {}
        }
        emitter.close();
        wrapped
    }

    /// Drain `response` to `out` according to this transform.
    pub async fn run<T, R>(
        self,
        response: Response<T>,
        out: &mut (dyn Write + Send),
        diag: Box<dyn Write + Send>,
        renderer: &R,
    ) -> StreamResult<RenderSummary>
    where
        T: Serialize + Send + 'static,
        R: LineRenderer<T> + Sync + ?Sized,
    {
        match self {
            Self::Passthrough | Self::Progress => {
                let response = self.apply(response, diag).await;
                write_payload(response, out).await
            }
            Self::Lines => {
                let mut diag = diag;
                render_lines(response, out, &mut *diag, renderer).await
            }
            Self::Json => render_json(response, out).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::record::{ErrorKind, RecordError};
    use crate::CancellationToken;
    use std::io::{self, Read};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn payload_response(len: usize) -> Response<()> {
        let (mut tx, rx) = channel(ResponseKind::Payload, 1, CancellationToken::new());
        tokio::spawn(async move {
            tx.emit_payload(Payload::from_bytes(vec![1u8; len])).await.unwrap();
            tx.close();
        });
        rx
    }

    #[test]
    fn selection_table() {
        use OutputMode::*;
        assert_eq!(Transform::select(Interactive, ResponseKind::Payload), Transform::Progress);
        assert_eq!(Transform::select(Binary, ResponseKind::Payload), Transform::Passthrough);
        assert_eq!(Transform::select(Json, ResponseKind::Payload), Transform::Passthrough);
        assert_eq!(Transform::select(Json, ResponseKind::Items), Transform::Json);
        assert_eq!(Transform::select(Text, ResponseKind::Items), Transform::Lines);
        assert_eq!(Transform::select(Interactive, ResponseKind::Items), Transform::Lines);
    }

    #[test]
    fn progress_threshold_is_strict() {
        assert!(!OutputMode::Interactive.needs_progress(PROGRESS_MIN_SIZE));
        assert!(OutputMode::Interactive.needs_progress(PROGRESS_MIN_SIZE + 1));
        assert!(!OutputMode::Binary.needs_progress(PROGRESS_MIN_SIZE + 1));
    }

    #[tokio::test]
    async fn exactly_threshold_gets_no_progress() {
        let diag = SharedBuf::default();
        let rx = payload_response(PROGRESS_MIN_SIZE as usize).await;
        let rx = Transform::Progress.apply(rx, Box::new(diag.clone())).await;
        let mut bytes = Vec::new();
        rx.into_payload()
            .await
            .unwrap()
            .into_reader()
            .read_to_end(&mut bytes)
            .unwrap();
        assert_eq!(bytes.len() as u64, PROGRESS_MIN_SIZE);
        assert!(diag.text().is_empty());
    }

    #[tokio::test]
    async fn one_byte_over_gets_progress() {
        let diag = SharedBuf::default();
        let rx = payload_response(PROGRESS_MIN_SIZE as usize + 1).await;
        let rx = Transform::Progress.apply(rx, Box::new(diag.clone())).await;
        let payload = rx.into_payload().await.unwrap();
        assert_eq!(payload.length(), PROGRESS_MIN_SIZE + 1);
        // Started before the first byte is read.
        assert!(diag.text().contains("  0%"));
        let mut bytes = Vec::new();
        payload.into_reader().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes.len() as u64, PROGRESS_MIN_SIZE + 1);
        assert!(diag.text().contains("100%"));
        assert!(diag.text().ends_with('\n'));
    }

    #[tokio::test]
    async fn passthrough_leaves_payload_alone() {
        let diag = SharedBuf::default();
        let rx = payload_response(PROGRESS_MIN_SIZE as usize + 1).await;
        let mut out = Vec::new();
        let summary = Transform::Passthrough
            .run(rx, &mut out, Box::new(diag.clone()), &NoLines)
            .await
            .unwrap();
        assert_eq!(summary.bytes, PROGRESS_MIN_SIZE + 1);
        assert_eq!(out.len() as u64, PROGRESS_MIN_SIZE + 1);
        assert!(diag.text().is_empty());
    }

    #[tokio::test]
    async fn error_record_survives_progress() {
        let (mut tx, rx) = channel::<()>(ResponseKind::Payload, 1, CancellationToken::new());
        tx.emit_error(RecordError::new(ErrorKind::NotFound, "gone"))
            .await
            .unwrap();
        tx.close();
        let rx = Transform::Progress.apply(rx, Box::new(io::sink())).await;
        assert!(matches!(
            rx.into_payload().await,
            Err(StreamError::Record(e)) if e.kind == ErrorKind::NotFound
        ));
    }

    struct NoLines;

    impl LineRenderer<()> for NoLines {
        fn item(&self, _: &()) -> Option<String> {
            None
        }
    }
}
