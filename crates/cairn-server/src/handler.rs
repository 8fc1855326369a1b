use std::io::{self, Read};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use cairn_core::{Command, CommandOutput, CoreError, Node, PutOptions, RemoveOptions};
use cairn_stream::{CancellationToken, Response as ResponseStream, StreamRecord};
use serde_json::json;
use tokio_util::sync::DropGuard;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{ErrorResponse, ServerError, ServerResult};

/// Declared payload length; bodies are streamed without a `Content-Length`.
pub const X_CONTENT_LENGTH: HeaderName = HeaderName::from_static("x-content-length");

/// Bytes read from a payload per body chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<Node>,
    pub config: Arc<ServerConfig>,
}

type Params = Query<Vec<(String, String)>>;

fn args(params: &[(String, String)]) -> Vec<String> {
    params
        .iter()
        .filter(|(k, _)| k == "arg")
        .map(|(_, v)| v.clone())
        .collect()
}

fn first_arg(params: &[(String, String)], name: &str) -> ServerResult<String> {
    args(params)
        .into_iter()
        .next()
        .ok_or_else(|| ServerError::BadRequest(format!("argument \"{name}\" is required")))
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn flag(params: &[(String, String)], name: &str) -> ServerResult<bool> {
    match param(params, name) {
        None | Some("false") | Some("0") => Ok(false),
        Some("") | Some("true") | Some("1") => Ok(true),
        Some(other) => Err(ServerError::BadRequest(format!(
            "option \"{name}\" expects a boolean, got {other:?}"
        ))),
    }
}

/// Run a command whose producer is cancelled when the response body is
/// dropped, for example when the client disconnects.
async fn execute(
    state: &AppState,
    cmd: Command,
) -> ServerResult<(ResponseStream<CommandOutput>, DropGuard)> {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let response = cmd.execute(&state.node, cancel).await?;
    Ok((response, guard))
}

/// Unfold state of an NDJSON body.
struct Lines {
    response: ResponseStream<CommandOutput>,
    _guard: DropGuard,
    bulk: bool,
    failures: usize,
}

/// Newline-delimited JSON body: one object per item or error record.
///
/// A bulk body whose items did not all succeed ends with one more error
/// object, so a client reading the stream learns the request failed.
fn ndjson(response: ResponseStream<CommandOutput>, guard: DropGuard, bulk: bool) -> Response {
    let lines = Lines {
        response,
        _guard: guard,
        bulk,
        failures: 0,
    };
    let stream = futures::stream::unfold(Some(lines), |state| async move {
        let mut lines = state?;
        let line = match lines.response.next().await {
            Some(StreamRecord::Item(item)) => serde_json::to_vec(&item),
            Some(StreamRecord::Error(err)) => {
                lines.failures += 1;
                serde_json::to_vec(&err)
            }
            Some(StreamRecord::Payload(_)) => Ok(Vec::new()),
            None if lines.bulk && lines.failures > 0 => {
                let err = CoreError::NotAllRemoved {
                    failures: lines.failures,
                };
                debug!(failures = lines.failures, "bulk request failed");
                let body = ErrorResponse {
                    message: err.to_string(),
                    kind: err.kind(),
                };
                return Some((encode_line(serde_json::to_vec(&body)), None));
            }
            None => return None,
        };
        Some((encode_line(line), Some(lines)))
    });
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(stream),
    )
        .into_response()
}

fn encode_line(line: serde_json::Result<Vec<u8>>) -> io::Result<Bytes> {
    line.map(|mut line| {
        line.push(b'\n');
        Bytes::from(line)
    })
    .map_err(io::Error::from)
}

/// Raw payload body, read off a blocking thread chunk by chunk.
async fn octets(
    response: ResponseStream<CommandOutput>,
    guard: DropGuard,
) -> ServerResult<Response> {
    let (reader, length) = response.into_payload().await?.into_parts();
    let stream = futures::stream::unfold(Some((reader, guard)), |state| async move {
        let (mut reader, guard) = state?;
        let read = tokio::task::spawn_blocking(move || {
            let mut buf = vec![0u8; CHUNK_SIZE];
            let n = reader.read(&mut buf)?;
            buf.truncate(n);
            Ok::<_, io::Error>((reader, buf))
        })
        .await;
        match read {
            Ok(Ok((_, buf))) if buf.is_empty() => None,
            Ok(Ok((reader, buf))) => Some((Ok(Bytes::from(buf)), Some((reader, guard)))),
            Ok(Err(e)) => Some((Err(e), None)),
            Err(e) => Some((Err(io::Error::other(e)), None)),
        }
    });
    debug!(length, "streaming payload");
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (X_CONTENT_LENGTH, length.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "cairn-server",
        "version": env!("CARGO_PKG_VERSION"),
        "pins": state.node.pins().len(),
        "max_block_size": state.config.max_block_size,
    }))
}

pub async fn block_stat(
    State(state): State<AppState>,
    Query(params): Params,
) -> ServerResult<Response> {
    let key = first_arg(&params, "key")?;
    let (response, guard) = execute(&state, Command::Stat { key }).await?;
    Ok(ndjson(response, guard, false))
}

pub async fn block_get(
    State(state): State<AppState>,
    Query(params): Params,
) -> ServerResult<Response> {
    let key = first_arg(&params, "key")?;
    let (response, guard) = execute(&state, Command::Get { key }).await?;
    octets(response, guard).await
}

pub async fn block_put(
    State(state): State<AppState>,
    Query(params): Params,
    body: Bytes,
) -> ServerResult<Response> {
    let size = body.len() as u64;
    if size > state.config.max_block_size {
        return Err(ServerError::PayloadTooLarge {
            size,
            max: state.config.max_block_size,
        });
    }
    let mhlen = match param(&params, "mhlen") {
        Some(v) => v
            .parse()
            .map_err(|_| ServerError::BadRequest(format!("invalid mhlen: {v}")))?,
        None => PutOptions::default().mhlen,
    };
    let options = PutOptions {
        format: param(&params, "format").map(str::to_string),
        mhtype: param(&params, "mhtype").map(str::to_string),
        mhlen,
    };
    let cmd = Command::Put {
        data: body.to_vec(),
        options,
    };
    let (response, guard) = execute(&state, cmd).await?;
    Ok(ndjson(response, guard, false))
}

pub async fn block_rm(
    State(state): State<AppState>,
    Query(params): Params,
) -> ServerResult<Response> {
    let options = RemoveOptions {
        force: flag(&params, "force")?,
        quiet: flag(&params, "quiet")?,
    };
    let cmd = Command::Rm {
        keys: args(&params),
        options,
    };
    let (response, guard) = execute(&state, cmd).await?;
    Ok(ndjson(response, guard, true))
}

pub async fn cat(
    State(state): State<AppState>,
    Query(params): Params,
) -> ServerResult<Response> {
    let cmd = Command::Cat {
        paths: args(&params),
    };
    let (response, guard) = execute(&state, cmd).await?;
    octets(response, guard).await
}
