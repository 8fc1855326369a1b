//! HTTP server for cairn.
//!
//! Exposes the block commands under `/api/v0`. Item responses are streamed
//! as newline-delimited JSON while the producer is still running; payload
//! responses are streamed as raw bytes with the declared length in an
//! `X-Content-Length` header. Dropping a response body cancels its producer.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ErrorResponse, ServerError, ServerResult};
pub use handler::{AppState, X_CONTENT_LENGTH};
pub use router::build_router;
pub use server::CairnServer;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use cairn_core::Node;
    use cairn_types::parse_cid;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn app() -> (Arc<Node>, Router) {
        let node = Arc::new(Node::in_memory());
        let router = build_router(node.clone(), ServerConfig::default());
        (node, router)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Vec<u8>,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes.to_vec())
    }

    fn json_lines(body: &[u8]) -> Vec<Value> {
        std::str::from_utf8(body)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    async fn put(app: &Router, data: &[u8]) -> String {
        let (status, _, body) = send(app, "POST", "/api/v0/block/put", data.to_vec()).await;
        assert_eq!(status, StatusCode::OK);
        let lines = json_lines(&body);
        lines[0]["Key"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (_, app) = app();
        let (status, _, _) = send(&app, "GET", "/v1/health", vec![]).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (_, app) = app();
        let (status, _, body) = send(&app, "GET", "/v1/info", vec![]).await;
        assert_eq!(status, 200);
        let info: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(info["name"], "cairn-server");
    }

    #[tokio::test]
    async fn put_stat_get() {
        let (_, app) = app();
        let key = put(&app, b"hello").await;

        let (status, _, body) =
            send(&app, "POST", &format!("/api/v0/block/stat?arg={key}"), vec![]).await;
        assert_eq!(status, 200);
        let lines = json_lines(&body);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["Key"], key.as_str());
        assert_eq!(lines[0]["Size"], 5);

        let (status, headers, body) =
            send(&app, "POST", &format!("/api/v0/block/get?arg={key}"), vec![]).await;
        assert_eq!(status, 200);
        assert_eq!(headers[&X_CONTENT_LENGTH], "5");
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn put_with_options() {
        let (_, app) = app();
        let (status, _, body) = send(
            &app,
            "POST",
            "/api/v0/block/put?format=raw&mhtype=sha2-512&mhlen=32",
            b"opts".to_vec(),
        )
        .await;
        assert_eq!(status, 200);
        let key = json_lines(&body)[0]["Key"].as_str().unwrap().to_string();
        // CIDv1 strings are base32 with a leading 'b'.
        assert!(key.starts_with('b'));
    }

    #[tokio::test]
    async fn input_errors_are_400() {
        let (_, app) = app();
        let (status, _, body) = send(&app, "POST", "/api/v0/block/stat?arg=", vec![]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["Message"], "zero length cid invalid");
        assert_eq!(err["Kind"], "input");

        let (status, _, _) = send(&app, "POST", "/api/v0/block/stat", vec![]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) =
            send(&app, "POST", "/api/v0/block/put?format=yaml", b"x".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["Message"], "unrecognized format: yaml");
    }

    #[tokio::test]
    async fn missing_block_is_404() {
        let (_, app) = app();
        let key = put(&app, b"short lived").await;
        let (status, _, _) =
            send(&app, "POST", &format!("/api/v0/block/rm?arg={key}"), vec![]).await;
        assert_eq!(status, 200);
        let (status, _, _) =
            send(&app, "POST", &format!("/api/v0/block/get?arg={key}"), vec![]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn oversized_put_is_413() {
        let node = Arc::new(Node::in_memory());
        let config = ServerConfig {
            max_block_size: 4,
            ..ServerConfig::default()
        };
        let app = build_router(node, config);
        let (status, _, _) = send(&app, "POST", "/api/v0/block/put", b"12345".to_vec()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let (status, _, _) = send(&app, "POST", "/api/v0/block/put", b"1234".to_vec()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rm_streams_per_block_outcomes() {
        let (node, app) = app();
        let a = put(&app, b"a").await;
        let b = put(&app, b"b").await;
        node.pins().pin(parse_cid(&b).unwrap()).unwrap();

        let (status, _, body) = send(
            &app,
            "POST",
            &format!("/api/v0/block/rm?arg={a}&arg={b}"),
            vec![],
        )
        .await;
        assert_eq!(status, 200);
        let lines = json_lines(&body);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["Hash"], a.as_str());
        assert_eq!(lines[1]["Subject"], b.as_str());
        assert_eq!(lines[1]["Kind"], "pinned");
        assert_eq!(lines[2]["Message"], "some blocks not removed");
        assert_eq!(lines[2]["Kind"], "internal");
        assert!(lines[2].get("Subject").is_none());

        let (_, _, body) = send(
            &app,
            "POST",
            &format!("/api/v0/block/rm?arg={b}&force=true&quiet=true"),
            vec![],
        )
        .await;
        let lines = json_lines(&body);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["Hash"], b.as_str());
        assert_eq!(lines[0]["Warning"], "pinned");
        assert!(lines[0].get("Size").is_none());
    }

    #[tokio::test]
    async fn cat_concatenates() {
        let (_, app) = app();
        let a = put(&app, b"abc").await;
        let b = put(&app, b"defg").await;
        let (status, headers, body) = send(
            &app,
            "POST",
            &format!("/api/v0/cat?arg=/ipfs/{a}&arg={b}"),
            vec![],
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(headers[&X_CONTENT_LENGTH], "7");
        assert_eq!(body, b"abcdefg");
    }
}
