use std::sync::Arc;

use cairn_core::Node;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// HTTP front end of a cairn node.
pub struct CairnServer {
    config: ServerConfig,
    node: Arc<Node>,
}

impl CairnServer {
    pub fn new(config: ServerConfig, node: Arc<Node>) -> Self {
        Self { config, node }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.node.clone(), self.config.clone())
    }

    /// Serve until the process exits.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_until(CancellationToken::new()).await
    }

    /// Serve until `shutdown` fires, then let in-flight requests finish.
    pub async fn serve_until(self, shutdown: CancellationToken) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let addr = listener.local_addr()?;
        info!(%addr, repo = ?self.node.repo(), "cairn server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!(%addr, "cairn server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = CairnServer::new(ServerConfig::default(), Arc::new(Node::in_memory()));
        assert_eq!(server.config().bind_addr, "127.0.0.1:5001".parse().unwrap());
    }

    #[tokio::test]
    async fn stops_when_shutdown_fires() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..ServerConfig::default()
        };
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        CairnServer::new(config, Arc::new(Node::in_memory()))
            .serve_until(shutdown)
            .await
            .unwrap();
    }
}
