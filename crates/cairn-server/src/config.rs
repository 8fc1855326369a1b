use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Server settings, read from the `[server]` table of a repo's `config.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest request body `block/put` accepts, in bytes.
    pub max_block_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5001)),
            max_block_size: 2 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:5001".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_block_size, 2 * 1024 * 1024);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: ServerConfig = serde_json::from_str(r#"{"bind_addr":"0.0.0.0:8080"}"#).unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
        assert_eq!(c.max_block_size, 2 * 1024 * 1024);
    }
}
