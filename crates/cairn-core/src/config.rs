use serde::{Deserialize, Serialize};

use cairn_crypto::{CidBuilder, HashFunction};
use cairn_types::CidFormat;

use crate::command::PutOptions;
use crate::error::{CoreError, CoreResult};

/// Node settings, read from the `[node]` table of a repo's `config.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Records that may wait between a producer and its consumer.
    pub channel_capacity: usize,
    /// Identifier format `put` uses when none is given.
    pub default_format: CidFormat,
    /// Hash function `put` uses when none is given.
    pub default_hash: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            default_format: CidFormat::V0,
            default_hash: HashFunction::SHA2_256.name().to_string(),
        }
    }
}

impl NodeConfig {
    pub fn from_toml(text: &str) -> CoreResult<Self> {
        toml::from_str(text).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.channel_capacity == 0 {
            return Err(CoreError::Config("channel_capacity must be at least 1".into()));
        }
        HashFunction::from_name(&self.default_hash)?;
        // A default put must be able to build an identifier.
        let prefix = PutOptions::default().prefix(self)?;
        CidBuilder::build(&prefix, &[]).map_err(|e| {
            CoreError::Config(format!(
                "default_hash {} cannot be used with default_format: {e}",
                self.default_hash
            ))
        })?;
        Ok(())
    }
}
