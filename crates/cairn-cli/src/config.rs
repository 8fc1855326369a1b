use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cairn_core::NodeConfig;
use cairn_server::ServerConfig;
use serde::{Deserialize, Serialize};

pub const REPO_ENV: &str = "CAIRN_PATH";
pub const DEFAULT_REPO: &str = ".cairn";
pub const CONFIG_FILE: &str = "config.toml";

/// Contents of `<repo>/config.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub node: NodeConfig,
    pub server: ServerConfig,
}

impl RepoConfig {
    /// Read the repo's config file; a missing file means defaults.
    pub fn load(repo: &Path) -> anyhow::Result<Self> {
        let path = repo.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

/// The `--repo` flag, else the environment, else the default directory.
pub fn resolve_repo(flag: Option<PathBuf>, env: Option<OsString>) -> PathBuf {
    flag.or_else(|| env.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPO))
}
