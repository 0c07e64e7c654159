use anyhow::{bail, Context};
use std::path::PathBuf;

use crate::store::{RecordStore, RestStore, SqliteStore};

pub const WORKSPACE_ENV: &str = "GRADEBOOK_WORKSPACE";
pub const STORE_URL_ENV: &str = "GRADEBOOK_STORE_URL";
pub const STORE_KEY_ENV: &str = "GRADEBOOK_STORE_KEY";
pub const LOG_ENV: &str = "GRADEBOOK_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub remote: Option<RemoteConfig>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace = non_empty(get(WORKSPACE_ENV)).map(PathBuf::from);
        let url = non_empty(get(STORE_URL_ENV));
        let key = non_empty(get(STORE_KEY_ENV));

        let remote = match (url, key) {
            (None, None) => None,
            (Some(url), Some(api_key)) => {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    bail!("{STORE_URL_ENV} must be an http(s) URL, got {url:?}");
                }
                Some(RemoteConfig { url, api_key })
            }
            (Some(_), None) => bail!("{STORE_URL_ENV} is set but {STORE_KEY_ENV} is missing"),
            (None, Some(_)) => bail!("{STORE_KEY_ENV} is set but {STORE_URL_ENV} is missing"),
        };

        Ok(Self { workspace, remote })
    }

    /// Builds the startup store. A remote store wins over a workspace; with
    /// neither, the daemon waits for `workspace.select`.
    pub fn open_store(&self) -> anyhow::Result<Option<Box<dyn RecordStore>>> {
        if let Some(remote) = &self.remote {
            return Ok(Some(Box::new(RestStore::new(&remote.url, &remote.api_key))));
        }
        if let Some(ws) = &self.workspace {
            let store = SqliteStore::open(ws)
                .with_context(|| format!("failed to open workspace {}", ws.display()))?;
            return Ok(Some(Box::new(store)));
        }
        Ok(None)
    }
}
