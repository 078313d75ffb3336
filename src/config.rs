use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

use crate::omdb::OMDB_BASE;

const DEFAULT_ADDR: &str = "127.0.0.1:3147";
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct Config {
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub data_dir: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // A missing key is not fatal: OMDb answers with an error message instead.
        let omdb_api_key = get("OMDB_API_KEY").unwrap_or_else(|| {
            warn!("OMDB_API_KEY is not set; searches will fail with an authorization error");
            String::new()
        });
        let omdb_base_url = get("OMDB_BASE_URL").unwrap_or_else(|| OMDB_BASE.to_string());
        let data_dir = get("QUEUEUP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let addr_raw = get("QUEUEUP_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("QUEUEUP_ADDR '{}' is not a socket address", addr_raw))?;

        Ok(Self {
            omdb_api_key,
            omdb_base_url,
            data_dir,
            addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.omdb_api_key, "");
        assert_eq!(config.omdb_base_url, OMDB_BASE);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.addr.to_string(), "127.0.0.1:3147");
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("OMDB_API_KEY", " abc123 "),
            ("OMDB_BASE_URL", "http://localhost:9000"),
            ("QUEUEUP_DATA_DIR", "/tmp/queueup"),
            ("QUEUEUP_ADDR", "0.0.0.0:8080"),
        ])
        .unwrap();
        assert_eq!(config.omdb_api_key, "abc123");
        assert_eq!(config.omdb_base_url, "http://localhost:9000");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/queueup"));
        assert_eq!(config.addr.port(), 8080);
    }

    #[test]
    fn rejects_bad_address() {
        assert!(config_from(&[("QUEUEUP_ADDR", "not-an-addr")]).is_err());
    }
}
