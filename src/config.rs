use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::CurieError;
use crate::refresh::{DEFAULT_PAGE_SIZE, DEFAULT_REGISTRY_API_URL};
use crate::resolver::DEFAULT_RESOLVER_URL;
use crate::store::SnapshotStore;

const DEFAULT_CONFIG_FILE: &str = "curie.json";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default)]
    pub resolver_url: Option<String>,
    #[serde(default)]
    pub registry_api_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub snapshot_path: Utf8PathBuf,
    pub resolver_url: String,
    pub registry_api_url: String,
    pub page_size: u32,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `path`, or `curie.json` from the current directory when present.
    /// Without either, defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CurieError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CurieError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CurieError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CurieError> {
        let snapshot_path = match config.snapshot_path {
            Some(path) => Utf8PathBuf::from(path),
            None => SnapshotStore::default_path()?,
        };
        let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(CurieError::ConfigParse(
                "page_size must be greater than zero".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            snapshot_path,
            resolver_url: config
                .resolver_url
                .unwrap_or_else(|| DEFAULT_RESOLVER_URL.to_string()),
            registry_api_url: config
                .registry_api_url
                .unwrap_or_else(|| DEFAULT_REGISTRY_API_URL.to_string()),
            page_size,
        })
    }
}
