use std::time::Duration;

use camino::Utf8Path;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::capitalization::{CapitalizationStrategy, PatternSampler, derive_curie_prefix};
use crate::domain::NamespaceRecord;
use crate::error::CurieError;
use crate::index::PrefixIndex;
use crate::store::SnapshotStore;

pub const DEFAULT_REGISTRY_API_URL: &str =
    "https://registry.api.identifiers.org/restApi/namespaces";
pub const DEFAULT_PAGE_SIZE: u32 = 5000;

/// Namespace as served by the registry API, reduced to the snapshot fields.
/// Every other upstream key is dropped during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNamespace {
    pub prefix: String,
    #[serde(default)]
    pub mir_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sample_id: Option<String>,
    #[serde(default)]
    pub namespace_embedded_in_lui: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    pub total_pages: u64,
    #[serde(default)]
    pub number: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct Embedded {
    namespaces: Vec<RawNamespace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryPage {
    pub page: PageInfo,
    #[serde(rename = "_embedded")]
    embedded: Embedded,
    #[serde(skip)]
    pub url: String,
}

impl RegistryPage {
    pub fn new(page: PageInfo, namespaces: Vec<RawNamespace>, url: impl Into<String>) -> Self {
        Self {
            page,
            embedded: Embedded { namespaces },
            url: url.into(),
        }
    }

    pub fn namespaces(&self) -> &[RawNamespace] {
        &self.embedded.namespaces
    }

    pub fn into_namespaces(self) -> Vec<RawNamespace> {
        self.embedded.namespaces
    }
}

pub trait RegistryClient: Send + Sync {
    fn fetch_page(&self) -> Result<RegistryPage, CurieError>;
}

#[derive(Clone)]
pub struct RegistryHttpClient {
    client: Client,
    api_url: String,
    page_size: u32,
}

impl RegistryHttpClient {
    pub fn new() -> Result<Self, CurieError> {
        Self::with_endpoint(DEFAULT_REGISTRY_API_URL, DEFAULT_PAGE_SIZE)
    }

    pub fn with_endpoint(api_url: &str, page_size: u32) -> Result<Self, CurieError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("curie-resolver/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CurieError::RegistryHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| CurieError::RegistryHttp(err.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            page_size,
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, CurieError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "registry request failed".to_string());
        Err(CurieError::RegistryStatus { status, message })
    }
}

impl RegistryClient for RegistryHttpClient {
    fn fetch_page(&self) -> Result<RegistryPage, CurieError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("size", self.page_size.to_string()),
                ("sort", "prefix".to_string()),
            ])
            .send()
            .map_err(|err| CurieError::RegistryHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let url = response.url().to_string();
        let mut page: RegistryPage = response
            .json()
            .map_err(|err| CurieError::RegistryHttp(err.to_string()))?;
        page.url = url;
        Ok(page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub snapshot_path: String,
    pub namespaces: usize,
    pub embedded: usize,
    pub truncated: bool,
}

/// Turn upstream namespaces into snapshot records, computing `curiePrefix`.
///
/// Any namespace without a derivable prefix fails the whole batch.
pub fn build_records(
    raw: Vec<RawNamespace>,
    sampler: &dyn PatternSampler,
    strategy: CapitalizationStrategy,
) -> Result<Vec<NamespaceRecord>, CurieError> {
    raw.into_iter()
        .map(|namespace| {
            if namespace.prefix.is_empty() {
                return Err(CurieError::defect("<empty>", "namespace without a prefix"));
            }
            let pattern = namespace.pattern.unwrap_or_default();
            let curie_prefix = derive_curie_prefix(
                &namespace.prefix,
                &pattern,
                namespace.sample_id.as_deref(),
                namespace.namespace_embedded_in_lui,
                sampler,
                strategy,
            )?;
            Ok(NamespaceRecord {
                prefix: namespace.prefix,
                mir_id: namespace.mir_id.unwrap_or_default(),
                name: namespace.name.unwrap_or_default(),
                pattern,
                description: namespace.description.unwrap_or_default(),
                sample_id: namespace.sample_id,
                namespace_embedded_in_lui: namespace.namespace_embedded_in_lui,
                curie_prefix,
            })
        })
        .collect()
}

/// Download the registry and rewrite the snapshot at `path`.
pub fn refresh_snapshot(
    client: &dyn RegistryClient,
    sampler: &dyn PatternSampler,
    strategy: CapitalizationStrategy,
    path: &Utf8Path,
) -> Result<RefreshSummary, CurieError> {
    let page = client.fetch_page()?;
    let truncated = page.page.total_pages > 1;
    if truncated {
        let page_json = serde_json::to_string(&page.page).unwrap_or_default();
        tracing::warn!(
            url = %page.url,
            page = %page_json,
            "registry refresh does not support multi-page results; snapshot is truncated"
        );
    }

    let records = build_records(page.into_namespaces(), sampler, strategy)?;
    let embedded = records
        .iter()
        .filter(|record| record.namespace_embedded_in_lui)
        .count();
    let count = records.len();
    PrefixIndex::build(records.clone())?;
    SnapshotStore::write_snapshot(path, &records)?;
    tracing::info!(path = %path, namespaces = count, embedded, "wrote namespace snapshot");

    Ok(RefreshSummary {
        snapshot_path: path.to_string(),
        namespaces: count,
        embedded,
        truncated,
    })
}
