use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use regex::Regex;
use serde_json::Value;
use tempfile::Builder;

use crate::domain::NamespaceRecord;
use crate::error::CurieError;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Anything that can hand over the full set of namespace records.
pub trait NamespaceSource: Send + Sync {
    fn load(&self) -> Result<Vec<NamespaceRecord>, CurieError>;
}

/// A namespace record, optionally carrying its compiled identifier pattern.
#[derive(Debug, Clone)]
pub struct Namespace {
    pub record: NamespaceRecord,
    pub compiled_pattern: Option<Regex>,
}

impl Namespace {
    /// Whether `accession` matches the namespace pattern, if one was compiled.
    pub fn matches(&self, accession: &str) -> Option<bool> {
        self.compiled_pattern
            .as_ref()
            .map(|pattern| pattern.is_match(accession))
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: Utf8PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<Utf8PathBuf, CurieError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.home_dir()
                        .join(".cache")
                        .join("curie-resolver")
                        .join("namespaces.json"),
                )
                .ok()
            })
            .ok_or_else(|| CurieError::Filesystem("unable to resolve cache directory".to_string()))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn load_namespaces(&self, compile_patterns: bool) -> Result<Vec<Namespace>, CurieError> {
        let records = self.read_records()?;
        records
            .into_iter()
            .map(|record| {
                let compiled_pattern = if compile_patterns {
                    let regex = Regex::new(&record.pattern).map_err(|err| {
                        CurieError::defect(&record.prefix, format!("invalid pattern: {err}"))
                    })?;
                    Some(regex)
                } else {
                    None
                };
                Ok(Namespace {
                    record,
                    compiled_pattern,
                })
            })
            .collect()
    }

    pub fn write_snapshot(path: &Utf8Path, records: &[NamespaceRecord]) -> Result<(), CurieError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| CurieError::Filesystem(err.to_string()))?;
        let mut content = serde_json::to_string_pretty(records)
            .map_err(|err| CurieError::Filesystem(err.to_string()))?;
        content.push('\n');

        let mut temp = Builder::new()
            .prefix("curie-snapshot")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| CurieError::Filesystem(err.to_string()))?;
        temp.write_all(content.as_bytes())
            .map_err(|err| CurieError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| CurieError::Filesystem(err.to_string()))?;
        Ok(())
    }

    fn read_records(&self) -> Result<Vec<NamespaceRecord>, CurieError> {
        let content = fs::read_to_string(self.path.as_std_path())
            .map_err(|err| self.unavailable(err.to_string()))?;
        let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&content);
        let value: Value =
            serde_json::from_str(content).map_err(|err| self.unavailable(err.to_string()))?;
        let Value::Array(items) = value else {
            return Err(self.unavailable("top-level value is not an array"));
        };

        let mut records = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                return Err(self.unavailable(format!("element {position} is not an object")));
            }
            let record: NamespaceRecord = serde_json::from_value(item)
                .map_err(|err| self.unavailable(format!("element {position}: {err}")))?;
            if record.prefix.is_empty() {
                return Err(self.unavailable(format!("element {position} has an empty prefix")));
            }
            records.push(record);
        }
        tracing::debug!(path = %self.path, count = records.len(), "loaded namespace snapshot");
        Ok(records)
    }

    fn unavailable(&self, reason: impl Into<String>) -> CurieError {
        CurieError::RegistryUnavailable {
            path: self.path.to_string(),
            reason: reason.into(),
        }
    }
}

impl NamespaceSource for SnapshotStore {
    fn load(&self) -> Result<Vec<NamespaceRecord>, CurieError> {
        self.read_records()
    }
}

/// In-memory registry, for embedding a fixed namespace set.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<NamespaceRecord>);

impl NamespaceSource for StaticSource {
    fn load(&self) -> Result<Vec<NamespaceRecord>, CurieError> {
        Ok(self.0.clone())
    }
}
