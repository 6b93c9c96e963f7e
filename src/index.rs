use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, OnceLock};

use crate::domain::NamespaceRecord;
use crate::error::CurieError;
use crate::store::NamespaceSource;

/// Namespace records keyed by lower-cased `curiePrefix`.
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    by_prefix: HashMap<String, NamespaceRecord>,
}

impl PrefixIndex {
    /// Build the index, rejecting the whole registry on an empty or
    /// case-insensitively duplicated `curiePrefix`.
    pub fn build(records: Vec<NamespaceRecord>) -> Result<Self, CurieError> {
        let mut by_prefix = HashMap::with_capacity(records.len());
        for record in records {
            if record.curie_prefix.is_empty() {
                return Err(CurieError::defect(&record.prefix, "empty curiePrefix"));
            }
            match by_prefix.entry(record.index_key()) {
                Entry::Occupied(existing) => {
                    let existing: &NamespaceRecord = existing.get();
                    return Err(CurieError::defect(
                        &record.prefix,
                        format!(
                            "curiePrefix {} collides with namespace {}",
                            record.curie_prefix, existing.prefix
                        ),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }
        Ok(Self { by_prefix })
    }

    pub fn lookup(&self, prefix: &str) -> Option<&NamespaceRecord> {
        self.by_prefix.get(&prefix.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }

    /// Records ordered by index key.
    pub fn iter(&self) -> impl Iterator<Item = &NamespaceRecord> {
        let mut keys: Vec<_> = self.by_prefix.keys().collect();
        keys.sort();
        keys.into_iter().map(move |key| &self.by_prefix[key])
    }
}

/// Builds a [`PrefixIndex`] from its source at most once and keeps it.
///
/// Failed builds are not cached.
pub struct IndexCache<S: NamespaceSource> {
    source: S,
    index: OnceLock<Arc<PrefixIndex>>,
    build_lock: Mutex<()>,
}

impl<S: NamespaceSource> IndexCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            index: OnceLock::new(),
            build_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_built(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<PrefixIndex>, CurieError> {
        if let Some(index) = self.index.get() {
            return Ok(Arc::clone(index));
        }

        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(index) = self.index.get() {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(PrefixIndex::build(self.source.load()?)?);
        tracing::debug!(namespaces = index.len(), "built prefix index");
        let _ = self.index.set(Arc::clone(&index));
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn record(prefix: &str, curie_prefix: &str) -> NamespaceRecord {
        NamespaceRecord {
            prefix: prefix.to_string(),
            mir_id: String::new(),
            name: prefix.to_string(),
            pattern: String::new(),
            description: String::new(),
            sample_id: None,
            namespace_embedded_in_lui: prefix != curie_prefix,
            curie_prefix: curie_prefix.to_string(),
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let index = PrefixIndex::build(vec![record("chebi", "CHEBI"), record("doi", "doi")]).unwrap();
        assert_eq!(index.lookup("ChEbI").unwrap().curie_prefix, "CHEBI");
        assert_eq!(index.lookup("DOI").unwrap().prefix, "doi");
        assert!(index.lookup("pmid").is_none());
    }

    #[test]
    fn duplicate_prefix_rejects_build() {
        let err = PrefixIndex::build(vec![record("go", "GO"), record("go2", "go")]).unwrap_err();
        assert_matches!(err, CurieError::RegistryDataDefect { prefix, .. } if prefix == "go2");
    }

    #[test]
    fn empty_curie_prefix_rejects_build() {
        let err = PrefixIndex::build(vec![record("doi", "")]).unwrap_err();
        assert_matches!(err, CurieError::RegistryDataDefect { .. });
    }

    #[test]
    fn iter_is_sorted() {
        let index = PrefixIndex::build(vec![record("pmid", "pmid"), record("doi", "doi")]).unwrap();
        let prefixes: Vec<_> = index.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["doi", "pmid"]);
    }
}
