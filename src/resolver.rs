use std::sync::Arc;

use serde_json::Value;

use crate::domain::{Curie, NamespaceRecord};
use crate::error::CurieError;
use crate::index::{IndexCache, PrefixIndex};
use crate::store::NamespaceSource;

pub const DEFAULT_RESOLVER_URL: &str = "https://identifiers.org/";

/// Standardizes CURIEs against a namespace registry.
///
/// The prefix index is built from `source` on first use and reused for the
/// lifetime of the resolver. Only the prefix is checked and recapitalized;
/// accessions are passed through without validation against the namespace
/// pattern.
pub struct CurieResolver<S: NamespaceSource> {
    cache: IndexCache<S>,
    resolver_url: String,
}

impl<S: NamespaceSource> CurieResolver<S> {
    pub fn new(source: S) -> Self {
        Self::with_resolver_url(source, DEFAULT_RESOLVER_URL)
    }

    pub fn with_resolver_url(source: S, resolver_url: &str) -> Self {
        let mut resolver_url = resolver_url.to_string();
        if !resolver_url.ends_with('/') {
            resolver_url.push('/');
        }
        Self {
            cache: IndexCache::new(source),
            resolver_url,
        }
    }

    pub fn resolver_url(&self) -> &str {
        &self.resolver_url
    }

    pub fn source(&self) -> &S {
        self.cache.source()
    }

    pub fn index(&self) -> Result<Arc<PrefixIndex>, CurieError> {
        self.cache.get()
    }

    /// Return `curie` with the capitalization identifiers.org expects.
    pub fn standardize(&self, curie: &str) -> Result<String, CurieError> {
        let parsed: Curie = curie.parse()?;
        let index = self.index()?;
        let namespace = index
            .lookup(parsed.prefix())
            .ok_or_else(|| CurieError::UnrecognizedPrefix {
                prefix: parsed.lowered_prefix(),
                curie: curie.to_string(),
            })?;
        Ok(format!("{}:{}", namespace.curie_prefix, parsed.accession()))
    }

    /// Standardize a dynamically typed value, which must be a JSON string.
    pub fn standardize_value(&self, value: &Value) -> Result<String, CurieError> {
        match value {
            Value::String(curie) => self.standardize(curie),
            other => Err(CurieError::NotText {
                kind: json_kind(other),
                value: other.to_string(),
            }),
        }
    }

    pub fn to_url(&self, curie: &str) -> Result<String, CurieError> {
        let curie = self.standardize(curie)?;
        Ok(format!("{}{curie}", self.resolver_url))
    }

    pub fn lookup(&self, prefix: &str) -> Result<NamespaceRecord, CurieError> {
        self.index()?
            .lookup(prefix)
            .cloned()
            .ok_or_else(|| CurieError::UnrecognizedPrefix {
                prefix: prefix.to_lowercase(),
                curie: prefix.to_string(),
            })
    }

    pub fn namespaces(&self) -> Result<Vec<NamespaceRecord>, CurieError> {
        Ok(self.index()?.iter().cloned().collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::store::StaticSource;

    fn resolver() -> CurieResolver<StaticSource> {
        let records = serde_json::from_value(json!([
            {
                "prefix": "doi",
                "mirId": "MIR:00000019",
                "name": "DOI",
                "pattern": "^(doi\\:)?\\d{2}\\.\\d{4}.*$",
                "description": "Digital Object Identifier",
                "sampleId": "10.1038/nbt1156",
                "namespaceEmbeddedInLui": false,
                "curiePrefix": "doi"
            }
        ]))
        .unwrap();
        CurieResolver::new(StaticSource(records))
    }

    #[test]
    fn standardize_lowercases_known_prefix() {
        assert_eq!(
            resolver().standardize("DOI:10.1000/xyz").unwrap(),
            "doi:10.1000/xyz"
        );
    }

    #[test]
    fn standardize_value_rejects_non_strings() {
        let err = resolver().standardize_value(&json!(42)).unwrap_err();
        assert_matches!(err, CurieError::NotText { kind: "number", .. });
    }

    #[test]
    fn resolver_url_gets_trailing_slash() {
        let resolver = CurieResolver::with_resolver_url(StaticSource::default(), "https://n2t.net");
        assert_eq!(resolver.resolver_url(), "https://n2t.net/");
    }
}
