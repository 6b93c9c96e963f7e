use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CurieError;

/// One identifiers.org namespace as persisted in the registry snapshot.
///
/// Field order matches the snapshot layout; unknown keys are rejected so a
/// snapshot carrying extra upstream fields is treated as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NamespaceRecord {
    pub prefix: String,
    pub mir_id: String,
    pub name: String,
    pub pattern: String,
    pub description: String,
    pub sample_id: Option<String>,
    pub namespace_embedded_in_lui: bool,
    /// Prefix text a CURIE must start with, including required capitalization.
    pub curie_prefix: String,
}

impl NamespaceRecord {
    pub fn index_key(&self) -> String {
        self.curie_prefix.to_lowercase()
    }
}

/// A raw CURIE split on its first `:`.
///
/// Neither half is validated here: the accession may contain further `:` and
/// an empty prefix is left for the registry lookup to reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Curie {
    prefix: String,
    accession: String,
}

impl Curie {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn accession(&self) -> &str {
        &self.accession
    }

    pub fn lowered_prefix(&self) -> String {
        self.prefix.to_lowercase()
    }
}

impl fmt::Display for Curie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.accession)
    }
}

impl FromStr for Curie {
    type Err = CurieError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (prefix, accession) =
            value
                .split_once(':')
                .ok_or_else(|| CurieError::MalformedCurie {
                    curie: value.to_string(),
                })?;
        Ok(Self {
            prefix: prefix.to_string(),
            accession: accession.to_string(),
        })
    }
}
