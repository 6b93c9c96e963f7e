use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CurieError {
    #[error("curie should be a string, received {kind} instead: {value}")]
    #[diagnostic(code(curie::not_text))]
    NotText { kind: &'static str, value: String },

    #[error("curie must be formatted like `prefix:accession`, received {curie}")]
    #[diagnostic(
        code(curie::malformed),
        help("separate the namespace prefix from the accession with `:`")
    )]
    MalformedCurie { curie: String },

    #[error("prefix {prefix} for {curie} is not a recognized prefix")]
    #[diagnostic(
        code(curie::unrecognized_prefix),
        help("run `curie list` to see registered prefixes or `curie refresh` to update the registry")
    )]
    UnrecognizedPrefix { prefix: String, curie: String },

    #[error("namespace registry unavailable at {path}: {reason}")]
    #[diagnostic(
        code(curie::registry_unavailable),
        help(
            "no snapshot is bundled with the crate; run `curie refresh` once with network access to download the identifiers.org registry"
        )
    )]
    RegistryUnavailable { path: String, reason: String },

    #[error("pattern {pattern} cannot be sampled: {reason}")]
    #[diagnostic(code(curie::invalid_pattern))]
    InvalidPattern { pattern: String, reason: String },

    #[error("registry data defect in namespace {prefix}: {reason}")]
    #[diagnostic(code(curie::registry_defect))]
    RegistryDataDefect { prefix: String, reason: String },

    #[error("registry request failed: {0}")]
    #[diagnostic(code(curie::registry_http))]
    RegistryHttp(String),

    #[error("registry returned status {status}: {message}")]
    #[diagnostic(code(curie::registry_http))]
    RegistryStatus { status: u16, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl CurieError {
    pub(crate) fn defect(prefix: impl Into<String>, reason: impl Into<String>) -> Self {
        CurieError::RegistryDataDefect {
            prefix: prefix.into(),
            reason: reason.into(),
        }
    }
}
