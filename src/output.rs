use std::io::{self, Write};

use serde::Serialize;

use crate::domain::NamespaceRecord;
use crate::refresh::RefreshSummary;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

/// Outcome of resolving one CLI argument.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedItem {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_items(items: &[ResolvedItem]) -> io::Result<()> {
        Self::print_json(&items)
    }

    pub fn print_namespace(record: &NamespaceRecord) -> io::Result<()> {
        Self::print_json(record)
    }

    pub fn print_namespaces(records: &[NamespaceRecord]) -> io::Result<()> {
        Self::print_json(&records)
    }

    pub fn print_refresh(summary: &RefreshSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
