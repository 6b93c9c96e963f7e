use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use serde_json::json;

use curie_resolver::capitalization::{CapitalizationStrategy, MinimalSampler};
use curie_resolver::error::CurieError;
use curie_resolver::refresh::{
    PageInfo, RawNamespace, RegistryClient, RegistryHttpClient, RegistryPage, build_records,
    refresh_snapshot,
};
use curie_resolver::resolver::CurieResolver;
use curie_resolver::store::{NamespaceSource, SnapshotStore};

struct FakeRegistry {
    total_pages: u64,
    namespaces: serde_json::Value,
}

impl RegistryClient for FakeRegistry {
    fn fetch_page(&self) -> Result<RegistryPage, CurieError> {
        let namespaces: Vec<RawNamespace> = serde_json::from_value(self.namespaces.clone())
            .map_err(|err| CurieError::RegistryHttp(err.to_string()))?;
        Ok(RegistryPage::new(
            PageInfo {
                size: Some(5000),
                total_elements: Some(namespaces.len() as u64),
                total_pages: self.total_pages,
                number: Some(0),
            },
            namespaces,
            "https://registry.example/restApi/namespaces?size=5000&sort=prefix",
        ))
    }
}

fn upstream() -> serde_json::Value {
    json!([
        {
            "id": 12,
            "prefix": "chebi",
            "mirId": "MIR:00000002",
            "name": "ChEBI",
            "pattern": "^CHEBI:\\d+$",
            "description": "Chemical Entities of Biological Interest",
            "sampleId": "36927",
            "namespaceEmbeddedInLui": true,
            "created": "2019-06-11T14:15:28.654+0000",
            "resources": [{"providerCode": "ebi"}],
            "deprecated": false
        },
        {
            "id": 19,
            "prefix": "doi",
            "mirId": "MIR:00000019",
            "name": "DOI",
            "pattern": "^(doi\\:)?\\d{2}\\.\\d{4}.*$",
            "description": "Digital Object Identifier",
            "sampleId": "10.1038/nbt1156",
            "namespaceEmbeddedInLui": false,
            "deprecated": false
        }
    ])
}

fn snapshot_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("namespaces.json")).unwrap()
}

#[test]
fn refresh_writes_filtered_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = snapshot_path(&dir);
    let client = FakeRegistry {
        total_pages: 1,
        namespaces: upstream(),
    };

    let summary = refresh_snapshot(
        &client,
        &MinimalSampler,
        CapitalizationStrategy::SampleIdFirst,
        &path,
    )
    .unwrap();
    assert_eq!(summary.namespaces, 2);
    assert_eq!(summary.embedded, 1);
    assert!(!summary.truncated);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("resources"));
    assert!(!content.contains("deprecated"));

    let records = SnapshotStore::new(path.clone()).load().unwrap();
    assert_eq!(records[0].curie_prefix, "CHEBI");
    assert_eq!(records[1].curie_prefix, "doi");

    let resolver = CurieResolver::new(SnapshotStore::new(path));
    assert_eq!(resolver.standardize("chebi:36927").unwrap(), "CHEBI:36927");
}

#[test]
fn multi_page_registry_is_truncated_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    let path = snapshot_path(&dir);
    let client = FakeRegistry {
        total_pages: 3,
        namespaces: upstream(),
    };

    let summary = refresh_snapshot(
        &client,
        &MinimalSampler,
        CapitalizationStrategy::SampleIdFirst,
        &path,
    )
    .unwrap();
    assert!(summary.truncated);
    assert_eq!(summary.namespaces, 2);
}

#[test]
fn underivable_prefix_aborts_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = snapshot_path(&dir);
    let client = FakeRegistry {
        total_pages: 1,
        namespaces: json!([{
            "prefix": "broken",
            "mirId": "MIR:99999999",
            "name": "Broken",
            "pattern": "^\\d+$",
            "description": "",
            "sampleId": "1",
            "namespaceEmbeddedInLui": true
        }]),
    };

    let err = refresh_snapshot(
        &client,
        &MinimalSampler,
        CapitalizationStrategy::SampleIdFirst,
        &path,
    )
    .unwrap_err();
    assert_matches!(err, CurieError::RegistryDataDefect { prefix, .. } if prefix == "broken");
    assert!(!path.as_std_path().exists());
}

#[test]
fn colliding_prefixes_abort_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = snapshot_path(&dir);
    let client = FakeRegistry {
        total_pages: 1,
        namespaces: json!([
            {"prefix": "go", "pattern": "^GO:\\d{7}$", "sampleId": "GO:0006915", "namespaceEmbeddedInLui": true},
            {"prefix": "GO", "pattern": "^\\d+$", "namespaceEmbeddedInLui": false}
        ]),
    };

    let err = refresh_snapshot(
        &client,
        &MinimalSampler,
        CapitalizationStrategy::SampleIdFirst,
        &path,
    )
    .unwrap_err();
    assert_matches!(err, CurieError::RegistryDataDefect { .. });
}

#[test]
fn build_records_fills_missing_metadata() {
    let raw: Vec<RawNamespace> = serde_json::from_value(json!([
        {"prefix": "pmid", "pattern": "^\\d+$", "sampleId": null, "namespaceEmbeddedInLui": false}
    ]))
    .unwrap();
    let records = build_records(raw, &MinimalSampler, CapitalizationStrategy::PatternOnly).unwrap();
    assert_eq!(records[0].curie_prefix, "pmid");
    assert_eq!(records[0].name, "");
    assert_eq!(records[0].sample_id, None);
}

#[test]
#[ignore]
fn refresh_from_live_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = snapshot_path(&dir);
    let client = RegistryHttpClient::new().unwrap();
    let summary = refresh_snapshot(
        &client,
        &MinimalSampler,
        CapitalizationStrategy::SampleIdFirst,
        &path,
    )
    .unwrap();
    assert!(summary.namespaces > 500);

    let store = SnapshotStore::new(path);
    assert_eq!(store.load().unwrap().len(), summary.namespaces);
}
