//! End-to-end export tests: run the pipeline against the in-memory provider
//! and feed the resulting unified metadata through every exporter.

mod support;

use std::sync::Arc;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use support::{CITATION_CFF, InMemoryProvider, MIT_LICENSE, TOOL_YAML, python_repo};
use toolspec_audit::export::{
    CodeMetaExporter, CwlConfig, CwlExporter, CwlVersion, DoapConfig, DoapExporter, Exporter,
    GalaxyExporter, RdfFormat, SchemaOrgExporter,
};
use toolspec_audit::metadata::UnifiedSoftwareMetadata;
use toolspec_audit::pipeline::{AnalysisRunner, AnalysisStatus};

async fn analyzed_metadata() -> UnifiedSoftwareMetadata {
    let provider = InMemoryProvider::new(python_repo())
        .with_file("src/tool.yml", TOOL_YAML)
        .with_file("CITATION.cff", CITATION_CFF)
        .with_file("LICENSE", MIT_LICENSE)
        .with_file("Dockerfile", "FROM python:3.12\nCMD [\"python\", \"/src/run.py\"]\n");
    let state = AnalysisRunner::new(Arc::new(provider)).run("owner/repo", None).await;
    assert_eq!(state.status, AnalysisStatus::Completed);
    state.metadata.expect("unified metadata")
}

#[tokio::test]
async fn codemeta_document_is_valid_jsonld() {
    let meta = analyzed_metadata().await;
    let out = CodeMetaExporter.export(&meta, &()).unwrap();
    let doc: JsonValue = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["@context"], "https://doi.org/10.5063/schema/codemeta-2.0");
    assert_eq!(doc["name"], "MyTool");
    assert_eq!(doc["version"], "1.4.0");
    assert_eq!(doc["author"][0]["familyName"], "Doe");
}

#[tokio::test]
async fn schemaorg_document_is_valid_jsonld() {
    let meta = analyzed_metadata().await;
    assert!(SchemaOrgExporter.validate(&meta, &()).is_empty());
    let out = SchemaOrgExporter.export(&meta, &()).unwrap();
    let doc: JsonValue = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["@type"], "SoftwareApplication");
    assert_eq!(doc["license"], "https://spdx.org/licenses/MIT");
}

#[tokio::test]
async fn galaxy_export_uses_the_scaffold_from_analysis() {
    let meta = analyzed_metadata().await;
    let config = Some(meta.galaxy_defaults.clone());
    assert!(
        GalaxyExporter.validate(&meta, &config).is_empty(),
        "scaffold with a Dockerfile command should validate"
    );
    let xml = GalaxyExporter.export(&meta, &config).unwrap();
    assert!(xml.contains("<command>python /src/run.py</command>"));
    assert!(xml.contains("ghcr.io/owner/repo:latest"));
}

#[tokio::test]
async fn galaxy_validate_and_export_are_independent() {
    // Concrete scenario: empty command fails validate(), export() still
    // produces a document with an empty command element.
    let meta = analyzed_metadata().await;
    let mut config = meta.galaxy_defaults.clone();
    config.command = String::new();
    let config = Some(config);

    let issues = GalaxyExporter.validate(&meta, &config);
    assert!(issues.iter().any(|i| i == "Command is required for Galaxy export"));

    let xml = GalaxyExporter.export(&meta, &config).unwrap();
    assert!(xml.contains("<command></command>"));
}

#[tokio::test]
async fn cwl_versions_differ_in_metadata_embedding() {
    let meta = analyzed_metadata().await;

    let v12 = CwlExporter.export(&meta, &CwlConfig::default()).unwrap();
    let doc: YamlValue = serde_yaml::from_str(&v12).unwrap();
    assert_eq!(doc["cwlVersion"], YamlValue::from("v1.2"));
    assert!(doc.get("$namespaces").is_some());

    let v11 = CwlExporter
        .export(
            &meta,
            &CwlConfig {
                cwl_version: CwlVersion::V1_1,
                ..Default::default()
            },
        )
        .unwrap();
    let doc: YamlValue = serde_yaml::from_str(&v11).unwrap();
    assert_eq!(doc["cwlVersion"], YamlValue::from("v1.1"));
    assert!(doc.get("$namespaces").is_none());
    assert!(doc["doc"].as_str().unwrap().contains("Version: 1.4.0"));
}

#[tokio::test]
async fn doap_serialization_formats_are_selectable() {
    let meta = analyzed_metadata().await;

    let turtle = DoapExporter.export(&meta, &DoapConfig::default()).unwrap();
    assert!(turtle.starts_with("@prefix"));
    assert!(turtle.contains("doap:maintainer"));

    let rdfxml = DoapExporter
        .export(
            &meta,
            &DoapConfig {
                maintainer: None,
                format: RdfFormat::Rdfxml,
            },
        )
        .unwrap();
    assert!(rdfxml.starts_with("<?xml"));
    assert!(rdfxml.contains("<doap:name>MyTool</doap:name>"));
}

#[tokio::test]
async fn all_exports_are_byte_identical_on_repeat() {
    let meta = analyzed_metadata().await;
    let galaxy_config = Some(meta.galaxy_defaults.clone());
    let cwl_config = CwlConfig::default();
    let doap_config = DoapConfig::default();

    assert_eq!(
        CodeMetaExporter.export(&meta, &()).unwrap(),
        CodeMetaExporter.export(&meta, &()).unwrap()
    );
    assert_eq!(
        SchemaOrgExporter.export(&meta, &()).unwrap(),
        SchemaOrgExporter.export(&meta, &()).unwrap()
    );
    assert_eq!(
        GalaxyExporter.export(&meta, &galaxy_config).unwrap(),
        GalaxyExporter.export(&meta, &galaxy_config).unwrap()
    );
    assert_eq!(
        CwlExporter.export(&meta, &cwl_config).unwrap(),
        CwlExporter.export(&meta, &cwl_config).unwrap()
    );
    assert_eq!(
        DoapExporter.export(&meta, &doap_config).unwrap(),
        DoapExporter.export(&meta, &doap_config).unwrap()
    );
}
