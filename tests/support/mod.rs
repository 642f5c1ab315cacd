//! Shared fixtures: an in-memory content provider and canned repository
//! material for pipeline and export tests.

#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;

use toolspec_audit::error::ProviderError;
use toolspec_audit::github::{RepoContentProvider, RepoInfo};

/// Hand-rolled in-memory provider. `repo: None` simulates an unresolvable
/// repository; files are keyed by root-relative path.
pub struct InMemoryProvider {
    pub repo: Option<RepoInfo>,
    pub files: HashMap<String, String>,
}

impl InMemoryProvider {
    pub fn new(repo: RepoInfo) -> Self {
        Self {
            repo: Some(repo),
            files: HashMap::new(),
        }
    }

    pub fn unresolvable() -> Self {
        Self {
            repo: None,
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl RepoContentProvider for InMemoryProvider {
    async fn resolve_repo(&self, identifier: &str) -> Result<RepoInfo, ProviderError> {
        self.repo
            .clone()
            .ok_or_else(|| ProviderError::NotFound(identifier.to_string()))
    }

    async fn file_exists(&self, _repo: &RepoInfo, path: &str) -> Result<bool, ProviderError> {
        Ok(self.files.contains_key(path))
    }

    async fn fetch_file(&self, _repo: &RepoInfo, path: &str) -> Result<String, ProviderError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))
    }
}

pub fn python_repo() -> RepoInfo {
    RepoInfo {
        owner: "owner".to_string(),
        name: "repo".to_string(),
        full_name: "owner/repo".to_string(),
        description: Some("A scientific tool repository".to_string()),
        language: Some("Python".to_string()),
        stars: 42,
        created_at: Some("2021-03-01T00:00:00Z".to_string()),
        updated_at: Some("2024-06-01T00:00:00Z".to_string()),
        clone_url: "https://github.com/owner/repo.git".to_string(),
        html_url: "https://github.com/owner/repo".to_string(),
        default_branch: "main".to_string(),
    }
}

pub const TOOL_YAML: &str = r#"
tools:
  mytool:
    title: MyTool
    description: Does X.
    parameters:
      threshold:
        type: float
        min: 0
        max: 1
        default: 0.5
"#;

pub const CITATION_CFF: &str = r#"
cff-version: 1.2.0
title: MyTool
version: 1.4.0
date-released: "2024-01-15"
license: MIT
url: https://example.org/mytool
authors:
  - family-names: Doe
    given-names: Jane
    orcid: https://orcid.org/0000-0002-1825-0097
keywords:
  - hydrology
"#;

pub const MIT_LICENSE: &str = "MIT License\n\nPermission is hereby granted, free of charge...\n";
