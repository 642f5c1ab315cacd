//! Repository content provider.
//!
//! The pipeline needs exactly three operations from whatever hosts the
//! repository: resolve an identifier into a descriptor, test whether a file
//! exists, and fetch a file's decoded text. [`RepoContentProvider`] is that
//! contract; [`GithubProvider`] implements it against the GitHub REST API.
//! Tests inject hand-rolled in-memory implementations instead.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("toolspec-audit/", env!("CARGO_PKG_VERSION"));

/// Structured descriptor of a resolved repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub clone_url: String,
    pub html_url: String,
    pub default_branch: String,
}

/// The three operations the check pipeline consumes. Host-agnostic: the
/// GitHub flavor lives entirely inside [`GithubProvider`].
#[async_trait]
pub trait RepoContentProvider: Send + Sync {
    /// Resolve a repository identifier (URL, `git@` SSH form, or bare
    /// `owner/name`) into a descriptor.
    async fn resolve_repo(&self, identifier: &str) -> Result<RepoInfo, ProviderError>;

    /// Whether `path` exists in the repository (relative to the root).
    async fn file_exists(&self, repo: &RepoInfo, path: &str) -> Result<bool, ProviderError>;

    /// Fetch and decode the full text content of `path`.
    async fn fetch_file(&self, repo: &RepoInfo, path: &str) -> Result<String, ProviderError>;
}

/// Parse a repository identifier into `(owner, name)`.
///
/// Accepted forms:
/// - `https://github.com/owner/name` (optional `.git`, trailing path segments
///   ignored)
/// - `git@github.com:owner/name.git`
/// - `owner/name`
pub fn parse_repo_identifier(identifier: &str) -> Result<(String, String), ProviderError> {
    let raw = identifier.trim();
    if raw.is_empty() {
        return Err(ProviderError::InvalidIdentifier(identifier.to_string()));
    }

    let path = if let Some(rest) = raw.strip_prefix("git@") {
        // git@github.com:owner/name.git
        rest.split_once(':')
            .map(|(_, p)| p)
            .ok_or_else(|| ProviderError::InvalidIdentifier(identifier.to_string()))?
    } else if let Some(idx) = raw.find("://") {
        // https://github.com/owner/name[...]
        let after_scheme = &raw[idx + 3..];
        after_scheme
            .split_once('/')
            .map(|(_, p)| p)
            .ok_or_else(|| ProviderError::InvalidIdentifier(identifier.to_string()))?
    } else {
        raw
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next();
    let name = segments.next();
    match (owner, name) {
        (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => {
            let name = name.strip_suffix(".git").unwrap_or(name);
            if name.is_empty() {
                return Err(ProviderError::InvalidIdentifier(identifier.to_string()));
            }
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(ProviderError::InvalidIdentifier(identifier.to_string())),
    }
}

/// GitHub REST implementation of [`RepoContentProvider`].
pub struct GithubProvider {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GithubProvider {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Network {
                status: None,
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = self.token.as_deref() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn get(&self, url: &str, subject: &str) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network {
                status: None,
                message: e.to_string(),
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound(subject.to_string())),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(ProviderError::Network {
                    status: Some(status.as_u16()),
                    message,
                })
            }
            _ => Ok(response),
        }
    }

    fn contents_url(&self, repo: &RepoInfo, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            repo.full_name,
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    full_name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    created_at: Option<String>,
    updated_at: Option<String>,
    clone_url: String,
    html_url: String,
    #[serde(default = "default_branch")]
    default_branch: String,
    owner: OwnerResponse,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[async_trait]
impl RepoContentProvider for GithubProvider {
    async fn resolve_repo(&self, identifier: &str) -> Result<RepoInfo, ProviderError> {
        let (owner, name) = parse_repo_identifier(identifier)?;
        let url = format!("{}/repos/{}/{}", self.api_base, owner, name);
        tracing::debug!(owner = %owner, repo = %name, "resolving repository");

        let response = self.get(&url, &format!("{owner}/{name}")).await?;
        let parsed: RepoResponse =
            response.json().await.map_err(|e| ProviderError::Network {
                status: None,
                message: format!("failed to parse repository response: {e}"),
            })?;

        Ok(RepoInfo {
            owner: parsed.owner.login,
            name: parsed.name,
            full_name: parsed.full_name,
            description: parsed.description,
            language: parsed.language,
            stars: parsed.stargazers_count,
            created_at: parsed.created_at,
            updated_at: parsed.updated_at,
            clone_url: parsed.clone_url,
            html_url: parsed.html_url,
            default_branch: parsed.default_branch,
        })
    }

    async fn file_exists(&self, repo: &RepoInfo, path: &str) -> Result<bool, ProviderError> {
        let url = self.contents_url(repo, path);
        match self.get(&url, path).await {
            Ok(_) => Ok(true),
            Err(ProviderError::NotFound(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    async fn fetch_file(&self, repo: &RepoInfo, path: &str) -> Result<String, ProviderError> {
        let url = self.contents_url(repo, path);
        let response = self.get(&url, path).await?;
        let parsed: ContentResponse =
            response.json().await.map_err(|e| ProviderError::Network {
                status: None,
                message: format!("failed to parse contents response: {e}"),
            })?;

        if parsed.encoding != "base64" {
            return Err(ProviderError::Decode {
                path: path.to_string(),
                message: format!("unexpected encoding {:?}", parsed.encoding),
            });
        }

        // The contents API wraps base64 payloads at 60 columns.
        let compact: String = parsed
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = BASE64.decode(compact).map_err(|e| ProviderError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| ProviderError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_https_url() {
        let (owner, name) = parse_repo_identifier("https://github.com/hydrocode-de/tool-runner").unwrap();
        assert_eq!(owner, "hydrocode-de");
        assert_eq!(name, "tool-runner");
    }

    #[test]
    fn parses_https_url_with_git_suffix_and_trailing_path() {
        let (owner, name) =
            parse_repo_identifier("https://github.com/owner/repo.git").unwrap();
        assert_eq!((owner.as_str(), name.as_str()), ("owner", "repo"));

        let (owner, name) =
            parse_repo_identifier("https://github.com/owner/repo/tree/main/src").unwrap();
        assert_eq!((owner.as_str(), name.as_str()), ("owner", "repo"));
    }

    #[test]
    fn parses_ssh_form() {
        let (owner, name) = parse_repo_identifier("git@github.com:owner/repo.git").unwrap();
        assert_eq!((owner.as_str(), name.as_str()), ("owner", "repo"));
    }

    #[test]
    fn parses_bare_owner_name() {
        let (owner, name) = parse_repo_identifier("owner/repo").unwrap();
        assert_eq!((owner.as_str(), name.as_str()), ("owner", "repo"));
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(
            parse_repo_identifier("just-a-name"),
            Err(ProviderError::InvalidIdentifier(_))
        );
        assert_matches!(
            parse_repo_identifier(""),
            Err(ProviderError::InvalidIdentifier(_))
        );
        assert_matches!(
            parse_repo_identifier("https://github.com"),
            Err(ProviderError::InvalidIdentifier(_))
        );
    }
}
