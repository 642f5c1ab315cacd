//! Error taxonomy for repository analysis and metadata export.
//!
//! Three families, matching how failures propagate:
//! - [`ProviderError`]: content-provider failures, with a hard distinction
//!   between "the thing does not exist" and "the transport broke"
//! - [`MetadataError`]: precondition failures of the unified metadata builder
//! - [`ExportError`]: hard preconditions violated at export time
//!
//! Structural validation problems (malformed tool.yml, bad CFF content) are
//! deliberately NOT errors in this sense: validators accumulate them into
//! result records and never fail the call.

use thiserror::Error;

/// Failure modes of a [`crate::github::RepoContentProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Repository or file does not exist (HTTP 404 in the GitHub deployment).
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport or unexpected-status failure. `status` is the HTTP status
    /// when one was received, `None` for connection-level failures.
    #[error("network error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// The repository identifier could not be parsed into owner/name.
    #[error("invalid repository identifier: {0}")]
    InvalidIdentifier(String),

    /// File content could not be decoded (bad base64, invalid UTF-8).
    #[error("failed to decode content of {path}: {message}")]
    Decode { path: String, message: String },
}

impl ProviderError {
    /// Whether the failure is worth retrying (transport-level only).
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Network { .. })
    }

    /// Coarse category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            ProviderError::NotFound(_) => "not_found",
            ProviderError::Network { .. } => "network",
            ProviderError::InvalidIdentifier(_) => "identifier",
            ProviderError::Decode { .. } => "decode",
        }
    }
}

/// Precondition failures of the unified metadata builder. The pipeline's
/// required-check gating makes these unreachable in a normal run.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("repository information is required to build unified metadata")]
    MissingRepoInfo,

    #[error("a validated tool spec is required to build unified metadata")]
    MissingToolSpec,
}

/// Hard export-time failures. Soft issues (empty outputs, missing command)
/// are returned from `validate()` instead and never abort `export()`.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{format} export requires a configuration")]
    MissingConfig { format: &'static str },

    #[error("{format} export failed to serialize: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },
}
