pub mod citation;
pub mod config;
pub mod error;
pub mod export;
pub mod github;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod toolspec;

pub use config::{AuditConfig, CliArgs};
pub use error::{ExportError, MetadataError, ProviderError};
pub use github::{GithubProvider, RepoContentProvider, RepoInfo};
pub use logging::{LoggingConfig, init_logging};
pub use metadata::{UnifiedSoftwareMetadata, build_unified_metadata};
pub use pipeline::{AnalysisRunner, AnalysisState, AnalysisStatus, CheckStatus};
