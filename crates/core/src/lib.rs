//! nexus3-core: Core library for the nexus3 CLI client
//!
//! This crate provides the core functionality for the nexus3 CLI, including:
//! - Configuration management
//! - Component path parsing and local destination resolution
//! - Paginated, filtered artifact listing
//! - Upload planning and download hash checks
//! - The transfer executor driving upload, download and delete
//! - Repository, script and cleanup policy management
//!
//! This crate is independent of any HTTP library: the remote service is
//! reached through the [`NexusApi`] trait, which keeps the transfer engine
//! testable with mocks.

pub mod admin;
pub mod config;
pub mod error;
pub mod hash;
pub mod listing;
pub mod path;
pub mod plan;
pub mod traits;
pub mod transfer;

pub use config::{ApiVersion, Config, ConfigManager};
pub use error::{Error, Result};
pub use hash::{HashAlgorithm, calculate_hash, should_skip_download};
pub use listing::{SearchQuery, search};
pub use path::{ComponentPath, REMOTE_SEPARATOR, parse_component_path, resolve_local_destination};
pub use plan::{TransferUnit, UploadOptions, plan_upload, upload_subdirectory};
pub use traits::{
    ArtifactRecord, AssetDeletion, NexusApi, RepositoryFormat, RepositoryInfo, SearchPage,
};
pub use transfer::{
    DeleteSummary, DownloadOptions, DownloadSummary, NoProgress, TransferExecutor,
    TransferProgress, UploadStrategy,
};

#[cfg(any(test, feature = "test-export-mocks"))]
pub use traits::MockNexusApi;
