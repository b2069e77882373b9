//! NexusApi trait and the records exchanged with the service
//!
//! The trait abstracts the Nexus 3 REST endpoints the transfer engine
//! consumes, so the engine can be exercised against mocks.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::admin::{ScriptInfo, ScriptRun};
use crate::error::Result;
use crate::hash::HashAlgorithm;

/// Metadata of one asset as reported by the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Repository-relative path, separated by `/`
    pub path: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub format: String,
    /// Digest by algorithm name (`sha1`, `md5`, ...)
    #[serde(default)]
    pub checksum: BTreeMap<String, serde_json::Value>,
}

impl ArtifactRecord {
    /// Build a record from a raw search item
    ///
    /// Returns `None` only when the item has no string `path`. Other
    /// attributes that are missing, `null` or of an unexpected type are
    /// left empty.
    pub fn from_item(item: &serde_json::Value) -> Option<Self> {
        let path = item.get("path")?.as_str()?.to_string();
        let text = |key: &str| {
            item.get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let checksum = item
            .get("checksum")
            .and_then(serde_json::Value::as_object)
            .map(|digests| {
                digests
                    .iter()
                    .map(|(algorithm, digest)| (algorithm.clone(), digest.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            path,
            download_url: text("downloadUrl"),
            id: text("id"),
            repository: text("repository"),
            format: text("format"),
            checksum,
        })
    }

    /// Hex digest reported by the service for `algorithm`
    pub fn checksum(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.checksum
            .get(algorithm.as_str())
            .and_then(serde_json::Value::as_str)
    }
}

/// One page of `search/assets` results
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Items are kept raw so the lister can discard those without a string path
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

/// Repository format ("recipe") as declared by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryFormat {
    Raw,
    Yum,
    Other(String),
}

impl From<&str> for RepositoryFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "raw" => RepositoryFormat::Raw,
            "yum" => RepositoryFormat::Yum,
            other => RepositoryFormat::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for RepositoryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryFormat::Raw => write!(f, "raw"),
            RepositoryFormat::Yum => write!(f, "yum"),
            RepositoryFormat::Other(name) => write!(f, "{name}"),
        }
    }
}

/// A repository as listed by `GET repositories`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub format: String,
    /// hosted, proxy or group
    #[serde(rename = "type", default)]
    pub repository_type: String,
    #[serde(default)]
    pub url: String,
}

impl RepositoryInfo {
    pub fn format(&self) -> RepositoryFormat {
        RepositoryFormat::from(self.format.as_str())
    }
}

/// Outcome of a single asset deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetDeletion {
    /// 204
    Deleted,
    /// 404: the asset was removed by someone else in the meantime
    AlreadyGone,
}

/// Remote operations needed by the transfer engine
///
/// Implementations map HTTP 401 to [`crate::Error::InvalidCredentials`] on
/// every call. Each call is a single request/response without retries.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait NexusApi: Send + Sync {
    /// List every repository on the service
    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>>;

    /// Fetch one page of assets in `repository`
    ///
    /// A 404 fails with [`crate::Error::Api`].
    async fn search_assets(
        &self,
        repository: &str,
        keyword: Option<String>,
        continuation_token: Option<String>,
    ) -> Result<SearchPage>;

    /// Delete an asset by id
    ///
    /// Statuses other than 204 and 404 fail with [`crate::Error::Api`].
    async fn delete_asset(&self, id: &str) -> Result<AssetDeletion>;

    /// Multipart upload of `source` into a raw repository
    async fn upload_raw(
        &self,
        repository: &str,
        directory: &str,
        filename: &str,
        source: &Path,
    ) -> Result<()>;

    /// Raw-body PUT of `source` to `repository/<repository>/<asset_path>`
    async fn put_asset(&self, repository: &str, asset_path: &str, source: &Path) -> Result<()>;

    /// Stream `url` into `destination`, returning the number of bytes written
    ///
    /// A non-200 response fails with [`crate::Error::Download`].
    async fn download_asset(&self, url: &str, destination: &Path) -> Result<u64>;

    /// Whether a script named `name` is stored on the service
    async fn script_exists(&self, name: &str) -> Result<bool>;

    /// Every stored script
    async fn list_scripts(&self) -> Result<Vec<ScriptInfo>>;

    /// Store a new script
    async fn create_script(&self, script: &ScriptInfo) -> Result<()>;

    /// Run a stored script with `data` as its plain-text argument
    async fn run_script(&self, name: &str, data: &str) -> Result<ScriptRun>;

    /// Remove a stored script
    async fn delete_script(&self, name: &str) -> Result<()>;
}
