//! Upload, download and delete orchestration
//!
//! Every operation is a linear pipeline: parse the component path, build
//! the work list (directory walk or remote listing), then process one item
//! at a time. Nothing runs concurrently; each remote call completes before
//! the next one starts.

use std::path::{MAIN_SEPARATOR, Path};

use futures::TryStreamExt;
use futures::stream::BoxStream;

use crate::error::{Error, Result};
use crate::hash::should_skip_download;
use crate::listing::{SearchQuery, search};
use crate::path::{REMOTE_SEPARATOR, REMOTE_SEPARATOR_STR, parse_component_path, resolve_local_destination};
use crate::plan::{TransferUnit, UploadOptions, plan_upload};
use crate::traits::{ArtifactRecord, AssetDeletion, NexusApi, RepositoryFormat};

/// Observer notified as a batch operation progresses
pub trait TransferProgress: Send + Sync {
    /// Called once the number of items is known
    fn start(&self, label: &str, total: u64);
    /// Called after each item, whatever its outcome
    fn advance(&self, item: &str);
    fn finish(&self);
}

/// Progress observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn start(&self, _label: &str, _total: u64) {}
    fn advance(&self, _item: &str) {}
    fn finish(&self) {}
}

/// Upload protocol used for a repository format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    /// Multipart form POST to the components endpoint
    Raw,
    /// Raw body PUT under the repository's content path
    Yum,
}

impl UploadStrategy {
    pub fn for_format(format: &RepositoryFormat) -> Result<Self> {
        match format {
            RepositoryFormat::Raw => Ok(UploadStrategy::Raw),
            RepositoryFormat::Yum => Ok(UploadStrategy::Yum),
            RepositoryFormat::Other(name) => Err(Error::NotImplemented(format!(
                "Upload to {name} repository not supported"
            ))),
        }
    }

    pub async fn upload(&self, api: &dyn NexusApi, unit: &TransferUnit) -> Result<()> {
        let filename = unit.remote_filename();
        match self {
            UploadStrategy::Raw => {
                // A leading separator is treated as "no directory", not as the root
                let directory = match unit.directory.as_deref() {
                    Some(directory) if !directory.is_empty() && !directory.starts_with(REMOTE_SEPARATOR) => {
                        directory
                    }
                    _ => {
                        return Err(Error::InvalidPath(
                            "Destination path does not contain a directory, which is required by raw repositories"
                                .to_string(),
                        ));
                    }
                };
                api.upload_raw(&unit.repository, directory, &filename, &unit.source)
                    .await
            }
            UploadStrategy::Yum => {
                let asset_path = unit
                    .directory
                    .as_deref()
                    .unwrap_or_default()
                    .split(REMOTE_SEPARATOR)
                    .chain(std::iter::once(filename.as_str()))
                    .filter(|segment| !segment.is_empty())
                    .collect::<Vec<_>>()
                    .join(REMOTE_SEPARATOR_STR);
                api.put_asset(&unit.repository, &asset_path, &unit.source)
                    .await
            }
        }
    }
}

/// Options for [`TransferExecutor::download`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Do not reproduce the remote directory structure locally
    pub flatten: bool,
    /// Always download, replacing local copies
    pub no_cache: bool,
}

/// Outcome of a download batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    /// Local copy already up-to-date
    pub skipped: usize,
    /// Per-item failures that were logged and passed over
    pub failed: usize,
    /// Bytes written by the downloads performed
    pub bytes: u64,
}

impl DownloadSummary {
    /// Artifacts now present locally
    pub fn count(&self) -> usize {
        self.downloaded + self.skipped
    }
}

/// Outcome of a delete batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSummary {
    Deleted(usize),
    /// The service rejected a deletion and the batch stopped there
    Aborted,
}

impl DeleteSummary {
    /// Count with `-1` standing for an aborted batch
    pub fn as_count(&self) -> i64 {
        match self {
            DeleteSummary::Deleted(count) => i64::try_from(*count).unwrap_or(i64::MAX),
            DeleteSummary::Aborted => -1,
        }
    }
}

static NO_PROGRESS: NoProgress = NoProgress;

/// Calls [`TransferProgress::finish`] when dropped, whichever way the
/// batch ends
struct FinishOnDrop<'p>(&'p dyn TransferProgress);

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Drives transfers between the local filesystem and a Nexus service
pub struct TransferExecutor<'a> {
    api: &'a dyn NexusApi,
    progress: &'a dyn TransferProgress,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(api: &'a dyn NexusApi) -> Self {
        Self {
            api,
            progress: &NO_PROGRESS,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn TransferProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Artifacts under `repository_path`, as a lazy stream
    pub async fn list(&self, repository_path: &str) -> Result<BoxStream<'a, Result<ArtifactRecord>>> {
        let query = SearchQuery::from_component_path(&parse_component_path(repository_path)?);
        search(self.api, &query).await
    }

    async fn collect(&self, repository_path: &str) -> Result<Vec<ArtifactRecord>> {
        self.list(repository_path).await?.try_collect().await
    }

    async fn upload_strategy(&self, repository: &str) -> Result<UploadStrategy> {
        let repositories = self.api.list_repositories().await?;
        let info = repositories
            .iter()
            .find(|info| info.name == repository)
            .ok_or_else(|| Error::InvalidRepository(repository.to_string()))?;
        UploadStrategy::for_format(&info.format())
    }

    /// Upload a local file or directory, returning the number of files sent
    ///
    /// The first failing file aborts the batch.
    pub async fn upload(&self, source: &Path, destination: &str, options: UploadOptions) -> Result<usize> {
        let destination = parse_component_path(destination)?;
        let units = plan_upload(source, &destination, options)?;
        if units.is_empty() {
            return Ok(0);
        }

        let strategy = self.upload_strategy(&destination.repository).await?;
        tracing::debug!(repository = %destination.repository, ?strategy, files = units.len(), "Uploading");

        self.progress.start("Uploading", units.len() as u64);
        let _finish = FinishOnDrop(self.progress);
        for unit in &units {
            strategy.upload(self.api, unit).await?;
            self.progress.advance(&unit.remote_filename());
        }

        Ok(units.len())
    }

    /// Download the artifacts selected by `source` into `destination`
    ///
    /// Artifacts whose local copy matches the reported checksum are
    /// skipped. A failure on one artifact is logged and the batch goes on;
    /// credential and connection failures still abort.
    pub async fn download(
        &self,
        source: &str,
        destination: &str,
        options: DownloadOptions,
    ) -> Result<DownloadSummary> {
        let mut destination = destination.to_string();
        // "." also covers ".."
        if source.ends_with(REMOTE_SEPARATOR) && !destination.ends_with('.') {
            destination.push(MAIN_SEPARATOR);
        }

        let artifacts = self.collect(source).await?;
        let mut summary = DownloadSummary::default();

        self.progress.start("Downloading", artifacts.len() as u64);
        let _finish = FinishOnDrop(self.progress);
        for artifact in &artifacts {
            let local_path = resolve_local_destination(&artifact.path, &destination, options.flatten, true)?;

            if should_skip_download(&artifact.download_url, &local_path, artifact, options.no_cache).await? {
                summary.skipped += 1;
                self.progress.advance(&artifact.path);
                continue;
            }

            match self.api.download_asset(&artifact.download_url, &local_path).await {
                Ok(bytes) => {
                    tracing::debug!(url = %artifact.download_url, path = %local_path.display(), bytes, "Downloaded");
                    summary.downloaded += 1;
                    summary.bytes += bytes;
                }
                Err(e @ (Error::Download(_) | Error::Api(_))) => {
                    tracing::warn!(url = %artifact.download_url, error = %e, "Error downloading");
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
            self.progress.advance(&artifact.path);
        }

        Ok(summary)
    }

    /// Delete the artifacts selected by `repository_path`
    ///
    /// Artifacts already gone still count as deleted. Any other rejection
    /// stops the batch and yields [`DeleteSummary::Aborted`].
    pub async fn delete(&self, repository_path: &str) -> Result<DeleteSummary> {
        let artifacts = self.collect(repository_path).await?;
        let mut deleted = 0;

        self.progress.start("Deleting", artifacts.len() as u64);
        let _finish = FinishOnDrop(self.progress);
        for artifact in &artifacts {
            match self.api.delete_asset(&artifact.id).await {
                Ok(AssetDeletion::Deleted) => {
                    tracing::info!(path = %artifact.path, "Deleted");
                }
                Ok(AssetDeletion::AlreadyGone) => {
                    tracing::warn!(path = %artifact.path, "File not found; assuming it was already deleted");
                }
                Err(Error::Api(reason)) => {
                    tracing::error!(path = %artifact.path, %reason, "Delete rejected, aborting");
                    return Ok(DeleteSummary::Aborted);
                }
                Err(e) => return Err(e),
            }
            deleted += 1;
            self.progress.advance(&artifact.path);
        }

        Ok(DeleteSummary::Deleted(deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockNexusApi, RepositoryInfo, SearchPage};
    use mockall::predicate::{always, eq, function};
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const ABC_SHA1: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";

    fn repositories() -> Vec<RepositoryInfo> {
        [("files", "raw"), ("rpms", "yum"), ("jars", "maven2")]
            .iter()
            .map(|(name, format)| RepositoryInfo {
                name: name.to_string(),
                format: format.to_string(),
                repository_type: "hosted".to_string(),
                url: String::new(),
            })
            .collect()
    }

    fn expect_listing(api: &mut MockNexusApi, items: Vec<serde_json::Value>) {
        let page = SearchPage {
            items,
            continuation_token: None,
        };
        api.expect_search_assets()
            .times(1)
            .returning(move |_, _, _| Ok(page.clone()));
    }

    fn artifact(path: &str, sha1: &str) -> serde_json::Value {
        json!({
            "path": path,
            "id": format!("id-{path}"),
            "downloadUrl": format!("http://nexus/repository/files/{path}"),
            "repository": "files",
            "format": "raw",
            "checksum": {"sha1": sha1}
        })
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl TransferProgress for RecordingProgress {
        fn start(&self, label: &str, total: u64) {
            self.events.lock().unwrap().push(format!("start {label} {total}"));
        }
        fn advance(&self, item: &str) {
            self.events.lock().unwrap().push(format!("advance {item}"));
        }
        fn finish(&self) {
            self.events.lock().unwrap().push("finish".to_string());
        }
    }

    #[test]
    fn test_strategy_for_format() {
        assert_eq!(UploadStrategy::for_format(&RepositoryFormat::Raw).unwrap(), UploadStrategy::Raw);
        assert_eq!(UploadStrategy::for_format(&RepositoryFormat::Yum).unwrap(), UploadStrategy::Yum);

        let err = UploadStrategy::for_format(&RepositoryFormat::from("maven2")).unwrap_err();
        assert!(matches!(&err, Error::NotImplemented(msg) if msg == "Upload to maven2 repository not supported"));
    }

    #[test]
    fn test_summaries() {
        let summary = DownloadSummary {
            downloaded: 2,
            skipped: 3,
            failed: 1,
            bytes: 10,
        };
        assert_eq!(summary.count(), 5);
        assert_eq!(DeleteSummary::Deleted(0).as_count(), 0);
        assert_eq!(DeleteSummary::Deleted(4).as_count(), 4);
        assert_eq!(DeleteSummary::Aborted.as_count(), -1);
    }

    #[tokio::test]
    async fn test_raw_upload_rejects_missing_directory() {
        let api = MockNexusApi::new();
        for directory in [None, Some(""), Some("/abs")] {
            let unit = TransferUnit {
                source: "c.txt".into(),
                repository: "files".to_string(),
                directory: directory.map(str::to_string),
                filename: None,
            };
            let err = UploadStrategy::Raw.upload(&api, &unit).await.unwrap_err();
            assert!(matches!(err, Error::InvalidPath(_)), "{directory:?}");
        }
    }

    #[tokio::test]
    async fn test_upload_dispatches_raw() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("a/b.txt"), "b").unwrap();

        let mut api = MockNexusApi::new();
        api.expect_list_repositories()
            .times(1)
            .returning(|| Ok(repositories()));
        api.expect_upload_raw()
            .with(eq("files"), eq("target/a"), eq("b.txt"), always())
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let progress = RecordingProgress::default();
        let executor = TransferExecutor::new(&api).with_progress(&progress);
        let count = executor
            .upload(dir.path(), "files/target/", UploadOptions::default())
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            *progress.events.lock().unwrap(),
            vec!["start Uploading 1", "advance b.txt", "finish"]
        );
    }

    #[tokio::test]
    async fn test_upload_dispatches_yum() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("pkg.rpm");
        std::fs::write(&source, "rpm").unwrap();

        let mut api = MockNexusApi::new();
        api.expect_list_repositories()
            .times(2)
            .returning(|| Ok(repositories()));
        api.expect_put_asset()
            .with(eq("rpms"), eq("el8/x86_64/pkg.rpm"), always())
            .times(1)
            .returning(|_, _, _| Ok(()));
        api.expect_put_asset()
            .with(eq("rpms"), eq("renamed.rpm"), always())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let executor = TransferExecutor::new(&api);
        let options = UploadOptions::default();
        assert_eq!(executor.upload(&source, "rpms/el8/x86_64/", options).await.unwrap(), 1);
        assert_eq!(executor.upload(&source, "rpms/renamed.rpm", options).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upload_unknown_format_not_implemented() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("lib.jar");
        std::fs::write(&source, "jar").unwrap();

        let mut api = MockNexusApi::new();
        api.expect_list_repositories().returning(|| Ok(repositories()));

        let err = TransferExecutor::new(&api)
            .upload(&source, "jars/org/lib/", UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));
    }

    #[tokio::test]
    async fn test_upload_missing_repository() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("c.txt");
        std::fs::write(&source, "c").unwrap();

        let mut api = MockNexusApi::new();
        api.expect_list_repositories().returning(|| Ok(repositories()));

        let err = TransferExecutor::new(&api)
            .upload(&source, "nope/dir/", UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(&err, Error::InvalidRepository(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_upload_failure_finishes_progress() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();

        let mut api = MockNexusApi::new();
        api.expect_list_repositories().returning(|| Ok(repositories()));
        api.expect_upload_raw()
            .times(1)
            .returning(|_, _, _, _| Err(Error::Api("Bad Request".to_string())));

        let progress = RecordingProgress::default();
        let err = TransferExecutor::new(&api)
            .with_progress(&progress)
            .upload(dir.path(), "files/dir/", UploadOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api(_)));
        assert_eq!(
            *progress.events.lock().unwrap(),
            vec!["start Uploading 2", "finish"]
        );
    }

    #[tokio::test]
    async fn test_upload_empty_directory_skips_lookup() {
        let dir = TempDir::new().unwrap();
        let mut api = MockNexusApi::new();
        api.expect_list_repositories().times(0);

        let count = TransferExecutor::new(&api)
            .upload(dir.path(), "files/dir/", UploadOptions::default())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_download_skips_matching_hash() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("dir")).unwrap();
        std::fs::write(dir.path().join("dir/abc.txt"), "abc").unwrap();

        let mut api = MockNexusApi::new();
        expect_listing(&mut api, vec![artifact("dir/abc.txt", ABC_SHA1)]);
        api.expect_download_asset().times(0);

        let destination = format!("{}{MAIN_SEPARATOR}", dir.path().display());
        let summary = TransferExecutor::new(&api)
            .download("files/dir/", &destination, DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.downloaded, 0);
        assert_eq!(summary.count(), 1);
        assert_eq!(std::fs::read_to_string(dir.path().join("dir/abc.txt")).unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_download_nocache_fetches_again() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("dir")).unwrap();
        std::fs::write(dir.path().join("dir/abc.txt"), "abc").unwrap();

        let mut api = MockNexusApi::new();
        expect_listing(&mut api, vec![artifact("dir/abc.txt", ABC_SHA1)]);
        api.expect_download_asset()
            .times(1)
            .returning(|_, destination| {
                std::fs::write(destination, "abc").unwrap();
                Ok(3)
            });

        let destination = format!("{}{MAIN_SEPARATOR}", dir.path().display());
        let options = DownloadOptions {
            flatten: false,
            no_cache: true,
        };
        let summary = TransferExecutor::new(&api)
            .download("files/dir/", &destination, options)
            .await
            .unwrap();
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn test_download_resolves_local_paths() {
        let dir = TempDir::new().unwrap();
        let flat_root = dir.path().to_path_buf();

        let mut api = MockNexusApi::new();
        expect_listing(&mut api, vec![artifact("dir/sub/x.bin", "ffff")]);
        let expected = flat_root.join("x.bin");
        api.expect_download_asset()
            .with(
                eq("http://nexus/repository/files/dir/sub/x.bin"),
                function(move |path: &Path| path == expected.as_path()),
            )
            .times(1)
            .returning(|_, _| Ok(0));

        // source ends with the separator, so the destination is a directory
        let options = DownloadOptions {
            flatten: true,
            no_cache: false,
        };
        let summary = TransferExecutor::new(&api)
            .download("files/dir/", &flat_root.display().to_string(), options)
            .await
            .unwrap();
        assert_eq!(summary.downloaded, 1);
    }

    #[tokio::test]
    async fn test_download_item_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();

        let mut api = MockNexusApi::new();
        expect_listing(
            &mut api,
            vec![artifact("dir/bad.txt", "ffff"), artifact("dir/good.txt", "eeee")],
        );
        api.expect_download_asset()
            .with(eq("http://nexus/repository/files/dir/bad.txt"), always())
            .returning(|url, _| Err(Error::Download(format!("Downloading from {url}. Reason: Forbidden"))));
        api.expect_download_asset()
            .with(eq("http://nexus/repository/files/dir/good.txt"), always())
            .returning(|_, _| Ok(4));

        let destination = format!("{}{MAIN_SEPARATOR}", dir.path().display());
        let summary = TransferExecutor::new(&api)
            .download("files/dir/", &destination, DownloadOptions::default())
            .await
            .unwrap();

        assert_eq!(
            summary,
            DownloadSummary {
                downloaded: 1,
                skipped: 0,
                failed: 1,
                bytes: 4,
            }
        );
        assert_eq!(summary.count(), 1);
    }

    #[tokio::test]
    async fn test_download_credentials_error_aborts() {
        let dir = TempDir::new().unwrap();

        let mut api = MockNexusApi::new();
        expect_listing(&mut api, vec![artifact("a.txt", "ffff"), artifact("b.txt", "ffff")]);
        api.expect_download_asset()
            .times(1)
            .returning(|_, _| Err(Error::InvalidCredentials("Try running `nexus3 login`".to_string())));

        let progress = RecordingProgress::default();
        let destination = format!("{}{MAIN_SEPARATOR}", dir.path().display());
        let err = TransferExecutor::new(&api)
            .with_progress(&progress)
            .download("files/", &destination, DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)));
        assert_eq!(
            *progress.events.lock().unwrap(),
            vec!["start Downloading 2", "finish"]
        );
    }

    #[tokio::test]
    async fn test_delete_counts_already_gone() {
        let mut api = MockNexusApi::new();
        expect_listing(&mut api, vec![artifact("dir/a", ""), artifact("dir/b", "")]);
        api.expect_delete_asset()
            .with(eq("id-dir/a"))
            .returning(|_| Ok(AssetDeletion::Deleted));
        api.expect_delete_asset()
            .with(eq("id-dir/b"))
            .returning(|_| Ok(AssetDeletion::AlreadyGone));

        let summary = TransferExecutor::new(&api).delete("files/dir/").await.unwrap();
        assert_eq!(summary, DeleteSummary::Deleted(2));
    }

    #[tokio::test]
    async fn test_delete_nothing_matched() {
        let mut api = MockNexusApi::new();
        expect_listing(&mut api, vec![]);
        api.expect_delete_asset().times(0);

        let summary = TransferExecutor::new(&api).delete("files/dir/").await.unwrap();
        assert_eq!(summary.as_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_api_error_aborts_with_sentinel() {
        let mut api = MockNexusApi::new();
        expect_listing(
            &mut api,
            vec![artifact("dir/a", ""), artifact("dir/b", ""), artifact("dir/c", "")],
        );
        api.expect_delete_asset()
            .with(eq("id-dir/a"))
            .times(1)
            .returning(|_| Ok(AssetDeletion::Deleted));
        api.expect_delete_asset()
            .with(eq("id-dir/b"))
            .times(1)
            .returning(|_| Err(Error::Api("Internal Server Error".to_string())));
        api.expect_delete_asset().with(eq("id-dir/c")).times(0);

        let progress = RecordingProgress::default();
        let summary = TransferExecutor::new(&api)
            .with_progress(&progress)
            .delete("files/dir/")
            .await
            .unwrap();
        assert_eq!(summary, DeleteSummary::Aborted);
        assert_eq!(summary.as_count(), -1);
        assert_eq!(
            *progress.events.lock().unwrap(),
            vec!["start Deleting 3", "advance dir/a", "finish"]
        );
    }

    #[tokio::test]
    async fn test_delete_invalid_path() {
        let api = MockNexusApi::new();
        let err = TransferExecutor::new(&api).delete("/files").await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }
}
