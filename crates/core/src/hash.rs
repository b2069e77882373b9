//! Local file hashing and the download skip check
//!
//! A download is skipped when the local file already has the content the
//! service reports, compared by SHA-1 first and MD5 second.

use std::path::Path;

use md5::Md5;
use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

use crate::error::Result;
use crate::traits::ArtifactRecord;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithms reported by Nexus that the client can verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Md5,
}

impl HashAlgorithm {
    /// Algorithms in the order they are tried by [`should_skip_download`]
    pub const PREFERENCE: [HashAlgorithm; 2] = [HashAlgorithm::Sha1, HashAlgorithm::Md5];

    /// Key used in the service's `checksum` map
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Md5 => "md5",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hex digest of the raw bytes of `path`
pub async fn calculate_hash(algorithm: HashAlgorithm, path: &Path) -> Result<String> {
    match algorithm {
        HashAlgorithm::Sha1 => digest_file::<Sha1>(path).await,
        HashAlgorithm::Md5 => digest_file::<Md5>(path).await,
    }
}

async fn digest_file<D: Digest>(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = D::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// A missing local file never matches
async fn local_hash_matches(path: &Path, remote_hash: &str, algorithm: HashAlgorithm) -> Result<bool> {
    match calculate_hash(algorithm, path).await {
        Ok(local_hash) => Ok(local_hash.eq_ignore_ascii_case(remote_hash)),
        Err(crate::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Decide whether downloading `artifact` to `local_path` can be skipped
///
/// With `no_cache` any existing local file is removed and the download is
/// never skipped. Otherwise the first checksum the artifact exposes (SHA-1,
/// then MD5) that matches the local file allows the skip.
pub async fn should_skip_download(
    download_url: &str,
    local_path: &Path,
    artifact: &ArtifactRecord,
    no_cache: bool,
) -> Result<bool> {
    if no_cache {
        match tokio::fs::remove_file(local_path).await {
            Ok(()) => {
                tracing::debug!(path = %local_path.display(), "Removed local copy because nocache is set");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        return Ok(false);
    }

    for algorithm in HashAlgorithm::PREFERENCE {
        let Some(remote_hash) = artifact.checksum(algorithm) else {
            continue;
        };

        if local_hash_matches(local_path, remote_hash, algorithm).await? {
            tracing::debug!(
                url = download_url,
                path = %local_path.display(),
                %algorithm,
                "Skipping download, local copy is up-to-date"
            );
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ABC_SHA1: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";
    const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

    fn artifact(checksums: &[(&str, &str)]) -> ArtifactRecord {
        ArtifactRecord {
            path: "dir/abc.txt".to_string(),
            download_url: "http://nexus/repository/repo/dir/abc.txt".to_string(),
            id: "id-1".to_string(),
            repository: "repo".to_string(),
            format: "raw".to_string(),
            checksum: checksums
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
                .collect(),
        }
    }

    fn abc_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        path
    }

    #[tokio::test]
    async fn test_calculate_hash() {
        let dir = TempDir::new().unwrap();
        let path = abc_file(&dir);

        assert_eq!(calculate_hash(HashAlgorithm::Sha1, &path).await.unwrap(), ABC_SHA1);
        assert_eq!(calculate_hash(HashAlgorithm::Md5, &path).await.unwrap(), ABC_MD5);
    }

    #[tokio::test]
    async fn test_skip_when_sha1_matches() {
        let dir = TempDir::new().unwrap();
        let path = abc_file(&dir);
        let record = artifact(&[("sha1", ABC_SHA1), ("md5", "0000")]);

        // unchanged file and artifact: the answer is stable
        for _ in 0..2 {
            assert!(should_skip_download("url", &path, &record, false).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_skip_falls_back_to_md5() {
        let dir = TempDir::new().unwrap();
        let path = abc_file(&dir);

        let record = artifact(&[("md5", ABC_MD5)]);
        assert!(should_skip_download("url", &path, &record, false).await.unwrap());

        let record = artifact(&[("sha1", "ffff"), ("md5", ABC_MD5)]);
        assert!(should_skip_download("url", &path, &record, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_uppercase_remote_digest_matches() {
        let dir = TempDir::new().unwrap();
        let path = abc_file(&dir);
        let upper = ABC_SHA1.to_uppercase();
        let record = artifact(&[("sha1", upper.as_str())]);

        assert!(should_skip_download("url", &path, &record, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_skip_on_mismatch_or_missing_checksums() {
        let dir = TempDir::new().unwrap();
        let path = abc_file(&dir);

        let record = artifact(&[("sha1", "ffff"), ("md5", "eeee")]);
        assert!(!should_skip_download("url", &path, &record, false).await.unwrap());

        let record = artifact(&[("sha256", "whatever")]);
        assert!(!should_skip_download("url", &path, &record, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_skip_when_local_file_missing() {
        let dir = TempDir::new().unwrap();
        let record = artifact(&[("sha1", ABC_SHA1)]);

        let missing = dir.path().join("missing.txt");
        assert!(!should_skip_download("url", &missing, &record, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_nocache_removes_local_copy() {
        let dir = TempDir::new().unwrap();
        let path = abc_file(&dir);
        let record = artifact(&[("sha1", ABC_SHA1)]);

        for _ in 0..2 {
            assert!(!should_skip_download("url", &path, &record, true).await.unwrap());
            assert!(!path.exists());
        }
    }
}
