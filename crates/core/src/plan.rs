//! Upload planning
//!
//! Turns a local source (file or directory) and a destination component
//! path into the list of single-file uploads to perform.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::{ComponentPath, REMOTE_SEPARATOR, REMOTE_SEPARATOR_STR};

/// One planned upload of a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferUnit {
    /// Absolute path of the local file to upload
    pub source: PathBuf,
    pub repository: String,
    /// Destination directory, `None` for the repository root
    pub directory: Option<String>,
    /// Destination file name, `None` to keep the local file name
    pub filename: Option<String>,
}

impl TransferUnit {
    /// File name used on the service
    pub fn remote_filename(&self) -> String {
        match &self.filename {
            Some(filename) => filename.clone(),
            None => self
                .source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Directory walk options for uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Descend into subdirectories of a source directory
    pub recurse: bool,
    /// Do not reproduce the local directory structure remotely
    pub flatten: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            recurse: true,
            flatten: false,
        }
    }
}

/// Plan the uploads of `source` to `destination`
///
/// A file yields a single unit. A directory is walked (only its direct
/// children without `recurse`) and each file lands in the destination
/// directory extended with the file's directory relative to `source`.
/// Units follow the filesystem enumeration order. Links to directories
/// are not descended into and never planned as files.
pub fn plan_upload(
    source: &Path,
    destination: &ComponentPath,
    options: UploadOptions,
) -> Result<Vec<TransferUnit>> {
    let source = std::path::absolute(source)?;
    let source = source.as_path();
    let metadata = std::fs::metadata(source)?;

    if !metadata.is_dir() {
        return Ok(vec![TransferUnit {
            source: source.to_path_buf(),
            repository: destination.repository.clone(),
            directory: destination.directory.clone(),
            filename: destination.filename.clone(),
        }]);
    }

    if destination.filename.is_some() {
        return Err(Error::InvalidPath(
            "Not allowed to upload a directory to a file".to_string(),
        ));
    }

    let mut walker = WalkDir::new(source).min_depth(1);
    if !options.recurse {
        walker = walker.max_depth(1);
    }

    let mut units = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::InvalidPath(format!(
                "Filesystem loop while walking {}",
                source.display()
            )),
        })?;
        // `path().is_dir()` follows links, `file_type()` does not
        if entry.file_type().is_dir() || entry.path().is_dir() {
            continue;
        }

        let relative_dir = entry
            .path()
            .strip_prefix(source)
            .ok()
            .and_then(Path::parent)
            .map(remote_relative_dir)
            .unwrap_or_default();

        let directory = upload_subdirectory(
            destination.directory.as_deref(),
            &relative_dir,
            options.flatten,
        );

        units.push(TransferUnit {
            source: entry.path().to_path_buf(),
            repository: destination.repository.clone(),
            directory: (!directory.is_empty()).then_some(directory),
            filename: None,
        });
    }

    tracing::debug!(source = %source.display(), files = units.len(), "Planned directory upload");
    Ok(units)
}

fn remote_relative_dir(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(REMOTE_SEPARATOR_STR)
}

/// Remote directory for a file found at `relative_dir` under the source
///
/// An empty result stands for the repository root.
pub fn upload_subdirectory(destination_dir: Option<&str>, relative_dir: &str, flatten: bool) -> String {
    let mut sub_directory = destination_dir.unwrap_or_default().to_string();
    if flatten || relative_dir.is_empty() {
        return sub_directory;
    }

    if !(sub_directory.is_empty()
        || sub_directory.ends_with(REMOTE_SEPARATOR)
        || relative_dir.starts_with(REMOTE_SEPARATOR))
    {
        sub_directory.push(REMOTE_SEPARATOR);
    }
    sub_directory.push_str(relative_dir);
    sub_directory
}
