//! Component path parsing and local destination resolution
//!
//! A component path addresses content on the service as
//! `repository/directory[/subdir...][/|filename]`: a trailing `/` means the
//! path names a directory, anything else names a file.

use std::fs::OpenOptions;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

use crate::error::{Error, Result};

/// Separator used by artifact paths on the service
pub const REMOTE_SEPARATOR: char = '/';

pub(crate) const REMOTE_SEPARATOR_STR: &str = "/";

const LOCAL_SEPARATOR: char = MAIN_SEPARATOR;

/// A parsed component path
///
/// `repository` is never empty nor `.`; `directory` never ends with the
/// separator and is never `.`; `filename` is `None` when the original path
/// ended with the separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPath {
    pub repository: String,
    pub directory: Option<String>,
    pub filename: Option<String>,
}

impl ComponentPath {
    /// True when the path addresses a directory rather than a single file
    pub fn is_directory(&self) -> bool {
        self.filename.is_none()
    }
}

impl std::fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(directory) = &self.directory {
            write!(f, "{REMOTE_SEPARATOR}{directory}")?;
        }
        match &self.filename {
            Some(filename) => write!(f, "{REMOTE_SEPARATOR}{filename}"),
            None => write!(f, "{REMOTE_SEPARATOR}"),
        }
    }
}

/// Split a component path into repository, directory and filename
///
/// ```
/// use nexus3_core::parse_component_path;
///
/// let path = parse_component_path("myrepo/dir/subdir/file").unwrap();
/// assert_eq!(path.repository, "myrepo");
/// assert_eq!(path.directory.as_deref(), Some("dir/subdir"));
/// assert_eq!(path.filename.as_deref(), Some("file"));
/// ```
pub fn parse_component_path(component_path: &str) -> Result<ComponentPath> {
    let mut fragments = component_path.split(REMOTE_SEPARATOR);

    let repository = match fragments.next() {
        Some(repository) if !repository.is_empty() && repository != "." => repository,
        _ => {
            return Err(Error::InvalidPath(format!(
                "The given path does not contain a repository: {component_path}"
            )));
        }
    };

    let mut fragments: Vec<&str> = fragments.collect();

    // The last fragment is consumed even when it turns out not to be a name.
    let filename = if component_path.ends_with(REMOTE_SEPARATOR) {
        None
    } else {
        fragments
            .pop()
            .filter(|name| !name.is_empty() && *name != ".")
    };

    let joined = fragments.join(REMOTE_SEPARATOR_STR);
    let directory = joined.strip_suffix(REMOTE_SEPARATOR).unwrap_or(&joined);
    let directory = if directory.is_empty() || directory == "." {
        None
    } else {
        Some(directory.to_string())
    };

    Ok(ComponentPath {
        repository: repository.to_string(),
        directory,
        filename: filename.map(str::to_string),
    })
}

/// Compute the local path for a remote artifact path
///
/// `remote_path` is the artifact path reported by the service (without the
/// repository). The destination is taken to be a directory when the remote
/// path is one, or when `local_destination` ends with `.`, `..` or the local
/// separator; the filesystem is never consulted for this. When both sides
/// name files the artifact is renamed to the destination's file name.
///
/// With `flatten` the remote directory structure is not reproduced locally.
/// With `create` the resulting directory (remote directory) or empty file
/// (remote file) is created, along with its parents.
///
/// The result is absolute and lexically normalised against the current
/// working directory.
pub fn resolve_local_destination(
    remote_path: &str,
    local_destination: &str,
    flatten: bool,
    create: bool,
) -> Result<PathBuf> {
    let remote_is_dir = remote_path.ends_with(REMOTE_SEPARATOR);
    let destination_is_dir = remote_is_dir
        || local_destination.ends_with('.')
        || local_destination.ends_with(LOCAL_SEPARATOR);

    let mut local_relative = remote_path.replace(REMOTE_SEPARATOR, &LOCAL_SEPARATOR.to_string());
    if flatten {
        local_relative = basename(&local_relative).to_string();
    }

    let mut local_base = local_destination;
    if !destination_is_dir {
        let file_name = basename(local_destination);
        local_relative = if flatten {
            file_name.to_string()
        } else {
            join(dirname(&local_relative), file_name)
        };
        local_base = dirname(local_destination);
    }

    let cwd = std::env::current_dir()?;
    let base = if local_base.is_empty() {
        cwd
    } else {
        cwd.join(local_base)
    };
    let path = normalize(&base.join(local_relative.trim_start_matches(LOCAL_SEPARATOR)));

    if create {
        if remote_is_dir {
            std::fs::create_dir_all(&path)?;
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            OpenOptions::new().create(true).append(true).open(&path)?;
        }
    }

    Ok(path)
}

/// Split at the last separator; the head keeps a lone root separator
fn split(path: &str) -> (&str, &str) {
    let index = path
        .rfind(LOCAL_SEPARATOR)
        .map(|i| i + LOCAL_SEPARATOR.len_utf8())
        .unwrap_or(0);
    let (head, tail) = path.split_at(index);
    let trimmed = head.trim_end_matches(LOCAL_SEPARATOR);
    if trimmed.is_empty() {
        (head, tail)
    } else {
        (trimmed, tail)
    }
}

fn basename(path: &str) -> &str {
    split(path).1
}

fn dirname(path: &str) -> &str {
    split(path).0
}

fn join(head: &str, tail: &str) -> String {
    if head.is_empty() || tail.starts_with(LOCAL_SEPARATOR) {
        tail.to_string()
    } else if head.ends_with(LOCAL_SEPARATOR) {
        format!("{head}{tail}")
    } else {
        format!("{head}{LOCAL_SEPARATOR}{tail}")
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
