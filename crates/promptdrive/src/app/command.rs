//! Write operations behind the host's create, delete, and open actions.
//!
//! Every failure is returned to the caller once, with the drive left as it
//! was. Directories are created lazily here, on first write.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::entry::{Entry, EntryKind, prompt_file_name};

/// Errors surfaced to the user by write operations.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("Invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("`{}` already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Drive roots cannot be deleted: `{}`", .path.display())]
    RootNotDeletable { path: PathBuf },

    #[error("No prompt drive root is available")]
    NoTargetRoot,

    #[error("Failed to {action} `{}`: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DriveError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Creates an empty prompt file named `name` inside `directory`.
///
/// The `.prompt` extension is appended unless already present. An existing
/// file is never overwritten.
///
/// # Errors
/// Returns an error when the name is invalid, the file already exists, or
/// the directory or file cannot be created.
pub fn create_prompt(directory: &Path, name: &str) -> Result<PathBuf, DriveError> {
    let name = validate_name(name)?;
    fs::create_dir_all(directory)
        .map_err(|error| DriveError::io("create directory", directory, error))?;

    let path = directory.join(prompt_file_name(name));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|error| {
            if error.kind() == io::ErrorKind::AlreadyExists {
                return DriveError::AlreadyExists { path: path.clone() };
            }

            DriveError::io("create prompt", &path, error)
        })?;
    info!(path = %path.display(), "created prompt");

    Ok(path)
}

/// Creates a folder named `name` inside `directory`.
///
/// # Errors
/// Returns an error when the name is invalid, the folder already exists, or
/// it cannot be created.
pub fn create_folder(directory: &Path, name: &str) -> Result<PathBuf, DriveError> {
    let name = validate_name(name)?;
    let path = directory.join(name);
    if path.exists() {
        return Err(DriveError::AlreadyExists { path });
    }

    fs::create_dir_all(&path).map_err(|error| DriveError::io("create folder", &path, error))?;
    info!(path = %path.display(), "created folder");

    Ok(path)
}

/// Deletes `entry`: directories recursively, files directly.
///
/// # Errors
/// Returns an error for root nodes and for failed removals.
pub fn delete_entry(entry: &Entry) -> Result<(), DriveError> {
    match entry.kind {
        EntryKind::Root(_) => {
            return Err(DriveError::RootNotDeletable {
                path: entry.path.clone(),
            });
        }
        EntryKind::Directory => fs::remove_dir_all(&entry.path)
            .map_err(|error| DriveError::io("delete folder", &entry.path, error))?,
        EntryKind::File { .. } => fs::remove_file(&entry.path)
            .map_err(|error| DriveError::io("delete prompt", &entry.path, error))?,
    }
    info!(path = %entry.path.display(), "deleted entry");

    Ok(())
}

/// Reads the full content of the prompt at `path`.
///
/// # Errors
/// Returns an error when the file cannot be read as UTF-8 text.
pub fn read_prompt(path: &Path) -> Result<String, DriveError> {
    fs::read_to_string(path).map_err(|error| DriveError::io("read prompt", path, error))
}

/// Trims `name` and rejects blank names, `.`/`..`, and path separators.
fn validate_name(name: &str) -> Result<&str, DriveError> {
    let trimmed = name.trim();
    let reason = if trimmed.is_empty() {
        Some("a name is required")
    } else if trimmed == "." || trimmed == ".." {
        Some("relative directory names are not allowed")
    } else if trimmed.contains(['/', '\\']) {
        Some("path separators are not allowed")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DriveError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(trimmed),
    }
}
