use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::domain::path::normalize_drive_letter;

/// Upper bound for one `git rev-parse --show-toplevel` probe.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

const GIT_PROGRAM: &str = "git";
const SHOW_TOPLEVEL_ARGS: [&str; 2] = ["rev-parse", "--show-toplevel"];

/// Boxed async result used by [`GitClient`] trait methods.
pub type GitFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Outcome of asking git for the repository that encloses a directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RepoRootLookup {
    /// The trimmed, drive-letter normalized repository root.
    Found(PathBuf),
    /// Not a repository, a non-zero exit, or empty output.
    NotFound,
    /// The probe did not finish within its timeout and was killed.
    TimedOut,
    /// The git executable could not be launched.
    ToolUnavailable,
}

impl RepoRootLookup {
    /// Collapses the lookup into "a root or nothing".
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Found(path) => Some(path),
            Self::NotFound | Self::TimedOut | Self::ToolUnavailable => None,
        }
    }

    /// Interprets the exit status and stdout of a `--show-toplevel` query.
    pub fn from_output(success: bool, stdout: &[u8]) -> Self {
        if !success {
            return Self::NotFound;
        }

        let stdout = String::from_utf8_lossy(stdout);
        let root = stdout.trim();
        if root.is_empty() {
            return Self::NotFound;
        }

        Self::Found(normalize_drive_letter(Path::new(root)))
    }
}

/// Repository discovery boundary used by workspace resolution.
///
/// Production uses [`RealGitClient`], while tests inject `MockGitClient` to
/// avoid depending on the machine's git setup.
#[cfg_attr(test, mockall::automock)]
pub trait GitClient: Send + Sync {
    /// Resolves the repository root that contains `start_dir`.
    ///
    /// Never fails: every problem maps to a non-`Found` variant.
    fn find_repository_root(&self, start_dir: PathBuf) -> GitFuture<RepoRootLookup>;
}

/// [`GitClient`] that shells out to the git executable.
pub struct RealGitClient {
    program: String,
    timeout: Duration,
}

impl RealGitClient {
    /// Creates a client running `git` with [`DEFAULT_DISCOVERY_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_program(GIT_PROGRAM, DEFAULT_DISCOVERY_TIMEOUT)
    }

    /// Creates a client running `program` instead of `git`, bounded by
    /// `timeout`.
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Default for RealGitClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitClient for RealGitClient {
    fn find_repository_root(&self, start_dir: PathBuf) -> GitFuture<RepoRootLookup> {
        let program = self.program.clone();
        let timeout = self.timeout;

        Box::pin(async move { show_toplevel(&program, &start_dir, timeout).await })
    }
}

/// Returns the repository root enclosing `start_dir`, or `None`.
///
/// Convenience wrapper over [`RealGitClient`] for callers that do not need
/// to tell failure modes apart.
pub async fn find_repository_root(start_dir: &Path) -> Option<PathBuf> {
    RealGitClient::new()
        .find_repository_root(start_dir.to_path_buf())
        .await
        .into_path()
}

/// Runs `<program> rev-parse --show-toplevel` inside `start_dir`.
async fn show_toplevel(program: &str, start_dir: &Path, timeout: Duration) -> RepoRootLookup {
    // A missing working directory also surfaces as `NotFound` from spawn,
    // which would be misread as a missing executable.
    if !start_dir.is_dir() {
        debug!(start_dir = %start_dir.display(), "repository probe skipped: not a directory");

        return RepoRootLookup::NotFound;
    }

    let child = Command::new(program)
        .args(SHOW_TOPLEVEL_ARGS)
        .current_dir(start_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn();
    let child = match child {
        Ok(child) => child,
        Err(error) => return spawn_failure(program, &error),
    };

    let lookup = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => RepoRootLookup::from_output(output.status.success(), &output.stdout),
        Ok(Err(error)) => {
            debug!(%error, "repository probe failed while reading output");

            RepoRootLookup::NotFound
        }
        Err(_) => RepoRootLookup::TimedOut,
    };
    debug!(start_dir = %start_dir.display(), ?lookup, "repository probe finished");

    lookup
}

/// Maps a spawn error to the matching lookup variant.
fn spawn_failure(program: &str, error: &io::Error) -> RepoRootLookup {
    debug!(program, %error, "failed to launch repository probe");

    if error.kind() == io::ErrorKind::NotFound {
        return RepoRootLookup::ToolUnavailable;
    }

    RepoRootLookup::NotFound
}
