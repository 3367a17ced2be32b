use std::path::PathBuf;

use tracing::debug;

use crate::app::drive::PROMPT_DRIVE_DIR_NAME;
use crate::domain::path::normalize_drive_letter;
use crate::infra::git::{GitClient, RepoRootLookup};

/// Repository and workspace prompt directories derived from one workspace
/// folder.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WorkspaceRoots {
    pub git_root: Option<PathBuf>,
    pub repository_dir: Option<PathBuf>,
    pub workspace_dir: Option<PathBuf>,
}

impl WorkspaceRoots {
    /// Builds roots for `folder` given the discovered `git_root`.
    pub fn from_discovery(folder: Option<PathBuf>, git_root: Option<PathBuf>) -> Self {
        let git_root = git_root.map(|root| normalize_drive_letter(&root));

        Self {
            repository_dir: git_root
                .as_ref()
                .map(|root| root.join(PROMPT_DRIVE_DIR_NAME)),
            git_root,
            workspace_dir: folder
                .map(|folder| normalize_drive_letter(&folder).join(PROMPT_DRIVE_DIR_NAME)),
        }
    }
}

/// Resolves prompt roots for the first workspace folder.
///
/// Without a folder every root is `None`. Discovery failures of any kind
/// leave the repository root unset but keep the workspace root.
pub async fn resolve_workspace(
    folder: Option<PathBuf>,
    git_client: &dyn GitClient,
) -> WorkspaceRoots {
    let Some(folder) = folder else {
        return WorkspaceRoots::default();
    };

    let lookup = git_client.find_repository_root(folder.clone()).await;
    if !matches!(lookup, RepoRootLookup::Found(_)) {
        debug!(folder = %folder.display(), ?lookup, "no repository root for workspace");
    }

    WorkspaceRoots::from_discovery(Some(folder), lookup.into_path())
}
