//! Tree aggregator over the user, repository, and workspace prompt roots.
//!
//! [`PromptDrive`] owns the base directory of each root, decides which roots
//! are visible, and lists directory children fresh on every call. Nothing
//! listed is cached: a redraw signal on the change channel tells views to
//! query again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::app::settings::SettingsStore;
use crate::domain::entry::{
    Entry, EntryKind, RootKind, UNREADABLE_TOOLTIP, containing_directory, is_prompt_file_name,
    tooltip_from_content,
};
use crate::domain::path::{normalize_drive_letter, normalize_optional};

/// Directory name used for every prompt root.
pub const PROMPT_DRIVE_DIR_NAME: &str = ".promptDrive";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Returns the user drive directory (`~/.promptDrive`).
pub fn default_user_path() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(PROMPT_DRIVE_DIR_NAME);
    }

    PathBuf::from(PROMPT_DRIVE_DIR_NAME)
}

/// Redraw signal delivered to view subscribers.
///
/// `node: None` means the whole tree starting at the roots.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeChange {
    pub node: Option<Entry>,
}

/// Aggregates up to three prompt roots into one tree.
pub struct PromptDrive {
    change_tx: broadcast::Sender<TreeChange>,
    git_root: Option<PathBuf>,
    repository_path: Option<PathBuf>,
    settings: Arc<SettingsStore>,
    user_path: PathBuf,
    workspace_path: Option<PathBuf>,
}

impl PromptDrive {
    /// Creates an aggregator with only the user root configured.
    pub fn new(settings: Arc<SettingsStore>, user_path: PathBuf) -> Self {
        let (change_tx, _change_rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            change_tx,
            git_root: None,
            repository_path: None,
            settings,
            user_path: normalize_drive_letter(&user_path),
            workspace_path: None,
        }
    }

    /// Subscribes to redraw signals.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeChange> {
        self.change_tx.subscribe()
    }

    /// Returns the shared settings store.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Signals subscribers to redraw everything from the roots.
    pub fn refresh(&self) {
        debug!(subscribers = self.change_tx.receiver_count(), "prompt drive refresh");

        // No subscribers is a normal state before the view binds.
        let _ = self.change_tx.send(TreeChange { node: None });
    }

    /// Replaces the discovered git root and the repository base directory.
    ///
    /// Does not redraw; call [`PromptDrive::refresh`] afterwards.
    pub fn update_repository_path(
        &mut self,
        git_root: Option<PathBuf>,
        repo_dir: Option<PathBuf>,
    ) {
        self.git_root = normalize_optional(git_root);
        self.repository_path = normalize_optional(repo_dir);
        debug!(
            git_root = ?self.git_root,
            repository_path = ?self.repository_path,
            "repository root updated"
        );
    }

    /// Replaces the workspace base directory.
    ///
    /// Does not redraw; call [`PromptDrive::refresh`] afterwards.
    pub fn update_workspace_path(&mut self, workspace_dir: Option<PathBuf>) {
        self.workspace_path = normalize_optional(workspace_dir);
        debug!(workspace_path = ?self.workspace_path, "workspace root updated");
    }

    /// Returns the user root base directory.
    pub fn user_path(&self) -> &Path {
        &self.user_path
    }

    /// Returns the discovered git repository root, if any.
    pub fn git_root(&self) -> Option<&Path> {
        self.git_root.as_deref()
    }

    /// Returns the repository root base directory, if any.
    pub fn repository_path(&self) -> Option<&Path> {
        self.repository_path.as_deref()
    }

    /// Returns the workspace root base directory, if any.
    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace_path.as_deref()
    }

    /// Lists the visible roots in the fixed order user, repository,
    /// workspace.
    ///
    /// The user root additionally requires its directory to exist, since it
    /// is provisioned at startup. Repository and workspace roots show up
    /// before their directory exists because it is created on first write.
    pub fn list_root_nodes(&self) -> Vec<Entry> {
        RootKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.visible_root_path(kind)
                    .map(|base_path| Entry::root(kind, base_path.to_path_buf()))
            })
            .collect()
    }

    /// Lists the directories and prompt files directly inside
    /// `directory_path`, directories first, then by case-sensitive label.
    ///
    /// A missing directory and any I/O failure both yield an empty listing.
    pub fn list_entries(&self, directory_path: &Path) -> Vec<Entry> {
        if !directory_path.exists() {
            return Vec::new();
        }

        match read_prompt_entries(directory_path) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(
                    directory = %directory_path.display(),
                    %error,
                    "failed to list prompt directory"
                );

                Vec::new()
            }
        }
    }

    /// Returns the children of `node`, or the visible roots for `None`.
    pub fn get_children(&self, node: Option<&Entry>) -> Vec<Entry> {
        let Some(node) = node else {
            return self.list_root_nodes();
        };

        match node.kind {
            EntryKind::Root(_) | EntryKind::Directory => self.list_entries(&node.path),
            EntryKind::File { .. } => Vec::new(),
        }
    }

    /// Returns the directory that new prompts or folders created at `node`
    /// land in.
    ///
    /// Without a node this is the first visible root, which is the user root
    /// whenever it is shown.
    pub fn target_directory(&self, node: Option<&Entry>) -> Option<PathBuf> {
        match node {
            Some(entry) => containing_directory(entry).map(Path::to_path_buf),
            None => self
                .list_root_nodes()
                .into_iter()
                .next()
                .map(|root| root.path),
        }
    }

    /// Resolves `path` to the entry it would be listed as, if it lies inside
    /// a visible root.
    ///
    /// Root base directories resolve to their root node even before they
    /// exist. Other paths must exist and be a directory or prompt file.
    pub fn locate(&self, path: &Path) -> Option<Entry> {
        let path = normalize_drive_letter(path);
        let roots = self.list_root_nodes();
        if let Some(root) = roots.iter().find(|root| root.path == path) {
            return Some(root.clone());
        }

        if !roots.iter().any(|root| path.starts_with(&root.path)) {
            return None;
        }

        match build_entry(path) {
            Ok(entry) => entry,
            Err(error) => {
                debug!(%error, "failed to locate prompt drive entry");

                None
            }
        }
    }

    /// Returns the base path of `kind` when that root is currently visible.
    pub fn visible_root_path(&self, kind: RootKind) -> Option<&Path> {
        let settings = self.settings.settings();

        match kind {
            RootKind::User => (settings.enable_user_drive && self.user_path.is_dir())
                .then_some(self.user_path.as_path()),
            RootKind::Repository => self.visible_repository_path(),
            RootKind::Workspace => {
                let workspace_path = self.workspace_path.as_deref()?;
                let duplicates_repository = self
                    .visible_repository_path()
                    .is_some_and(|repository_path| repository_path == workspace_path);

                (!duplicates_repository).then_some(workspace_path)
            }
        }
    }

    /// Returns the repository base path when the repository drive is enabled
    /// and a git root was discovered.
    fn visible_repository_path(&self) -> Option<&Path> {
        if !self.settings.use_repository_prompt_drive() || self.git_root.is_none() {
            return None;
        }

        self.repository_path.as_deref()
    }
}

/// Reads, filters, and sorts the children of `directory`.
fn read_prompt_entries(directory: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(directory)? {
        if let Some(entry) = build_entry(dir_entry?.path())? {
            entries.push(entry);
        }
    }

    entries.sort_by_cached_key(|entry| (!entry.is_directory(), entry.label()));

    Ok(entries)
}

/// Stats `path` and builds its entry, or `None` for non-prompt files.
fn build_entry(path: PathBuf) -> io::Result<Option<Entry>> {
    let metadata = fs::metadata(&path)?;
    if metadata.is_dir() {
        return Ok(Some(Entry::directory(path)));
    }

    let is_prompt = path
        .file_name()
        .is_some_and(|name| is_prompt_file_name(&name.to_string_lossy()));
    if !is_prompt {
        return Ok(None);
    }

    let tooltip = read_tooltip(&path);

    Ok(Some(Entry::file(path, metadata.len(), tooltip)))
}

/// Reads the first-line tooltip of a prompt file.
fn read_tooltip(path: &Path) -> String {
    match fs::read(path) {
        Ok(content) => tooltip_from_content(&String::from_utf8_lossy(&content)),
        Err(error) => {
            debug!(path = %path.display(), %error, "failed to read prompt tooltip");

            UNREADABLE_TOOLTIP.to_string()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::domain::settings::SettingName;
    use crate::infra::config::MockConfigStore;

    /// Builds a settings store with fixed flag values.
    pub(crate) fn settings_store(enable_user: bool, use_repository: bool) -> Arc<SettingsStore> {
        let mut config = MockConfigStore::new();
        config.expect_get_bool().returning(move |key, default| {
            if key == SettingName::EnableUserPromptDrive.qualified_key() {
                return enable_user;
            }
            if key == SettingName::UseRepositoryPromptDrive.qualified_key() {
                return use_repository;
            }

            default
        });

        Arc::new(SettingsStore::new(Arc::new(config)))
    }

    /// Creates a drive whose user root exists inside a fresh temp dir.
    fn drive_with_user_root(use_repository: bool) -> (TempDir, PromptDrive) {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let user_path = temp_dir.path().join("user");
        fs::create_dir_all(&user_path).expect("failed to create user root");
        let drive = PromptDrive::new(settings_store(true, use_repository), user_path);

        (temp_dir, drive)
    }

    fn labels(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(Entry::label).collect()
    }

    fn root_kinds(drive: &PromptDrive) -> Vec<RootKind> {
        drive
            .list_root_nodes()
            .iter()
            .filter_map(Entry::root_kind)
            .collect()
    }

    #[test]
    fn test_list_entries_filters_and_sorts_children() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);
        let directory = temp_dir.path().join("user");
        fs::write(directory.join("b.prompt"), "").expect("failed to write file");
        fs::create_dir(directory.join("A")).expect("failed to create dir");
        fs::write(directory.join("a.prompt"), "").expect("failed to write file");
        fs::write(directory.join("C.txt"), "").expect("failed to write file");

        // Act
        let entries = drive.list_entries(&directory);

        // Assert
        assert_eq!(labels(&entries), vec!["A", "a.prompt", "b.prompt"]);
        assert!(entries[0].is_directory());
    }

    #[test]
    fn test_list_entries_sorts_directories_before_files_case_sensitively() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);
        let directory = temp_dir.path().join("user");
        fs::write(directory.join("Zeta.prompt"), "").expect("failed to write file");
        fs::create_dir(directory.join("zoo")).expect("failed to create dir");
        fs::create_dir(directory.join("Alpha")).expect("failed to create dir");
        fs::write(directory.join("alpha.prompt"), "").expect("failed to write file");

        // Act
        let entries = drive.list_entries(&directory);

        // Assert
        assert_eq!(
            labels(&entries),
            vec!["Alpha", "zoo", "Zeta.prompt", "alpha.prompt"]
        );
    }

    #[test]
    fn test_list_entries_returns_empty_for_missing_directory() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);

        // Act
        let entries = drive.list_entries(&temp_dir.path().join("missing"));

        // Assert
        assert!(entries.is_empty());
    }

    #[test]
    fn test_list_entries_returns_empty_when_path_is_a_file() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);
        let file = temp_dir.path().join("user").join("solo.prompt");
        fs::write(&file, "").expect("failed to write file");

        // Act
        let entries = drive.list_entries(&file);

        // Assert
        assert!(entries.is_empty());
    }

    #[test]
    fn test_list_entries_populates_file_description_and_tooltip() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);
        let directory = temp_dir.path().join("user");
        let content = format!("Review this change\n{}", "x".repeat(1530));
        fs::write(directory.join("review.prompt"), &content).expect("failed to write file");

        // Act
        let entries = drive.list_entries(&directory);

        // Assert
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description().as_deref(), Some("1.5kB"));
        assert_eq!(entries[0].tooltip(), Some("Review this change"));
    }

    #[test]
    fn test_list_root_nodes_includes_repository_when_enabled_and_discovered() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(true);
        let git_root = temp_dir.path().join("repo");
        drive.update_repository_path(
            Some(git_root.clone()),
            Some(git_root.join(PROMPT_DRIVE_DIR_NAME)),
        );

        // Act
        let kinds = root_kinds(&drive);

        // Assert
        assert_eq!(kinds, vec![RootKind::User, RootKind::Repository]);
    }

    #[test]
    fn test_list_root_nodes_hides_repository_when_disabled() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(false);
        let git_root = temp_dir.path().join("repo");
        drive.update_repository_path(
            Some(git_root.clone()),
            Some(git_root.join(PROMPT_DRIVE_DIR_NAME)),
        );

        // Act
        let kinds = root_kinds(&drive);

        // Assert
        assert_eq!(kinds, vec![RootKind::User]);
    }

    #[test]
    fn test_list_root_nodes_hides_repository_without_git_root() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(true);
        drive.update_repository_path(None, Some(temp_dir.path().join("repo")));

        // Act
        let kinds = root_kinds(&drive);

        // Assert
        assert_eq!(kinds, vec![RootKind::User]);
    }

    #[test]
    fn test_list_root_nodes_deduplicates_workspace_equal_to_repository() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(true);
        let git_root = temp_dir.path().join("repo");
        let prompt_dir = git_root.join(PROMPT_DRIVE_DIR_NAME);
        drive.update_repository_path(Some(git_root), Some(prompt_dir.clone()));
        drive.update_workspace_path(Some(prompt_dir));

        // Act
        let kinds = root_kinds(&drive);

        // Assert
        assert_eq!(kinds, vec![RootKind::User, RootKind::Repository]);
    }

    #[test]
    fn test_list_root_nodes_keeps_workspace_distinct_from_repository() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(true);
        let git_root = temp_dir.path().join("repo");
        drive.update_repository_path(
            Some(git_root.clone()),
            Some(git_root.join(PROMPT_DRIVE_DIR_NAME)),
        );
        drive.update_workspace_path(Some(
            git_root.join("packages").join("web").join(PROMPT_DRIVE_DIR_NAME),
        ));

        // Act
        let kinds = root_kinds(&drive);

        // Assert
        assert_eq!(
            kinds,
            vec![RootKind::User, RootKind::Repository, RootKind::Workspace]
        );
    }

    #[test]
    fn test_list_root_nodes_shows_workspace_when_repository_drive_disabled() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(false);
        let git_root = temp_dir.path().join("repo");
        let prompt_dir = git_root.join(PROMPT_DRIVE_DIR_NAME);
        drive.update_repository_path(Some(git_root), Some(prompt_dir.clone()));
        drive.update_workspace_path(Some(prompt_dir));

        // Act
        let kinds = root_kinds(&drive);

        // Assert
        assert_eq!(kinds, vec![RootKind::User, RootKind::Workspace]);
    }

    #[test]
    fn test_list_root_nodes_requires_existing_user_directory() {
        // Arrange
        let temp_dir = tempdir().expect("failed to create temp dir");
        let mut drive = PromptDrive::new(settings_store(true, true), temp_dir.path().join("absent"));
        drive.update_workspace_path(Some(temp_dir.path().join("ws").join(PROMPT_DRIVE_DIR_NAME)));

        // Act
        let kinds = root_kinds(&drive);

        // Assert
        assert_eq!(kinds, vec![RootKind::Workspace]);
    }

    #[test]
    fn test_list_root_nodes_hides_user_root_when_disabled() {
        // Arrange
        let temp_dir = tempdir().expect("failed to create temp dir");
        let user_path = temp_dir.path().join("user");
        fs::create_dir_all(&user_path).expect("failed to create user root");
        let drive = PromptDrive::new(settings_store(false, true), user_path);

        // Act
        let roots = drive.list_root_nodes();

        // Assert
        assert!(roots.is_empty());
    }

    #[test]
    fn test_root_nodes_carry_label_and_base_path_description() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);

        // Act
        let roots = drive.list_root_nodes();

        // Assert
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].label(), "USER");
        assert_eq!(
            roots[0].description(),
            Some(temp_dir.path().join("user").display().to_string())
        );
    }

    #[test]
    fn test_update_repository_path_normalizes_drive_letter() {
        // Arrange
        let (_temp_dir, mut drive) = drive_with_user_root(true);

        // Act
        drive.update_repository_path(
            Some(PathBuf::from("c:\\repo")),
            Some(PathBuf::from("c:\\repo\\.promptDrive")),
        );

        // Assert
        assert_eq!(drive.git_root(), Some(Path::new("C:\\repo")));
        assert_eq!(
            drive.repository_path(),
            Some(Path::new("C:\\repo\\.promptDrive"))
        );
    }

    #[test]
    fn test_update_repository_path_then_refresh_exposes_new_path() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(true);
        let mut change_rx = drive.subscribe();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        drive.update_repository_path(Some(first.clone()), Some(first.join(PROMPT_DRIVE_DIR_NAME)));
        drive.refresh();
        let _ = change_rx.try_recv();

        // Act
        drive.update_repository_path(
            Some(second.clone()),
            Some(second.join(PROMPT_DRIVE_DIR_NAME)),
        );
        drive.refresh();

        // Assert
        assert_eq!(change_rx.try_recv().ok(), Some(TreeChange { node: None }));
        let roots = drive.get_children(None);
        assert_eq!(roots[1].path, second.join(PROMPT_DRIVE_DIR_NAME));
    }

    #[test]
    fn test_refresh_without_subscribers_does_not_fail() {
        // Arrange
        let (_temp_dir, drive) = drive_with_user_root(true);

        // Act & Assert
        drive.refresh();
    }

    #[test]
    fn test_get_children_dispatches_on_node_kind() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);
        let user_path = temp_dir.path().join("user");
        fs::create_dir(user_path.join("team")).expect("failed to create dir");
        fs::write(user_path.join("team").join("daily.prompt"), "hi").expect("failed to write");
        fs::write(user_path.join("top.prompt"), "").expect("failed to write file");

        // Act
        let roots = drive.get_children(None);
        let root_children = drive.get_children(roots.first());
        let team_children = drive.get_children(root_children.first());
        let file_children = drive.get_children(team_children.first());

        // Assert
        assert_eq!(labels(&roots), vec!["USER"]);
        assert_eq!(labels(&root_children), vec!["team", "top.prompt"]);
        assert_eq!(labels(&team_children), vec!["daily.prompt"]);
        assert!(file_children.is_empty());
    }

    #[test]
    fn test_get_children_of_unborn_repository_root_is_empty() {
        // Arrange
        let (temp_dir, mut drive) = drive_with_user_root(true);
        let git_root = temp_dir.path().join("repo");
        drive.update_repository_path(
            Some(git_root.clone()),
            Some(git_root.join(PROMPT_DRIVE_DIR_NAME)),
        );
        let roots = drive.list_root_nodes();

        // Act
        let children = drive.get_children(roots.get(1));

        // Assert
        assert_eq!(roots[1].root_kind(), Some(RootKind::Repository));
        assert!(children.is_empty());
    }

    #[test]
    fn test_target_directory_prefers_user_root_then_node_context() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);
        let user_path = temp_dir.path().join("user");
        let file = Entry::file(user_path.join("team").join("a.prompt"), 0, String::new());

        // Act
        let default_target = drive.target_directory(None);
        let file_target = drive.target_directory(Some(&file));

        // Assert
        assert_eq!(default_target, Some(user_path.clone()));
        assert_eq!(file_target, Some(user_path.join("team")));
    }

    #[test]
    fn test_locate_resolves_roots_and_children_but_not_outside_paths() {
        // Arrange
        let (temp_dir, drive) = drive_with_user_root(true);
        let user_path = temp_dir.path().join("user");
        fs::write(user_path.join("a.prompt"), "").expect("failed to write file");
        fs::write(user_path.join("notes.txt"), "").expect("failed to write file");
        fs::write(temp_dir.path().join("outside.prompt"), "").expect("failed to write file");

        // Act
        let root = drive.locate(&user_path);
        let prompt = drive.locate(&user_path.join("a.prompt"));
        let hidden = drive.locate(&user_path.join("notes.txt"));
        let outside = drive.locate(&temp_dir.path().join("outside.prompt"));

        // Assert
        assert_eq!(root.and_then(|entry| entry.root_kind()), Some(RootKind::User));
        assert_eq!(prompt.map(|entry| entry.label()), Some("a.prompt".to_string()));
        assert_eq!(hidden, None);
        assert_eq!(outside, None);
    }
}
