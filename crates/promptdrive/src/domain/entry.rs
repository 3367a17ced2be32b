use std::path::{Path, PathBuf};

use serde::Serialize;

/// Suffix that marks a file as a prompt; every other file stays hidden.
pub const PROMPT_EXTENSION: &str = ".prompt";
/// Maximum number of characters kept from a prompt's first line.
pub const TOOLTIP_MAX_CHARS: usize = 80;
/// Tooltip shown when a prompt file exists but cannot be read.
pub const UNREADABLE_TOOLTIP: &str = "Error reading prompt file";

const TOOLTIP_ELLIPSIS: &str = "...";

/// One of the three semantic drives aggregated into the tree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RootKind {
    User,
    Repository,
    Workspace,
}

impl RootKind {
    /// Roots in the order they are listed.
    pub const ALL: [Self; 3] = [Self::User, Self::Repository, Self::Workspace];

    /// Returns the fixed display label for this root.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Repository => "REPOSITORY",
            Self::Workspace => "WORKSPACE",
        }
    }
}

/// Discriminant and per-kind payload of an [`Entry`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// A drive root; its label is fixed and its description is the base path.
    Root(RootKind),
    /// A directory below some root.
    Directory,
    /// A prompt file with its size and first-line summary.
    File { size_bytes: u64, tooltip: String },
}

/// A node materialized for display.
///
/// Entries are rebuilt on every listing, so callers must reselect by
/// [`Entry::path`] rather than rely on two listings returning equal values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub kind: EntryKind,
    pub path: PathBuf,
}

impl Entry {
    /// Creates the root node for `kind` backed by `base_path`.
    pub fn root(kind: RootKind, base_path: PathBuf) -> Self {
        Self {
            kind: EntryKind::Root(kind),
            path: base_path,
        }
    }

    /// Creates a directory node.
    pub fn directory(path: PathBuf) -> Self {
        Self {
            kind: EntryKind::Directory,
            path,
        }
    }

    /// Creates a prompt file node.
    pub fn file(path: PathBuf, size_bytes: u64, tooltip: String) -> Self {
        Self {
            kind: EntryKind::File {
                size_bytes,
                tooltip,
            },
            path,
        }
    }

    /// Returns the display label: the fixed root label, or the file name.
    pub fn label(&self) -> String {
        match self.kind {
            EntryKind::Root(root_kind) => root_kind.label().to_string(),
            EntryKind::Directory | EntryKind::File { .. } => self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Returns the short description shown beside the label.
    ///
    /// Roots show their base directory, files their size in kilobytes, and
    /// directories nothing.
    pub fn description(&self) -> Option<String> {
        match &self.kind {
            EntryKind::Root(_) => Some(self.path.display().to_string()),
            EntryKind::Directory => None,
            EntryKind::File { size_bytes, .. } => Some(format_size_kb(*size_bytes)),
        }
    }

    /// Returns the hover text for prompt files.
    pub fn tooltip(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::File { tooltip, .. } => Some(tooltip.as_str()),
            EntryKind::Root(_) | EntryKind::Directory => None,
        }
    }

    /// Returns whether the node can have children.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Root(_) | EntryKind::Directory)
    }

    /// Returns the root kind when this entry is a drive root.
    pub fn root_kind(&self) -> Option<RootKind> {
        match self.kind {
            EntryKind::Root(root_kind) => Some(root_kind),
            EntryKind::Directory | EntryKind::File { .. } => None,
        }
    }

    /// Returns the context tag hosts use to filter per-node actions.
    pub fn context_value(&self) -> &'static str {
        match self.kind {
            EntryKind::Root(_) => "root",
            EntryKind::Directory => "folder",
            EntryKind::File { .. } => "prompt",
        }
    }
}

/// Serializable rendering of an [`Entry`] for hosts that consume JSON.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub context_value: &'static str,
    pub description: Option<String>,
    pub is_directory: bool,
    pub label: String,
    pub path: String,
    pub tooltip: Option<String>,
}

impl From<&Entry> for EntryView {
    fn from(entry: &Entry) -> Self {
        Self {
            context_value: entry.context_value(),
            description: entry.description(),
            is_directory: entry.is_directory(),
            label: entry.label(),
            path: entry.path.display().to_string(),
            tooltip: entry.tooltip().map(str::to_string),
        }
    }
}

/// Returns whether `file_name` carries the prompt extension.
pub fn is_prompt_file_name(file_name: &str) -> bool {
    file_name.ends_with(PROMPT_EXTENSION)
}

/// Appends the prompt extension unless `name` already ends with it.
pub fn prompt_file_name(name: &str) -> String {
    if is_prompt_file_name(name) {
        return name.to_string();
    }

    format!("{name}{PROMPT_EXTENSION}")
}

/// Formats a byte count as kilobytes rounded to one decimal, e.g. `1.5kB`.
///
/// Whole values drop the decimal (`2kB`, `0kB`).
pub fn format_size_kb(size_bytes: u64) -> String {
    let tenths = (u128::from(size_bytes) * 10 + 512) / 1024;
    let whole = tenths / 10;
    let fraction = tenths % 10;

    if fraction == 0 {
        return format!("{whole}kB");
    }

    format!("{whole}.{fraction}kB")
}

/// Builds a tooltip from the first line of prompt `content`.
///
/// Lines longer than [`TOOLTIP_MAX_CHARS`] are cut and suffixed with `...`.
pub fn tooltip_from_content(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.chars().count() <= TOOLTIP_MAX_CHARS {
        return first_line.to_string();
    }

    let mut tooltip: String = first_line.chars().take(TOOLTIP_MAX_CHARS).collect();
    tooltip.push_str(TOOLTIP_ELLIPSIS);

    tooltip
}

/// Returns the directory that new items created "at" `entry` land in.
pub fn containing_directory(entry: &Entry) -> Option<&Path> {
    match entry.kind {
        EntryKind::Root(_) | EntryKind::Directory => Some(entry.path.as_path()),
        EntryKind::File { .. } => entry.path.parent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_entry_uses_fixed_label_and_path_description() {
        // Arrange
        let entry = Entry::root(RootKind::Repository, PathBuf::from("/repo/.promptDrive"));

        // Act
        let label = entry.label();
        let description = entry.description();

        // Assert
        assert_eq!(label, "REPOSITORY");
        assert_eq!(description.as_deref(), Some("/repo/.promptDrive"));
        assert!(entry.is_directory());
        assert_eq!(entry.context_value(), "root");
    }

    #[test]
    fn test_file_entry_label_comes_from_file_name() {
        // Arrange
        let entry = Entry::file(PathBuf::from("/drive/notes/foo.prompt"), 1536, String::new());

        // Act
        let label = entry.label();

        // Assert
        assert_eq!(label, "foo.prompt");
        assert_eq!(entry.description().as_deref(), Some("1.5kB"));
        assert!(!entry.is_directory());
        assert_eq!(entry.root_kind(), None);
    }

    #[test]
    fn test_directory_entry_has_no_description_or_tooltip() {
        // Arrange
        let entry = Entry::directory(PathBuf::from("/drive/notes"));

        // Act & Assert
        assert_eq!(entry.description(), None);
        assert_eq!(entry.tooltip(), None);
        assert_eq!(entry.context_value(), "folder");
    }

    #[test]
    fn test_format_size_kb_rounds_to_one_decimal() {
        // Arrange & Act & Assert
        assert_eq!(format_size_kb(0), "0kB");
        assert_eq!(format_size_kb(100), "0.1kB");
        assert_eq!(format_size_kb(1536), "1.5kB");
        assert_eq!(format_size_kb(2048), "2kB");
        assert_eq!(format_size_kb(10_188), "9.9kB");
    }

    #[test]
    fn test_tooltip_from_content_keeps_short_first_line() {
        // Arrange
        let content = "Summarize the diff\nsecond line";

        // Act
        let tooltip = tooltip_from_content(content);

        // Assert
        assert_eq!(tooltip, "Summarize the diff");
    }

    #[test]
    fn test_tooltip_from_content_truncates_long_line() {
        // Arrange
        let content = "x".repeat(TOOLTIP_MAX_CHARS + 5);

        // Act
        let tooltip = tooltip_from_content(&content);

        // Assert
        assert_eq!(tooltip.len(), TOOLTIP_MAX_CHARS + 3);
        assert!(tooltip.ends_with("..."));
    }

    #[test]
    fn test_tooltip_from_content_handles_empty_file() {
        // Arrange & Act
        let tooltip = tooltip_from_content("");

        // Assert
        assert_eq!(tooltip, "");
    }

    #[test]
    fn test_prompt_file_name_appends_extension_once() {
        // Arrange & Act & Assert
        assert_eq!(prompt_file_name("foo"), "foo.prompt");
        assert_eq!(prompt_file_name("foo.prompt"), "foo.prompt");
    }

    #[test]
    fn test_containing_directory_uses_parent_for_files() {
        // Arrange
        let file = Entry::file(PathBuf::from("/drive/a/b.prompt"), 0, String::new());
        let directory = Entry::directory(PathBuf::from("/drive/a"));

        // Act & Assert
        assert_eq!(containing_directory(&file), Some(Path::new("/drive/a")));
        assert_eq!(containing_directory(&directory), Some(Path::new("/drive/a")));
    }

    #[test]
    fn test_entry_view_serializes_camel_case_fields() {
        // Arrange
        let entry = Entry::file(PathBuf::from("/drive/a.prompt"), 2048, "Hello".to_string());

        // Act
        let json = serde_json::to_value(EntryView::from(&entry)).expect("view should serialize");

        // Assert
        assert_eq!(json["label"], "a.prompt");
        assert_eq!(json["description"], "2kB");
        assert_eq!(json["isDirectory"], false);
        assert_eq!(json["contextValue"], "prompt");
        assert_eq!(json["tooltip"], "Hello");
    }
}
