use std::path::{Path, PathBuf};

/// Upper-cases a leading lowercase drive letter (`c:\x` becomes `C:\x`).
///
/// Paths discovered through different mechanisms (the host's workspace
/// folder, `git rev-parse`) may disagree on drive-letter case, which would
/// defeat equality checks between them. Paths without a drive prefix are
/// returned unchanged, so the rewrite is idempotent on every platform.
pub fn normalize_drive_letter(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };

    let mut characters = text.chars();
    let (Some(drive), Some(':')) = (characters.next(), characters.next()) else {
        return path.to_path_buf();
    };

    if !drive.is_ascii_lowercase() {
        return path.to_path_buf();
    }

    let mut normalized = String::with_capacity(text.len());
    normalized.push(drive.to_ascii_uppercase());
    normalized.push_str(&text[1..]);

    PathBuf::from(normalized)
}

/// Applies [`normalize_drive_letter`] to an optional path.
pub fn normalize_optional(path: Option<PathBuf>) -> Option<PathBuf> {
    path.map(|path| normalize_drive_letter(&path))
}
