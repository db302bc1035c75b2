//! Path classification: ignore filtering and project-relative normalization
//!
//! Architectural Principle: Service Layer - PathClassifier owns every decision about a path's shape
//! - Ignore entries are plain case-insensitive substrings of the slash-separated path
//! - Relative paths are always rendered with forward slashes, on every platform
//! - Candidate discovery walks a tree in a deterministic order

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Render a path with forward slashes regardless of platform
pub fn to_posix(path: &Path) -> String {
    let mut out = String::new();

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            Component::CurDir => {}
            Component::ParentDir | Component::Normal(_) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&component.as_os_str().to_string_lossy());
            }
        }
    }

    if out.is_empty() {
        out.push('.');
    }

    out
}

/// Whether any ignore entry occurs anywhere in the lowercased slash-separated path.
///
/// This is substring containment, not segment matching: `"build"` also ignores
/// `src/rebuild_notes.txt`.
pub fn is_ignored<S: AsRef<str>>(path: &Path, ignore_dirs: &[S]) -> bool {
    let path_str = to_posix(path).to_lowercase();
    ignore_dirs
        .iter()
        .any(|ignored| path_str.contains(&ignored.as_ref().to_lowercase()))
}

/// Path relative to `root`, slash-separated.
///
/// Falls back to the path as given when there is no root or the path is not under it.
pub fn to_relative_posix(path: &Path, root: Option<&Path>) -> String {
    match root.and_then(|root| path.strip_prefix(root).ok()) {
        Some(relative) => to_posix(relative),
        None => to_posix(path),
    }
}

/// Lowercase extension including the leading dot, or an empty string.
///
/// Dotfiles such as `.gitignore` and names ending in a bare dot have no extension.
pub fn file_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_string_lossy().to_lowercase()),
        _ => String::new(),
    }
}

/// Classifies candidate paths against a fixed set of ignore entries and an optional root
#[derive(Debug, Clone, Default)]
pub struct PathClassifier {
    /// Ignore entries, lowercased once up front
    ignore_dirs: Vec<String>,
    /// Root that relative paths are computed against
    root: Option<PathBuf>,
}

impl PathClassifier {
    /// Create a classifier; ignore entries are compared case-insensitively
    pub fn new<S: AsRef<str>>(ignore_dirs: &[S], root: Option<PathBuf>) -> Self {
        Self {
            ignore_dirs: ignore_dirs
                .iter()
                .map(|dir| dir.as_ref().to_lowercase())
                .collect(),
            root,
        }
    }

    /// Whether the path falls under any ignore entry
    pub fn is_ignored(&self, path: &Path) -> bool {
        is_ignored(path, &self.ignore_dirs)
    }

    /// The project-relative, slash-separated form rules are matched against
    pub fn to_relative_posix(&self, path: &Path) -> String {
        to_relative_posix(path, self.root.as_deref())
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn ignore_dirs(&self) -> &[String] {
        &self.ignore_dirs
    }
}

/// Every entry below `root` (files and directories), sorted by name at each level.
///
/// The root itself is not included and symlinked directories are not followed.
/// Entries that cannot be read are logged and skipped.
pub fn find_candidates<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let root = root.as_ref();
    let mut candidates = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => candidates.push(entry.into_path()),
            Err(e) => tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e),
        }
    }

    tracing::debug!("Discovered {} entries under {}", candidates.len(), root.display());
    candidates
}
