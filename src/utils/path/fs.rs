//! File system path normalization.
//!
//! - `normalize_path`: absolute form, resolving symlinks when the path exists
//! - `lexical_normalize`: fold `.` and `..` without touching the file system

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to joining a relative path with the current directory.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            lexical_normalize(path)
        } else {
            std::env::current_dir()
                .map_or_else(|_| path.to_path_buf(), |cwd| lexical_normalize(&cwd.join(path)))
        }
    })
}

/// Fold `.` and `..` components. `..` never climbs above the root.
///
/// Used for seeds that may name virtual modules, which `canonicalize`
/// cannot resolve.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // already at the root or prefix
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
