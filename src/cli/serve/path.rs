//! URL to output path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Map a request URL onto a file under `root`.
///
/// Directories resolve to their `index.html`. URLs that leave `root`,
/// directly or through a symlink, resolve to nothing.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let relative = url_to_relative(url)?;

    let root = root.canonicalize().ok()?;
    let target = root.join(relative).canonicalize().ok()?;
    if !target.starts_with(&root) {
        return None;
    }

    if target.is_dir() {
        let index = target.join("index.html");
        return index.is_file().then_some(index);
    }
    target.is_file().then_some(target)
}

/// Decoded URL path without query, fragment or surrounding slashes.
///
/// `None` for undecodable URLs and for any `..` segment.
fn url_to_relative(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let trimmed = decoded.trim_matches('/');
    if trimmed.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }
    Some(trimmed.to_owned())
}
