//! Source modules.

use std::path::{Path, PathBuf};

/// A single source unit loaded for one chunk.
///
/// Each chunk owns its own copy; modules are never shared between chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Absolute path (or the resolved identity path of a virtual module).
    pub path: PathBuf,
    /// Root-relative id with `/` separators. Rules match against this.
    pub id: String,
    /// Raw bytes as read from disk (empty for virtual modules).
    pub raw: Vec<u8>,
    /// Not backed by a file; only reachable through an identity rule.
    pub is_virtual: bool,
}

impl Module {
    pub fn new(path: PathBuf, id: String, raw: Vec<u8>) -> Self {
        Self {
            path,
            id,
            raw,
            is_virtual: false,
        }
    }

    pub fn new_virtual(path: PathBuf, id: String) -> Self {
        Self {
            path,
            id,
            raw: Vec::new(),
            is_virtual: true,
        }
    }

    /// File stem, e.g. `logo` for `images/logo.png`.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Lowercased file extension (empty when absent).
    pub fn ext(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    /// Directory of the module relative to `context`, with a trailing `/`.
    ///
    /// Returns an empty string when the module is not under `context`.
    pub fn dir_relative_to(&self, context: &Path) -> String {
        let Some(parent) = self.path.parent() else {
            return String::new();
        };
        match parent.strip_prefix(context) {
            Ok(rel) if rel.as_os_str().is_empty() => String::new(),
            Ok(rel) => format!("{}/", to_slash(rel)),
            Err(_) => String::new(),
        }
    }
}

/// Render a relative path with `/` separators on every platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_and_ext() {
        let module = Module::new(
            PathBuf::from("/site/src/images/Logo.PNG"),
            "src/images/Logo.PNG".into(),
            Vec::new(),
        );
        assert_eq!(module.stem(), "Logo");
        assert_eq!(module.ext(), "png");
    }

    #[test]
    fn test_dir_relative_to() {
        let module = Module::new(
            PathBuf::from("/site/src/images/icons/a.svg"),
            "src/images/icons/a.svg".into(),
            Vec::new(),
        );
        assert_eq!(module.dir_relative_to(Path::new("/site/src/images")), "icons/");
        assert_eq!(module.dir_relative_to(Path::new("/site/src/images/icons")), "");
        assert_eq!(module.dir_relative_to(Path::new("/elsewhere")), "");
    }

    #[test]
    fn test_virtual_module_is_empty() {
        let module = Module::new_virtual(PathBuf::from("/site/src/data"), "src/data".into());
        assert!(module.is_virtual);
        assert!(module.raw.is_empty());
    }
}
