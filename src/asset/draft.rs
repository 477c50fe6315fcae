//! Pending and emitted asset records.

use super::{AssetKind, NameTemplate};
use crate::core::Content;

/// Where an asset came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOrigin {
    /// Primary output of a chunk's modules.
    Chunk(String),
    /// By-product of one module's transform chain.
    SideOutput { chunk: String, module: String },
    /// Produced by a plugin hook, not by any module.
    Derived { plugin: String },
}

impl AssetOrigin {
    /// Owning chunk, if any.
    pub fn chunk(&self) -> Option<&str> {
        match self {
            Self::Chunk(chunk) | Self::SideOutput { chunk, .. } => Some(chunk),
            Self::Derived { .. } => None,
        }
    }

    /// Origin class; drafts of different classes are never merged.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chunk(_) => "chunk",
            Self::SideOutput { .. } => "side-output",
            Self::Derived { .. } => "derived",
        }
    }
}

impl std::fmt::Display for AssetOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chunk(chunk) => write!(f, "chunk `{chunk}`"),
            Self::SideOutput { chunk, module } => write!(f, "`{module}` in chunk `{chunk}`"),
            Self::Derived { plugin } => write!(f, "plugin `{plugin}`"),
        }
    }
}

/// An asset whose final name has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDraft {
    /// Value for `[name]`.
    pub name: String,
    /// Output extension, without the dot.
    pub ext: String,
    /// Value for `[path]`.
    pub path: String,
    pub content: Content,
    /// Explicit template; `None` picks the output default for `ext`.
    pub template: Option<NameTemplate>,
    pub origin: AssetOrigin,
}

impl AssetDraft {
    pub fn new(
        name: impl Into<String>,
        ext: impl Into<String>,
        content: Content,
        origin: AssetOrigin,
    ) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
            path: String::new(),
            content,
            template: None,
            origin,
        }
    }

    /// A plugin-produced asset.
    pub fn derived(
        plugin: impl Into<String>,
        name: impl Into<String>,
        ext: impl Into<String>,
        content: Content,
    ) -> Self {
        Self::new(
            name,
            ext,
            content,
            AssetOrigin::Derived {
                plugin: plugin.into(),
            },
        )
    }

    pub fn with_template(mut self, template: NameTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn kind(&self) -> AssetKind {
        AssetKind::from_ext(&self.ext)
    }

    /// Key under which text drafts of one chunk are concatenated.
    pub(crate) fn merge_key(&self) -> (&'static str, &str, &str, &str, Option<&str>) {
        (
            self.origin.kind(),
            &self.name,
            &self.ext,
            &self.path,
            self.template.as_ref().map(NameTemplate::as_str),
        )
    }
}

/// A named, fingerprinted output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Resolved output path relative to the output root.
    pub logical_name: String,
    /// Fingerprint at the configured truncation length.
    pub fingerprint: String,
    pub bytes: Vec<u8>,
    pub kind: AssetKind,
    pub name: String,
    pub ext: String,
    pub path: String,
    pub template: NameTemplate,
    pub origin: AssetOrigin,
}

impl Asset {
    pub fn chunk(&self) -> Option<&str> {
        self.origin.chunk()
    }

    /// Text view of the bytes, `None` for non-UTF-8 content.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}
