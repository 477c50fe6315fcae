//! Asset kind definitions.

/// Kind of emitted asset, derived from its output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Script,
    Style,
    Markup,
    Image,
    Font,
    Data,
    Other,
}

impl AssetKind {
    pub fn from_ext(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Self::Script,
            "css" => Self::Style,
            "html" | "htm" => Self::Markup,
            "png" | "jpg" | "jpeg" | "gif" | "ico" | "svg" | "webp" | "avif" => Self::Image,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Self::Font,
            "json" | "xml" | "txt" | "map" => Self::Data,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::Markup => "markup",
            Self::Image => "image",
            Self::Font => "font",
            Self::Data => "data",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
