//! Config field paths for diagnostics.

use owo_colors::OwoColorize;
use std::borrow::Cow;
use std::fmt;

/// Location of a value in `kiln.toml`, e.g. `output.filename` or `rule[2].use`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Cow<'static, str>);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// A field of the `index`-th element of an array of tables.
    pub fn indexed(section: &str, index: usize, field: &str) -> Self {
        if field.is_empty() {
            Self(Cow::Owned(format!("{section}[{index}]")))
        } else {
            Self(Cow::Owned(format!("{section}[{index}].{field}")))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
