//! Output name templates.
//!
//! A template such as `[name].[fingerprint:8].[ext]` is parsed once and
//! rendered at emit time, after the final bytes (and therefore the
//! fingerprint) are known.
//!
//! | Placeholder                               | Value                                  |
//! |-------------------------------------------|----------------------------------------|
//! | `[name]`                                  | chunk or side-output name              |
//! | `[ext]`                                   | output extension, without the dot      |
//! | `[path]`                                  | directory relative to a context, `a/b/`|
//! | `[fingerprint]` `[contenthash]` `[fullhash]` `[hash]` | content fingerprint        |
//! | `[fingerprint:N]` (and aliases)           | fingerprint truncated to N characters  |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Longest fingerprint we can produce (blake3 hex digest).
pub const MAX_FINGERPRINT_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder `[{0}]`")]
    UnknownPlaceholder(String),
    #[error("unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
    #[error("invalid fingerprint length `{0}` (expected 1..={MAX_FINGERPRINT_LEN})")]
    InvalidLength(String),
    #[error("template is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Name,
    Ext,
    Path,
    Fingerprint(Option<usize>),
}

/// A parsed output name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    segments: Vec<Segment>,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub name: &'a str,
    pub ext: &'a str,
    pub path: &'a str,
    /// Full-length fingerprint; truncated per placeholder.
    pub fingerprint: &'a str,
}

impl NameTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        if source.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find('[') {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after
                .find(']')
                .ok_or(TemplateError::Unterminated(offset + start))?;
            let placeholder = &after[..end];

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(parse_placeholder(placeholder)?);

            let consumed = start + 1 + end + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    /// Render the template. `default_len` applies to placeholders without `:N`.
    pub fn render(&self, vars: &TemplateVars<'_>, default_len: usize) -> String {
        let mut out = String::with_capacity(self.source.len() + vars.name.len() + default_len);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(vars.name),
                Segment::Ext => out.push_str(vars.ext),
                Segment::Path => out.push_str(vars.path),
                Segment::Fingerprint(len) => {
                    let len = len.unwrap_or(default_len).min(vars.fingerprint.len());
                    out.push_str(&vars.fingerprint[..len]);
                }
            }
        }
        out
    }

    /// Whether the template contains `[name]`.
    pub fn has_name(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Name))
    }

    /// Whether the rendered name depends on content.
    pub fn has_fingerprint(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Fingerprint(_)))
    }

    /// Fingerprint length the rendered name carries: the first placeholder's
    /// explicit `:N`, else `default_len`.
    pub fn fingerprint_len(&self, default_len: usize) -> usize {
        self.segments
            .iter()
            .find_map(|s| match s {
                Segment::Fingerprint(len) => Some(len.unwrap_or(default_len)),
                _ => None,
            })
            .unwrap_or(default_len)
            .min(MAX_FINGERPRINT_LEN)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn parse_placeholder(placeholder: &str) -> Result<Segment, TemplateError> {
    let (key, len) = match placeholder.split_once(':') {
        Some((key, len)) => (key, Some(len)),
        None => (placeholder, None),
    };

    match key {
        "name" | "ext" | "path" if len.is_some() => {
            Err(TemplateError::UnknownPlaceholder(placeholder.to_owned()))
        }
        "name" => Ok(Segment::Name),
        "ext" => Ok(Segment::Ext),
        "path" => Ok(Segment::Path),
        "fingerprint" | "contenthash" | "fullhash" | "hash" => {
            let len = len.map(parse_len).transpose()?;
            Ok(Segment::Fingerprint(len))
        }
        _ => Err(TemplateError::UnknownPlaceholder(placeholder.to_owned())),
    }
}

fn parse_len(raw: &str) -> Result<usize, TemplateError> {
    match raw.parse::<usize>() {
        Ok(n) if (1..=MAX_FINGERPRINT_LEN).contains(&n) => Ok(n),
        _ => Err(TemplateError::InvalidLength(raw.to_owned())),
    }
}

impl FromStr for NameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FP: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn vars<'a>(name: &'a str, ext: &'a str, path: &'a str) -> TemplateVars<'a> {
        TemplateVars {
            name,
            ext,
            path,
            fingerprint: FP,
        }
    }

    #[test]
    fn test_render_default_template() {
        let template = NameTemplate::parse("[name].[fingerprint].[ext]").unwrap();
        assert_eq!(
            template.render(&vars("main", "js", ""), 8),
            "main.01234567.js"
        );
        assert!(template.has_fingerprint());
    }

    #[test]
    fn test_render_aliases_and_explicit_length() {
        let template = NameTemplate::parse("[name].[fullhash].css").unwrap();
        assert_eq!(
            template.render(&vars("main", "css", ""), 20),
            "main.0123456789abcdef0123.css"
        );

        let template = NameTemplate::parse("[name].[contenthash:4].js").unwrap();
        assert_eq!(template.render(&vars("app", "js", ""), 20), "app.0123.js");
        assert_eq!(template.fingerprint_len(20), 4);
    }

    #[test]
    fn test_render_path_without_fingerprint() {
        let template = NameTemplate::parse("images/[path][name].[ext]").unwrap();
        assert_eq!(
            template.render(&vars("logo", "png", "icons/"), 20),
            "images/icons/logo.png"
        );
        assert!(!template.has_fingerprint());
        assert_eq!(template.fingerprint_len(20), 20);
    }

    #[test]
    fn test_literal_only() {
        let template = NameTemplate::parse("error.html").unwrap();
        assert_eq!(template.render(&vars("x", "html", ""), 8), "error.html");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            NameTemplate::parse("[name].[chunkhash].js"),
            Err(TemplateError::UnknownPlaceholder("chunkhash".into()))
        );
        assert_eq!(
            NameTemplate::parse("[name"),
            Err(TemplateError::Unterminated(0))
        );
        assert_eq!(
            NameTemplate::parse("[hash:0].js"),
            Err(TemplateError::InvalidLength("0".into()))
        );
        assert_eq!(
            NameTemplate::parse("[name:3].js"),
            Err(TemplateError::UnknownPlaceholder("name:3".into()))
        );
        assert_eq!(NameTemplate::parse(""), Err(TemplateError::Empty));
    }
}
