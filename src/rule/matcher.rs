//! Module matchers.
//!
//! Every matcher works on the module id: the path relative to the project
//! root with `/` separators (`src/images/logo.png`).

use std::fmt;

use regex::Regex;

/// How a rule selects modules.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Regular expression searched anywhere in the id.
    Regex(Regex),
    /// Directory (or file) prefix, compared per path component.
    Prefix(String),
    /// `*`, `**` and `?` wildcard pattern over the whole id.
    Glob { pattern: String, regex: Regex },
    /// Exactly one resolved module id. May name a virtual module.
    Identity(String),
}

impl Matcher {
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    pub fn prefix(prefix: &str) -> Self {
        Self::Prefix(normalize_id(prefix).trim_end_matches('/').to_owned())
    }

    pub fn glob(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&glob_to_regex(pattern))?;
        Ok(Self::Glob {
            pattern: pattern.to_owned(),
            regex,
        })
    }

    pub fn identity(id: &str) -> Self {
        Self::Identity(normalize_id(id))
    }

    pub fn matches(&self, id: &str) -> bool {
        match self {
            Self::Regex(regex) => regex.is_match(id),
            Self::Prefix(prefix) => {
                prefix.is_empty()
                    || id
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            }
            Self::Glob { regex, .. } => regex.is_match(id),
            Self::Identity(target) => id == target,
        }
    }

    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Identity(_))
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(regex) => write!(f, "test /{}/", regex.as_str()),
            Self::Prefix(prefix) => write!(f, "include {prefix}"),
            Self::Glob { pattern, .. } => write!(f, "glob {pattern}"),
            Self::Identity(id) => write!(f, "path {id}"),
        }
    }
}

/// Strip `./`, collapse separators to `/`.
pub fn normalize_id(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Translate a wildcard pattern into an anchored regex.
///
/// `**/` matches zero or more directories, `**` anything, `*` anything but
/// `/`, `?` one character other than `/`.
fn glob_to_regex(pattern: &str) -> String {
    let pattern = normalize_id(pattern);
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_searches_id() {
        let matcher = Matcher::regex(r"(?i)\.s[ac]ss$").unwrap();
        assert!(matcher.matches("src/site.scss"));
        assert!(matcher.matches("src/Site.SASS"));
        assert!(!matcher.matches("src/site.css"));
    }

    #[test]
    fn test_prefix_is_component_aware() {
        let matcher = Matcher::prefix("./src/images/");
        assert!(matcher.matches("src/images/logo.png"));
        assert!(matcher.matches("src/images"));
        assert!(!matcher.matches("src/images2/logo.png"));
        assert!(Matcher::prefix("").matches("anything.js"));
    }

    #[test]
    fn test_glob() {
        let matcher = Matcher::glob("src/**/*.js").unwrap();
        assert!(matcher.matches("src/site.js"));
        assert!(matcher.matches("src/a/b/site.js"));
        assert!(!matcher.matches("lib/site.js"));
        assert!(!matcher.matches("src/site.json"));

        let single = Matcher::glob("src/?.css").unwrap();
        assert!(single.matches("src/a.css"));
        assert!(!single.matches("src/ab.css"));
        assert!(!single.matches("src//.css"));
    }

    #[test]
    fn test_identity() {
        let matcher = Matcher::identity("./src/data");
        assert!(matcher.is_identity());
        assert!(matcher.matches("src/data"));
        assert!(!matcher.matches("src/data.json"));
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("./src//a\\b.js"), "src/a/b.js");
    }
}
