//! `[[rule]]` tables: the ordered rule table.
//!
//! Each rule names exactly one matcher, an optional exclusion and the
//! transform chain, listed in declared order (applied last to first).
//!
//! ```toml
//! [[rule]]
//! test = '\.scss$'
//! exclude = 'vendor/'
//! use = ["extract-css", { transform = "css", options = { minify = true } }]
//!
//! [[rule]]
//! path = "src/data"
//! use = [{ transform = "data", options = { data = { title = "x" } } }]
//! ```

use serde::Deserialize;

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::rule::Matcher;
use crate::transform::Options;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    /// Regex over the root-relative module id.
    pub test: Option<String>,
    /// Path prefix.
    pub include: Option<String>,
    /// Glob over the module id.
    pub glob: Option<String>,
    /// Exactly one module id; may name a virtual module.
    pub path: Option<String>,
    /// Regex exclusion.
    pub exclude: Option<String>,
    /// Path prefix exclusion.
    pub exclude_include: Option<String>,
    #[serde(rename = "use", default)]
    pub uses: Vec<UseEntry>,
    /// Copy the module through when a transform fails.
    #[serde(default)]
    pub best_effort: bool,
}

/// One chain stage: a transform id, optionally with options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UseEntry {
    Id(String),
    Full {
        transform: String,
        #[serde(default)]
        options: Options,
    },
}

impl UseEntry {
    pub fn transform(&self) -> &str {
        match self {
            Self::Id(id) | Self::Full { transform: id, .. } => id,
        }
    }

    pub fn options(&self) -> Options {
        match self {
            Self::Id(_) => Options::new(),
            Self::Full { options, .. } => options.clone(),
        }
    }
}

/// The matcher a rule declares, before compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherConfig<'a> {
    Test(&'a str),
    Include(&'a str),
    Glob(&'a str),
    Path(&'a str),
}

impl MatcherConfig<'_> {
    pub fn build(self) -> Result<Matcher, regex::Error> {
        match self {
            Self::Test(pattern) => Matcher::regex(pattern),
            Self::Include(prefix) => Ok(Matcher::prefix(prefix)),
            Self::Glob(pattern) => Matcher::glob(pattern),
            Self::Path(id) => Ok(Matcher::identity(id)),
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Test(_) => "test",
            Self::Include(_) => "include",
            Self::Glob(_) => "glob",
            Self::Path(_) => "path",
        }
    }
}

impl RuleConfig {
    /// Every matcher the rule declares. Valid rules declare exactly one.
    pub fn matchers(&self) -> Vec<MatcherConfig<'_>> {
        [
            self.test.as_deref().map(MatcherConfig::Test),
            self.include.as_deref().map(MatcherConfig::Include),
            self.glob.as_deref().map(MatcherConfig::Glob),
            self.path.as_deref().map(MatcherConfig::Path),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// The exclusion matcher, if any.
    pub fn exclusion(&self) -> Option<MatcherConfig<'_>> {
        self.exclude
            .as_deref()
            .map(MatcherConfig::Test)
            .or_else(|| self.exclude_include.as_deref().map(MatcherConfig::Include))
    }

    /// Structural checks; patterns and transforms are checked when the
    /// pipeline is built.
    pub fn validate(&self, index: usize, diag: &mut ConfigDiagnostics) {
        match self.matchers().as_slice() {
            [_] => {}
            [] => diag.error_with_hint(
                FieldPath::indexed("rule", index, ""),
                "rule has no matcher",
                "set one of `test`, `include`, `glob` or `path`",
            ),
            many => {
                let keys: Vec<_> = many.iter().map(|m| format!("`{}`", m.key())).collect();
                diag.error(
                    FieldPath::indexed("rule", index, ""),
                    format!("rule declares several matchers: {}", keys.join(", ")),
                );
            }
        }

        if self.exclude.is_some() && self.exclude_include.is_some() {
            diag.error(
                FieldPath::indexed("rule", index, "exclude_include"),
                "cannot be combined with `exclude`",
            );
        }

        if self.uses.is_empty() {
            diag.warn(
                FieldPath::indexed("rule", index, "use"),
                "empty chain, matching modules are copied as-is",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use serde_json::json;

    #[test]
    fn test_parse_rules_keep_order_and_use_forms() {
        let config = test_parse_config(
            r#"
[[rule]]
test = '\.js$'
exclude = 'node_modules'
use = ["script"]

[[rule]]
path = "src/data"
use = [{ transform = "data", options = { data = { title = "x" } } }]
best_effort = true
"#,
        );
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].matchers(), vec![MatcherConfig::Test(r"\.js$")]);
        assert_eq!(
            config.rules[0].exclusion(),
            Some(MatcherConfig::Test("node_modules"))
        );
        assert_eq!(config.rules[0].uses, vec![UseEntry::Id("script".into())]);

        let stage = &config.rules[1].uses[0];
        assert_eq!(stage.transform(), "data");
        assert_eq!(stage.options().get("data"), Some(&json!({ "title": "x" })));
        assert!(config.rules[1].best_effort);
    }

    #[test]
    fn test_validate_requires_exactly_one_matcher() {
        let mut diag = ConfigDiagnostics::new();
        RuleConfig::default().validate(0, &mut diag);
        RuleConfig {
            test: Some("a".into()),
            glob: Some("*.js".into()),
            uses: vec![UseEntry::Id("script".into())],
            ..RuleConfig::default()
        }
        .validate(1, &mut diag);

        assert_eq!(diag.len(), 2);
        assert!(diag.errors()[1].message.contains("`test`, `glob`"));
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn test_matcher_build() {
        let matcher = MatcherConfig::Include("src/vendor").build().unwrap();
        assert!(matcher.matches("src/vendor/a.js"));
        assert!(MatcherConfig::Test("(").build().is_err());
    }
}
