//! `[[plugin]]` tables: hook plugins.
//!
//! ```toml
//! [[plugin]]
//! kind = "html"
//! template = "src/index.html"
//! chunks = ["main"]
//! inject = "body"              # or "head"
//! filename = "index.html"
//! public_path = "/"
//!
//! [[plugin]]
//! kind = "css-minimizer"
//! priority = 10
//! ```
//!
//! Every built-in plugin runs after emit. `priority` orders plugins within
//! the phase (lower first; ties keep declaration order).

use std::path::PathBuf;

use serde::Deserialize;

use crate::asset::NameTemplate;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::hooks::Inject;

/// Default priority of `html`; minimizers default to 0 and run first.
pub const HTML_PRIORITY: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Html,
    CssMinimizer,
    JsMinimizer,
}

impl PluginKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "html" => Some(Self::Html),
            "css-minimizer" => Some(Self::CssMinimizer),
            "js-minimizer" => Some(Self::JsMinimizer),
            _ => None,
        }
    }

    pub const fn default_priority(self) -> i32 {
        match self {
            Self::Html => HTML_PRIORITY,
            Self::CssMinimizer | Self::JsMinimizer => 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub kind: String,
    pub priority: Option<i32>,

    // html
    pub template: Option<PathBuf>,
    pub chunks: Option<Vec<String>>,
    pub inject: Option<Inject>,
    pub filename: Option<String>,
    pub public_path: Option<String>,
}

impl PluginConfig {
    pub fn kind(&self) -> Option<PluginKind> {
        PluginKind::parse(&self.kind)
    }

    pub fn priority(&self) -> i32 {
        self.priority
            .or_else(|| self.kind().map(PluginKind::default_priority))
            .unwrap_or_default()
    }

    pub fn validate(&self, index: usize, diag: &mut ConfigDiagnostics) {
        let Some(kind) = self.kind() else {
            diag.error_with_hint(
                FieldPath::indexed("plugin", index, "kind"),
                format!("unknown plugin `{}`", self.kind),
                "available: \"html\", \"css-minimizer\", \"js-minimizer\"",
            );
            return;
        };

        if kind == PluginKind::Html {
            if let Some(filename) = &self.filename
                && let Err(err) = NameTemplate::parse(filename)
            {
                diag.error(FieldPath::indexed("plugin", index, "filename"), err.to_string());
            }
            return;
        }

        let html_only = [
            ("template", self.template.is_some()),
            ("chunks", self.chunks.is_some()),
            ("inject", self.inject.is_some()),
            ("filename", self.filename.is_some()),
            ("public_path", self.public_path.is_some()),
        ];
        for (field, set) in html_only {
            if set {
                diag.warn(
                    FieldPath::indexed("plugin", index, field),
                    format!("ignored by `{}`", self.kind),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_parse_plugins() {
        let config = test_parse_config(
            r#"
[[plugin]]
kind = "html"
template = "src/index.html"
chunks = ["main"]
inject = "head"

[[plugin]]
kind = "css-minimizer"
"#,
        );
        let html = &config.plugins[0];
        assert_eq!(html.kind(), Some(PluginKind::Html));
        assert_eq!(html.inject, Some(Inject::Head));
        assert_eq!(html.priority(), HTML_PRIORITY);
        assert_eq!(config.plugins[1].kind(), Some(PluginKind::CssMinimizer));
        assert_eq!(config.plugins[1].priority(), 0);
    }

    #[test]
    fn test_validate_plugins() {
        let config = test_parse_config(
            r#"
[[plugin]]
kind = "sitemap"

[[plugin]]
kind = "js-minimizer"
inject = "body"

[[plugin]]
kind = "html"
filename = "[name].[id].html"
"#,
        );
        let mut diag = ConfigDiagnostics::new();
        for (i, plugin) in config.plugins.iter().enumerate() {
            plugin.validate(i, &mut diag);
        }
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["plugin[0].kind", "plugin[2].filename"]);
        assert_eq!(diag.warnings()[0].0.as_str(), "plugin[1].inject");
    }
}
