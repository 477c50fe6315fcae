//! Building a pipeline from `kiln.toml`.
//!
//! Every rule, stage and plugin is checked; all problems are reported
//! together as config diagnostics.

use std::sync::Arc;

use super::{Pipeline, PipelineSettings};
use crate::asset::{Emitter, NameTemplate, OutputTemplates};
use crate::config::{
    BundleConfig, ConfigDiagnostics, FieldPath, PluginConfig, PluginKind, RuleConfig,
};
use crate::hooks::{HookPhase, HookRegistry, HtmlPlugin, MinimizeTarget, Minimizer, Plugin};
use crate::rule::{Rule, RuleTable};
use crate::transform::{Chain, ChainStage, TransformRegistry};

const DEFAULT_HTML_FILENAME: &str = "index.html";

impl Pipeline {
    /// Build a pipeline; transforms are looked up in `registry`.
    pub fn from_config(
        config: &BundleConfig,
        registry: &TransformRegistry,
    ) -> Result<Self, ConfigDiagnostics> {
        let mut diag = ConfigDiagnostics::new();

        let templates = build_templates(config, &mut diag);
        let rules = build_rules(&config.rules, registry, &mut diag);
        let hooks = build_hooks(config, &mut diag);
        config.validate_output_root(&mut diag);

        diag.print_warnings();
        let (Some(templates), Some(rules)) = (templates, rules) else {
            return Err(diag);
        };
        diag.into_result()?;

        let settings = PipelineSettings {
            root: config.root.clone(),
            output: config.output_dir(),
            clean: config.output.clean,
            unmatched: config.output.unmatched,
        };
        let entries = config.entries.iter().map(|entry| entry.to_def()).collect();
        let emitter = Emitter::new(templates, config.output.fingerprint_length);

        crate::debug!(
            "pipeline";
            "{} rules, {} hooks, transforms: {}",
            rules.len(),
            hooks.len(),
            registry.ids().join(", ")
        );
        Ok(Self::new(settings, entries, rules, hooks, emitter))
    }
}

fn parse_template(
    field: FieldPath,
    source: &str,
    diag: &mut ConfigDiagnostics,
) -> Option<NameTemplate> {
    NameTemplate::parse(source)
        .map_err(|err| diag.error(field, err.to_string()))
        .ok()
}

fn build_templates(config: &BundleConfig, diag: &mut ConfigDiagnostics) -> Option<OutputTemplates> {
    let output = &config.output;
    let script = parse_template(FieldPath::new("output.filename"), &output.filename, diag);
    let style = parse_template(FieldPath::new("output.css_filename"), &output.css_filename, diag);
    let asset = parse_template(
        FieldPath::new("output.asset_filename"),
        &output.asset_filename,
        diag,
    );
    Some(OutputTemplates {
        script: script?,
        style: style?,
        asset: asset?,
    })
}

/// Compile every rule. Returns `None` when any rule is invalid.
fn build_rules(
    configs: &[RuleConfig],
    registry: &TransformRegistry,
    diag: &mut ConfigDiagnostics,
) -> Option<RuleTable> {
    let mut rules = Vec::with_capacity(configs.len());
    let mut valid = true;
    for (i, config) in configs.iter().enumerate() {
        match build_rule(i, config, registry, diag) {
            Some(rule) => rules.push(rule),
            None => valid = false,
        }
    }
    valid.then(|| RuleTable::new(rules))
}

fn build_rule(
    index: usize,
    config: &RuleConfig,
    registry: &TransformRegistry,
    diag: &mut ConfigDiagnostics,
) -> Option<Rule> {
    let errors = diag.len();

    let matcher = match config.matchers().as_slice() {
        [single] => single
            .build()
            .map_err(|err| {
                diag.error(
                    FieldPath::indexed("rule", index, single.key()),
                    format!("invalid pattern: {err}"),
                );
            })
            .ok(),
        _ => {
            diag.error(
                FieldPath::indexed("rule", index, ""),
                "rule must declare exactly one of `test`, `include`, `glob`, `path`",
            );
            None
        }
    };

    let exclude = config.exclusion().and_then(|exclusion| {
        let field = match exclusion.key() {
            "test" => "exclude",
            _ => "exclude_include",
        };
        exclusion
            .build()
            .map_err(|err| {
                diag.error(
                    FieldPath::indexed("rule", index, field),
                    format!("invalid pattern: {err}"),
                );
            })
            .ok()
    });

    let mut stages = Vec::with_capacity(config.uses.len());
    for entry in &config.uses {
        match registry.get(entry.transform()) {
            Some(transform) => stages.push(ChainStage::new(transform, entry.options())),
            None => diag.error_with_hint(
                FieldPath::indexed("rule", index, "use"),
                format!("unknown transform `{}`", entry.transform()),
                format!("available: {}", registry.ids().join(", ")),
            ),
        }
    }

    if diag.len() > errors {
        return None;
    }

    let chain = match Chain::new(stages) {
        Ok(chain) => chain,
        Err((transform, err)) => {
            diag.error(
                FieldPath::indexed("rule", index, "use"),
                format!("invalid options for `{transform}`: {err:#}"),
            );
            return None;
        }
    };

    let mut rule = Rule::new(matcher?, chain).best_effort(config.best_effort);
    if let Some(exclude) = exclude {
        rule = rule.exclude(exclude);
    }
    Some(rule)
}

fn build_hooks(config: &BundleConfig, diag: &mut ConfigDiagnostics) -> HookRegistry {
    let mut hooks = HookRegistry::new();
    let mut minimizers = Vec::new();

    for (i, plugin) in config.plugins.iter().enumerate() {
        let built: Option<Arc<dyn Plugin>> = match plugin.kind() {
            Some(PluginKind::Html) => build_html(i, plugin, config, diag).map(|p| Arc::new(p) as _),
            Some(PluginKind::CssMinimizer) => {
                minimizers.push(MinimizeTarget::Css);
                Some(Arc::new(Minimizer::new(MinimizeTarget::Css)))
            }
            Some(PluginKind::JsMinimizer) => {
                minimizers.push(MinimizeTarget::Js);
                Some(Arc::new(Minimizer::new(MinimizeTarget::Js)))
            }
            None => {
                diag.error(
                    FieldPath::indexed("plugin", i, "kind"),
                    format!("unknown plugin `{}`", plugin.kind),
                );
                None
            }
        };
        if let Some(built) = built {
            hooks.register(HookPhase::AfterEmit, plugin.priority(), built);
        }
    }

    if config.optimization.minimize {
        for target in config.optimization.targets() {
            if !minimizers.contains(&target) {
                hooks.register(HookPhase::AfterEmit, 0, Arc::new(Minimizer::new(target)));
            }
        }
    }

    hooks
}

fn build_html(
    index: usize,
    plugin: &PluginConfig,
    config: &BundleConfig,
    diag: &mut ConfigDiagnostics,
) -> Option<HtmlPlugin> {
    let filename = parse_template(
        FieldPath::indexed("plugin", index, "filename"),
        plugin.filename.as_deref().unwrap_or(DEFAULT_HTML_FILENAME),
        diag,
    )?;

    if let Some(template) = &plugin.template {
        let path = config.root_join(template);
        if !path.is_file() {
            diag.error(
                FieldPath::indexed("plugin", index, "template"),
                format!("template `{}` not found", template.display()),
            );
            return None;
        }
    }

    if let Some(chunks) = &plugin.chunks {
        for chunk in chunks {
            if !config.entries.iter().any(|entry| &entry.name == chunk) {
                diag.warn(
                    FieldPath::indexed("plugin", index, "chunks"),
                    format!("no entry named `{chunk}`"),
                );
            }
        }
    }

    Some(HtmlPlugin {
        template: plugin.template.as_ref().map(|t| config.root_join(t)),
        chunks: plugin.chunks.clone(),
        inject: plugin.inject.unwrap_or_default(),
        filename,
        public_path: plugin.public_path.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    fn config(content: &str) -> BundleConfig {
        let mut config = test_parse_config(content);
        config.root = PathBuf::from("/site");
        config
    }

    #[test]
    fn test_builds_rules_in_order() {
        let config = config(
            r#"
[[entry]]
name = "main"
seeds = ["src/site.js"]

[[rule]]
test = '\.scss$'
use = ["extract-css", { transform = "css", options = { minify = true } }]

[[rule]]
include = "src"
exclude = 'vendor'
use = []
"#,
        );
        let pipeline = Pipeline::from_config(&config, &TransformRegistry::with_builtins()).unwrap();
        assert_eq!(pipeline.rules().len(), 2);

        let (index, rule) = pipeline.rules().find("src/a.scss").unwrap();
        assert_eq!(index, 0);
        assert_eq!(rule.chain.execution_order(), vec!["css", "extract-css"]);

        assert_eq!(pipeline.rules().find("src/a.js").map(|(i, _)| i), Some(1));
        assert!(pipeline.rules().find("src/vendor/a.js").is_none());
        assert_eq!(pipeline.settings().output, PathBuf::from("/site/dist"));
    }

    #[test]
    fn test_reports_every_rule_problem() {
        let config = config(
            r#"
[[rule]]
test = '('
use = ["script"]

[[rule]]
test = '\.less$'
use = ["less", "css"]

[[rule]]
test = '\.css$'
use = [{ transform = "css", options = { minfy = true } }]
"#,
        );
        let diag = Pipeline::from_config(&config, &TransformRegistry::with_builtins()).unwrap_err();
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["rule[0].test", "rule[1].use", "rule[2].use"]);
        assert!(diag.errors()[1].message.contains("less"));
        assert!(diag.errors()[2].message.contains("`css`"));
    }

    #[test]
    fn test_registers_plugins_and_minimizers() {
        let config = config(
            r#"
[[plugin]]
kind = "html"

[[plugin]]
kind = "css-minimizer"

[optimization]
minimize = true
"#,
        );
        let pipeline = Pipeline::from_config(&config, &TransformRegistry::with_builtins()).unwrap();
        let ids: Vec<_> = pipeline
            .hooks()
            .hooks(HookPhase::AfterEmit)
            .iter()
            .map(|hook| hook.plugin.id().to_owned())
            .collect();
        // minimizers (priority 0) before html (priority 100); css not registered twice
        assert_eq!(ids, vec!["css-minimizer", "js-minimizer", "html"]);
    }

    #[test]
    fn test_missing_html_template() {
        let config = config("[[plugin]]\nkind = \"html\"\ntemplate = \"nope.html\"");
        let diag = Pipeline::from_config(&config, &TransformRegistry::with_builtins()).unwrap_err();
        assert_eq!(diag.errors()[0].field.as_str(), "plugin[0].template");
    }
}
