//! `script`: parse and re-print JavaScript with oxc.
//!
//! `targets` lowers syntax the listed engines lack, e.g.
//! `{ id = "script", options = { targets = "es2015" } }`.

use serde::Deserialize;

use super::{set_ext, text};
use crate::asset::minify::{process_js, script_targets, source_type_for};
use crate::transform::{Options, Transform, TransformInput, TransformOutput, parse_options};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScriptOptions {
    minify: bool,
    /// Engine list such as `es2015` or `chrome80,safari13`.
    targets: Option<String>,
}

/// Syntax-checks a script and emits normalized (optionally minified) code.
pub struct ScriptTransform;

impl Transform for ScriptTransform {
    fn id(&self) -> &str {
        "script"
    }

    fn validate(&self, options: &Options) -> anyhow::Result<()> {
        let options: ScriptOptions = parse_options(options)?;
        if let Some(targets) = &options.targets {
            script_targets(targets)?;
        }
        Ok(())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let options: ScriptOptions = parse_options(input.options)?;
        let path = &input.ctx.module.path;
        let targets = options.targets.as_deref().map(script_targets).transpose()?;
        let source = text(input.content);

        let code = process_js(
            &source,
            source_type_for(path),
            path,
            targets.as_ref(),
            options.minify,
        )?;
        Ok(TransformOutput::new(code, set_ext(input.meta, "js")))
    }
}
