//! `sass`: compile Sass/SCSS to CSS with grass.
//!
//! `@use` and `@import` resolve against the module's directory, then each
//! `load_paths` entry (root-relative), then the project root. `.sass`
//! modules are read with the indented syntax.

use anyhow::anyhow;
use serde::Deserialize;

use super::{set_ext, text};
use crate::transform::{Options, Transform, TransformInput, TransformOutput, parse_options};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Style {
    #[default]
    Expanded,
    Compressed,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SassOptions {
    style: Style,
    load_paths: Vec<String>,
}

pub struct SassTransform;

impl Transform for SassTransform {
    fn id(&self) -> &str {
        "sass"
    }

    fn validate(&self, options: &Options) -> anyhow::Result<()> {
        parse_options::<SassOptions>(options).map(drop)
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let options: SassOptions = parse_options(input.options)?;
        let module = input.ctx.module;

        let syntax = match module.path.extension().and_then(|e| e.to_str()) {
            Some("sass") => grass::InputSyntax::Sass,
            Some("css") => grass::InputSyntax::Css,
            _ => grass::InputSyntax::Scss,
        };
        let style = match options.style {
            Style::Expanded => grass::OutputStyle::Expanded,
            Style::Compressed => grass::OutputStyle::Compressed,
        };

        let mut grass_options = grass::Options::default()
            .style(style)
            .input_syntax(syntax)
            .quiet(true);
        if let Some(dir) = module.path.parent() {
            grass_options = grass_options.load_path(dir);
        }
        for path in &options.load_paths {
            grass_options = grass_options.load_path(input.ctx.root.join(path));
        }
        grass_options = grass_options.load_path(input.ctx.root);

        let code = grass::from_string(text(input.content), &grass_options)
            .map_err(|e| anyhow!("sass error: {e}"))?;
        Ok(TransformOutput::new(code, set_ext(input.meta, "css")))
    }
}
