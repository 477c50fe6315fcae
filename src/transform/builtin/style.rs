//! `css`: parse and re-print stylesheets with lightningcss.
//!
//! `targets` takes browserslist queries; vendor prefixes and syntax
//! lowering follow them.

use lightningcss::targets::Targets;
use serde::Deserialize;

use super::{set_ext, text};
use crate::asset::minify::{print_css, style_targets};
use crate::transform::{Options, Transform, TransformInput, TransformOutput, parse_options};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CssOptions {
    minify: bool,
    /// Browserslist queries, e.g. `["last 2 versions"]`.
    targets: Vec<String>,
}

impl CssOptions {
    fn targets(&self) -> anyhow::Result<Option<Targets>> {
        if self.targets.is_empty() {
            return Ok(None);
        }
        style_targets(&self.targets).map(Some)
    }
}

pub struct CssTransform;

impl Transform for CssTransform {
    fn id(&self) -> &str {
        "css"
    }

    fn validate(&self, options: &Options) -> anyhow::Result<()> {
        parse_options::<CssOptions>(options)?.targets().map(drop)
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let options: CssOptions = parse_options(input.options)?;
        let code = print_css(&text(input.content), options.minify, options.targets()?)?;
        Ok(TransformOutput::new(code, set_ext(input.meta, "css")))
    }
}
