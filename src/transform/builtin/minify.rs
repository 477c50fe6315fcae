//! `minify`: per-module minification by output extension.

use super::text;
use crate::asset::minify::minify_by_ext;
use crate::transform::{Transform, TransformInput, TransformOutput, meta_ext};

/// Minifies scripts and stylesheets; other content passes through.
pub struct MinifyTransform;

impl Transform for MinifyTransform {
    fn id(&self) -> &str {
        "minify"
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let ext = meta_ext(&input.meta, &input.ctx.module.ext());
        let source = text(input.content);
        let code = minify_by_ext(&ext, &source)?.unwrap_or(source);
        Ok(TransformOutput::new(code, input.meta))
    }
}
