//! `extract-css`: move a stylesheet out of the script bundle.
//!
//! The primary content becomes empty and the stylesheet is queued as a
//! side output named after the chunk, so every stylesheet of a chunk
//! lands in one `<chunk>.css` asset.

use serde::Deserialize;

use super::{set_ext, text};
use crate::asset::NameTemplate;
use crate::transform::{
    Options, SideOutput, Transform, TransformInput, TransformOutput, parse_options,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ExtractOptions {
    /// Overrides `output.css_filename`.
    filename: Option<String>,
}

impl ExtractOptions {
    fn template(&self) -> anyhow::Result<Option<NameTemplate>> {
        Ok(self
            .filename
            .as_deref()
            .map(NameTemplate::parse)
            .transpose()?)
    }
}

pub struct ExtractCss;

impl Transform for ExtractCss {
    fn id(&self) -> &str {
        "extract-css"
    }

    fn validate(&self, options: &Options) -> anyhow::Result<()> {
        parse_options::<ExtractOptions>(options)?.template().map(drop)
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let options: ExtractOptions = parse_options(input.options)?;
        let mut side = SideOutput::new(input.ctx.chunk, "css", text(input.content).into());
        if let Some(template) = options.template()? {
            side = side.with_template(template);
        }
        Ok(TransformOutput::new(String::new(), set_ext(input.meta, "js")).with_side_output(side))
    }
}
