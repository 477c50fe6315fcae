//! `file`: emit the module's bytes as a standalone asset.

use serde::Deserialize;

use super::set_ext;
use crate::asset::NameTemplate;
use crate::transform::{
    Options, SideOutput, Transform, TransformInput, TransformOutput, parse_options,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileOptions {
    /// Output name template; `output.asset_filename` when absent.
    name: Option<String>,
    /// Base directory for `[path]`, relative to the project root.
    context: Option<String>,
}

impl FileOptions {
    fn template(&self) -> anyhow::Result<Option<NameTemplate>> {
        Ok(self.name.as_deref().map(NameTemplate::parse).transpose()?)
    }
}

pub struct FileTransform;

impl Transform for FileTransform {
    fn id(&self) -> &str {
        "file"
    }

    fn raw(&self) -> bool {
        true
    }

    fn validate(&self, options: &Options) -> anyhow::Result<()> {
        parse_options::<FileOptions>(options)?.template().map(drop)
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let options: FileOptions = parse_options(input.options)?;
        let module = input.ctx.module;

        let context = match &options.context {
            Some(dir) => input.ctx.root.join(dir),
            None => input.ctx.root.to_path_buf(),
        };
        let mut side = SideOutput::new(module.stem(), module.ext(), input.content)
            .with_path(module.dir_relative_to(&context));
        if let Some(template) = options.template()? {
            side = side.with_template(template);
        }

        Ok(TransformOutput::new(String::new(), set_ext(input.meta, "js")).with_side_output(side))
    }
}
