//! `data`: turn JSON into a script module.
//!
//! The module's own content (if any) is parsed as JSON and the `data`
//! option is merged over it. Virtual modules have no content, so the
//! option alone defines them.

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use super::{set_ext, text};
use crate::transform::{Options, Transform, TransformInput, TransformOutput, parse_options};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DataOptions {
    data: Value,
}

/// Shallow merge: object keys from `overlay` win; a null overlay keeps `base`.
fn merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            base.extend(overlay);
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

pub struct DataTransform;

impl Transform for DataTransform {
    fn id(&self) -> &str {
        "data"
    }

    fn validate(&self, options: &Options) -> anyhow::Result<()> {
        parse_options::<DataOptions>(options).map(drop)
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let options: DataOptions = parse_options(input.options)?;
        let source = text(input.content);

        let base = if source.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&source).context("module content is not valid JSON")?
        };
        let value = merge(base, options.data);
        let code = format!("export default {};\n", serde_json::to_string_pretty(&value)?);

        Ok(TransformOutput::new(code, set_ext(input.meta, "js")))
    }
}
