//! `expose`: publish a CommonJS-shaped library on `globalThis`.

use std::fmt::Write;

use anyhow::ensure;
use serde::Deserialize;

use super::{set_ext, text};
use crate::transform::{Options, Transform, TransformInput, TransformOutput, parse_options};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExposeOptions {
    exposes: Vec<String>,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

pub struct ExposeTransform;

impl Transform for ExposeTransform {
    fn id(&self) -> &str {
        "expose"
    }

    fn validate(&self, options: &Options) -> anyhow::Result<()> {
        let options: ExposeOptions = parse_options(options)?;
        ensure!(!options.exposes.is_empty(), "`exposes` must name at least one global");
        for name in &options.exposes {
            ensure!(is_identifier(name), "`{name}` is not a valid global name");
        }
        Ok(())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
        let options: ExposeOptions = parse_options(input.options)?;
        let source = text(input.content);

        let mut code = String::with_capacity(source.len() + 128);
        code.push_str("(function () {\nvar module = { exports: {} };\nvar exports = module.exports;\n");
        code.push_str(&source);
        code.push_str("\n;\n");
        for name in &options.exposes {
            writeln!(code, "globalThis[{}] = module.exports;", serde_json::to_string(name)?)?;
        }
        code.push_str("}).call(globalThis);\n");

        Ok(TransformOutput::new(code, set_ext(input.meta, "js")))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{apply, module, options};
    use super::*;
    use crate::core::Content;
    use serde_json::json;

    #[test]
    fn test_wraps_and_assigns_globals() {
        let module = module("node_modules/jquery/dist/jquery.js", b"");
        let out = apply(
            &ExposeTransform,
            &module,
            Content::from("module.exports = 42;"),
            &options(json!({ "exposes": ["$", "jQuery"] })),
        )
        .unwrap();
        let code = out.content.as_text().unwrap();
        assert!(code.contains("module.exports = 42;"));
        assert!(code.contains("globalThis[\"$\"] = module.exports;"));
        assert!(code.contains("globalThis[\"jQuery\"] = module.exports;"));
    }

    #[test]
    fn test_rejects_bad_names() {
        assert!(ExposeTransform.validate(&options(json!({ "exposes": [] }))).is_err());
        assert!(
            ExposeTransform
                .validate(&options(json!({ "exposes": ["1abc"] })))
                .is_err()
        );
        assert!(ExposeTransform.validate(&options(json!({}))).is_err());
    }
}
