//! Whole-bundle minimizers.

use anyhow::Context;
use oxc::span::SourceType;

use super::{AssetMutation, HookContext, HookOutput, Plugin};
use crate::asset::AssetKind;
use crate::asset::minify::{minify_css, minify_js};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimizeTarget {
    Css,
    Js,
}

impl MinimizeTarget {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "css" => Some(Self::Css),
            "js" => Some(Self::Js),
            _ => None,
        }
    }

    const fn kind(self) -> AssetKind {
        match self {
            Self::Css => AssetKind::Style,
            Self::Js => AssetKind::Script,
        }
    }
}

/// Minifies every emitted asset of one kind in place.
#[derive(Debug, Clone, Copy)]
pub struct Minimizer {
    target: MinimizeTarget,
}

impl Minimizer {
    pub const fn new(target: MinimizeTarget) -> Self {
        Self { target }
    }
}

impl Plugin for Minimizer {
    fn id(&self) -> &str {
        match self.target {
            MinimizeTarget::Css => "css-minimizer",
            MinimizeTarget::Js => "js-minimizer",
        }
    }

    fn apply(&self, ctx: &HookContext<'_>) -> anyhow::Result<HookOutput> {
        let mut mutated_assets = Vec::new();
        for asset in ctx.assets.iter().filter(|a| a.kind == self.target.kind()) {
            let Some(source) = asset.text() else {
                continue;
            };
            let minified = match self.target {
                MinimizeTarget::Css => minify_css(source),
                MinimizeTarget::Js => {
                    let source_type = if asset.ext == "cjs" {
                        SourceType::cjs()
                    } else {
                        SourceType::mjs()
                    };
                    minify_js(source, source_type)
                }
            }
            .with_context(|| format!("cannot minify {}", asset.logical_name))?;

            if minified.as_bytes() != asset.bytes {
                mutated_assets.push(AssetMutation {
                    logical_name: asset.logical_name.clone(),
                    bytes: minified.into_bytes(),
                });
            }
        }
        Ok(HookOutput {
            mutated_assets,
            ..HookOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetDraft, AssetOrigin, AssetSet, Emitter, NameTemplate, OutputTemplates};
    use crate::core::Content;
    use crate::hooks::HookPhase;

    fn assets() -> AssetSet {
        let emitter = Emitter::new(
            OutputTemplates {
                script: NameTemplate::parse("[name].js").unwrap(),
                style: NameTemplate::parse("[name].css").unwrap(),
                asset: NameTemplate::parse("[name].[ext]").unwrap(),
            },
            8,
        );
        let mut set = AssetSet::new();
        let files = [
            ("main", "css", "a {\n  color: red;\n}\n"),
            ("done", "css", "b{color:red}"),
            ("main", "txt", "x  y"),
        ];
        for (name, ext, content) in files {
            let draft = AssetDraft::new(
                name,
                ext,
                Content::from(content),
                AssetOrigin::Chunk("main".into()),
            );
            set.insert(emitter.seal(draft).unwrap()).unwrap();
        }
        set
    }

    #[test]
    fn test_css_minimizer_mutates_only_changed_styles() {
        let set = assets();
        let ctx = HookContext {
            phase: HookPhase::AfterEmit,
            chunks: &[],
            assets: &set,
        };
        let output = Minimizer::new(MinimizeTarget::Css).apply(&ctx).unwrap();
        assert_eq!(
            output.mutated_assets,
            vec![AssetMutation {
                logical_name: "main.css".into(),
                bytes: b"a{color:red}".to_vec(),
            }]
        );
        assert!(output.new_assets.is_empty());
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(MinimizeTarget::parse("css"), Some(MinimizeTarget::Css));
        assert_eq!(MinimizeTarget::parse("html"), None);
        assert_eq!(Minimizer::new(MinimizeTarget::Js).id(), "js-minimizer");
    }
}
