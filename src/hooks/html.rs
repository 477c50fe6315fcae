//! HTML entry pages.
//!
//! Renders a template with `<script>` and `<link>` tags for the emitted
//! assets of selected chunks. Runs after emit, when names are final.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use super::{HookContext, HookOutput, Plugin};
use crate::asset::{Asset, AssetDraft, AssetKind, NameTemplate};

/// Where script tags go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inject {
    #[default]
    Body,
    Head,
}

const DEFAULT_TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>kiln</title>\n</head>\n<body>\n</body>\n</html>\n";

#[derive(Debug, Clone)]
pub struct HtmlPlugin {
    /// Template file; a bare document when absent.
    pub template: Option<PathBuf>,
    /// Chunks to include, in tag order. `None` includes every chunk.
    pub chunks: Option<Vec<String>>,
    pub inject: Inject,
    pub filename: NameTemplate,
    /// Prefix for asset URLs.
    pub public_path: String,
}

impl HtmlPlugin {
    pub fn new(filename: NameTemplate) -> Self {
        Self {
            template: None,
            chunks: None,
            inject: Inject::Body,
            filename,
            public_path: String::new(),
        }
    }

    fn selected<'a>(&self, ctx: &HookContext<'a>) -> Vec<&'a Asset> {
        let chunks: Vec<_> = match &self.chunks {
            Some(names) => names.iter().filter_map(|name| ctx.chunk(name)).collect(),
            None => ctx.chunks.iter().collect(),
        };
        chunks
            .into_iter()
            .flat_map(|chunk| chunk.assets.iter())
            .filter_map(|name| ctx.assets.get(name))
            .collect()
    }

    /// Draft name and extension of the page. `[name]` takes the first
    /// selected chunk's name, or `index` when no chunk is selected.
    fn page_name(&self, ctx: &HookContext<'_>) -> (String, String) {
        let source = self.filename.as_str();
        let file = source.rsplit('/').next().unwrap_or(source);
        let (stem, ext) = file.rsplit_once('.').unwrap_or((file, "html"));
        let ext = if ext.contains('[') { "html" } else { ext };

        if !self.filename.has_name() {
            return (stem.to_owned(), ext.to_owned());
        }
        let first = match &self.chunks {
            Some(names) => names.iter().find(|name| ctx.chunk(name).is_some()),
            None => ctx.chunks.first().map(|chunk| &chunk.name),
        };
        let name = first.map_or("index", String::as_str);
        (name.to_owned(), ext.to_owned())
    }

    fn render(&self, template: &str, assets: &[&Asset]) -> String {
        let mut styles = String::new();
        let mut scripts = String::new();
        for asset in assets {
            let href = format!("{}{}", self.public_path, asset.logical_name);
            match asset.kind {
                AssetKind::Style => {
                    styles.push_str(&format!("<link href=\"{href}\" rel=\"stylesheet\">"));
                }
                AssetKind::Script => match self.inject {
                    Inject::Body => scripts.push_str(&format!("<script src=\"{href}\"></script>")),
                    Inject::Head => {
                        scripts.push_str(&format!("<script defer src=\"{href}\"></script>"));
                    }
                },
                _ => {}
            }
        }

        let html = insert_before(template, "</head>", &styles);
        match self.inject {
            Inject::Body => insert_before(&html, "</body>", &scripts),
            Inject::Head => insert_before(&html, "</head>", &scripts),
        }
    }
}

/// Insert `snippet` before the last `tag` (ASCII case-insensitive), or append it.
fn insert_before(html: &str, tag: &str, snippet: &str) -> String {
    if snippet.is_empty() {
        return html.to_owned();
    }
    let pattern = tag.as_bytes();
    let mut result = String::with_capacity(html.len() + snippet.len());
    match html
        .as_bytes()
        .windows(pattern.len())
        .rposition(|w| w.eq_ignore_ascii_case(pattern))
    {
        Some(pos) => {
            result.push_str(&html[..pos]);
            result.push_str(snippet);
            result.push_str(&html[pos..]);
        }
        None => {
            result.push_str(html);
            result.push_str(snippet);
        }
    }
    result
}

impl Plugin for HtmlPlugin {
    fn id(&self) -> &str {
        "html"
    }

    fn apply(&self, ctx: &HookContext<'_>) -> anyhow::Result<HookOutput> {
        let template = match &self.template {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("cannot read template {}", path.display()))?,
            None => DEFAULT_TEMPLATE.to_owned(),
        };
        let html = self.render(&template, &self.selected(ctx));

        let (name, ext) = self.page_name(ctx);
        let draft = AssetDraft::derived(self.id(), name, ext, html.into())
            .with_template(self.filename.clone());

        Ok(HookOutput {
            new_assets: vec![draft],
            ..HookOutput::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetOrigin, AssetSet, Emitter, OutputTemplates};
    use crate::core::Content;
    use crate::hooks::HookPhase;
    use crate::pipeline::Chunk;
    use tempfile::TempDir;

    fn emitted(chunks: &[(&str, &[(&str, &str)])]) -> (Vec<Chunk>, AssetSet) {
        let emitter = Emitter::new(
            OutputTemplates {
                script: NameTemplate::parse("[name].js").unwrap(),
                style: NameTemplate::parse("[name].css").unwrap(),
                asset: NameTemplate::parse("[name].[ext]").unwrap(),
            },
            8,
        );
        let mut set = AssetSet::new();
        let mut out = Vec::new();
        for (name, files) in chunks {
            let mut chunk = Chunk::new(*name, Vec::new());
            chunk.record_transformed(Vec::new()).unwrap();
            chunk.finalize().unwrap();
            for (ext, content) in *files {
                chunk.drafts.push(AssetDraft::new(
                    *name,
                    *ext,
                    Content::from(*content),
                    AssetOrigin::Chunk((*name).into()),
                ));
            }
            emitter.emit(&mut chunk, &mut set).unwrap();
            out.push(chunk);
        }
        (out, set)
    }

    #[test]
    fn test_injects_selected_chunks() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("index.html");
        fs::write(
            &template,
            "<html><HEAD><title>t</title></HEAD><body><p>hi</p></body></html>",
        )
        .unwrap();

        let (chunks, assets) = emitted(&[
            ("main", &[("js", "a()"), ("css", "a{}")]),
            ("common", &[("js", "c()")]),
        ]);
        let plugin = HtmlPlugin {
            template: Some(template),
            chunks: Some(vec!["main".into()]),
            ..HtmlPlugin::new(NameTemplate::parse("index.html").unwrap())
        };
        let ctx = HookContext {
            phase: HookPhase::AfterEmit,
            chunks: &chunks,
            assets: &assets,
        };

        let output = plugin.apply(&ctx).unwrap();
        let page = &output.new_assets[0];
        assert_eq!(page.name, "index");
        assert_eq!(page.ext, "html");
        assert_eq!(
            page.content.as_text().unwrap(),
            "<html><HEAD><title>t</title><link href=\"main.css\" rel=\"stylesheet\"></HEAD>\
             <body><p>hi</p><script src=\"main.js\"></script></body></html>"
        );
    }

    #[test]
    fn test_head_injection_and_public_path() {
        let (chunks, assets) = emitted(&[("common", &[("js", "c()")])]);
        let plugin = HtmlPlugin {
            inject: Inject::Head,
            public_path: "/static/".into(),
            ..HtmlPlugin::new(NameTemplate::parse("error.html").unwrap())
        };
        let ctx = HookContext {
            phase: HookPhase::AfterEmit,
            chunks: &chunks,
            assets: &assets,
        };
        let output = plugin.apply(&ctx).unwrap();
        let html = output.new_assets[0].content.as_text().unwrap().to_owned();
        let script = html.find("<script defer src=\"/static/common.js\"></script>").unwrap();
        assert!(script < html.find("</head>").unwrap());
        assert_eq!(output.new_assets[0].name, "error");
    }

    #[test]
    fn test_name_placeholder_takes_chunk_name() {
        let (chunks, assets) = emitted(&[
            ("main", &[("js", "a()")]),
            ("admin", &[("js", "b()")]),
        ]);
        let emitter = Emitter::new(
            OutputTemplates {
                script: NameTemplate::parse("[name].js").unwrap(),
                style: NameTemplate::parse("[name].css").unwrap(),
                asset: NameTemplate::parse("[name].[ext]").unwrap(),
            },
            8,
        );
        let ctx = HookContext {
            phase: HookPhase::AfterEmit,
            chunks: &chunks,
            assets: &assets,
        };

        let plugin = HtmlPlugin {
            chunks: Some(vec!["missing".into(), "admin".into()]),
            ..HtmlPlugin::new(NameTemplate::parse("pages/[name].html").unwrap())
        };
        let draft = plugin.apply(&ctx).unwrap().new_assets.remove(0);
        assert_eq!((draft.name.as_str(), draft.ext.as_str()), ("admin", "html"));

        let plugin = HtmlPlugin::new(NameTemplate::parse("[name].[ext]").unwrap());
        let draft = plugin.apply(&ctx).unwrap().new_assets.remove(0);
        assert_eq!((draft.name.as_str(), draft.ext.as_str()), ("main", "html"));

        assert_eq!(emitter.seal(draft).unwrap().logical_name, "main.html");

        let (none, empty) = emitted(&[]);
        let ctx = HookContext {
            phase: HookPhase::AfterEmit,
            chunks: &none,
            assets: &empty,
        };
        let plugin = HtmlPlugin::new(NameTemplate::parse("pages/[name].html").unwrap());
        let draft = plugin.apply(&ctx).unwrap().new_assets.remove(0);
        assert_eq!(draft.name, "index");
    }

    #[test]
    fn test_missing_template_fails() {
        let (chunks, assets) = emitted(&[]);
        let plugin = HtmlPlugin {
            template: Some(PathBuf::from("/nonexistent/kiln/index.html")),
            ..HtmlPlugin::new(NameTemplate::parse("index.html").unwrap())
        };
        let ctx = HookContext {
            phase: HookPhase::AfterEmit,
            chunks: &chunks,
            assets: &assets,
        };
        assert!(plugin.apply(&ctx).is_err());
    }

    #[test]
    fn test_insert_before_appends_without_tag() {
        assert_eq!(insert_before("<p>", "</body>", "<x>"), "<p><x>");
        assert_eq!(insert_before("<p>", "</body>", ""), "<p>");
    }
}
