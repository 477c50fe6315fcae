//! Script and stylesheet normalization, target lowering and minification.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Both the per-module
//! transforms and the whole-bundle minimizer plugins go through here.

use std::path::Path;

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};

/// Source type for a script path, falling back to an ES module.
pub fn source_type_for(path: &Path) -> SourceType {
    if path.extension().and_then(|e| e.to_str()) == Some("cjs") {
        return SourceType::cjs();
    }
    SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs())
}

/// Parse and re-print a script, failing on syntax errors.
pub fn normalize_js(source: &str, source_type: SourceType) -> Result<String> {
    process_js(source, source_type, Path::new(""), None, false)
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str, source_type: SourceType) -> Result<String> {
    process_js(source, source_type, Path::new(""), None, true)
}

/// Engine targets for [`process_js`], e.g. `es2015` or `chrome80,safari13`.
pub fn script_targets(targets: &str) -> Result<TransformOptions> {
    TransformOptions::from_target(targets).map_err(|e| anyhow!("invalid script targets: {e}"))
}

/// Parse a script, lower syntax `targets` lacks, then print it normalized or
/// minified. `path` names the script in transform errors.
pub fn process_js(
    source: &str,
    source_type: SourceType,
    path: &Path,
    targets: Option<&TransformOptions>,
    minify: bool,
) -> Result<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(err) = ret.errors.first() {
        return Err(anyhow!("script parse error: {err}"));
    }
    let mut program = ret.program;

    if let Some(options) = targets {
        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let ret = Transformer::new(&allocator, path, options)
            .build_with_scoping(scoping, &mut program);
        if let Some(err) = ret.errors.first() {
            return Err(anyhow!("script transform error: {err}"));
        }
    }

    if !minify {
        return Ok(Codegen::new().build(&program).code);
    }
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Browserslist queries for [`print_css`], e.g. `last 2 versions`.
pub fn style_targets(queries: &[String]) -> Result<Targets> {
    let browsers = Browsers::from_browserslist(queries)
        .map_err(|e| anyhow!("invalid css targets: {e}"))?;
    Ok(Targets::from(browsers))
}

/// Parse and re-print a stylesheet, optionally minified. With browser
/// `targets`, vendor prefixes are added and newer syntax is lowered.
pub fn print_css(source: &str, minify: bool, targets: Option<Targets>) -> Result<String> {
    let mut stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| anyhow!("stylesheet parse error: {e}"))?;
    let targets = targets.unwrap_or_default();
    if minify || targets.browsers.is_some() {
        stylesheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| anyhow!("stylesheet minify error: {e}"))?;
    }
    let result = stylesheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("stylesheet print error: {e}"))?;
    Ok(result.code)
}

/// Minify CSS source code.
#[inline]
pub fn minify_css(source: &str) -> Result<String> {
    print_css(source, true, None)
}

/// Minify content based on output extension.
///
/// Returns `Ok(None)` for extensions that have no minifier.
pub fn minify_by_ext(ext: &str, content: &str) -> Result<Option<String>> {
    match ext {
        "js" | "mjs" => minify_js(content, SourceType::mjs()).map(Some),
        "cjs" => minify_js(content, SourceType::cjs()).map(Some),
        "css" => minify_css(content).map(Some),
        _ => Ok(None),
    }
}
