//! Content transforms and chain execution.
//!
//! A transform is a pure function over `(content, meta, options)` that
//! returns new content, updated meta and any number of side outputs.
//! Rules bind an ordered list of transforms (a [`Chain`]); the chain
//! validates options in declared order and applies content in reverse
//! declared order, so `[extract-css, css, sass]` runs `sass` first.
//!
//! # Modules
//!
//! - `chain`: chain construction, composition and execution
//! - `registry`: id → transform lookup used when building rules from config
//! - `builtin`: transforms shipped with kiln (script, css, file, ...)

pub mod builtin;
mod chain;
mod registry;

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::asset::{AssetDraft, AssetOrigin, NameTemplate};
use crate::core::{Content, Module};

pub use chain::{Chain, ChainStage};
pub use registry::TransformRegistry;

/// Per-module metadata threaded through a chain. Ordered for determinism.
pub type Meta = BTreeMap<String, Value>;

/// Per-stage options as declared in the rule.
pub type Options = serde_json::Map<String, Value>;

/// Meta key holding the output extension of the primary content.
pub const META_EXT: &str = "ext";

/// Where a module is being transformed.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub module: &'a Module,
    pub chunk: &'a str,
    pub root: &'a Path,
}

/// Arguments of one transform call.
#[derive(Debug)]
pub struct TransformInput<'a> {
    pub content: Content,
    pub meta: Meta,
    pub options: &'a Options,
    pub ctx: TransformContext<'a>,
}

/// An independent asset produced while transforming a module.
///
/// Side outputs are queued on the owning chunk and never re-enter the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideOutput {
    pub name: String,
    pub ext: String,
    pub path: String,
    pub content: Content,
    pub template: Option<NameTemplate>,
}

impl SideOutput {
    pub fn new(name: impl Into<String>, ext: impl Into<String>, content: Content) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
            path: String::new(),
            content,
            template: None,
        }
    }

    pub fn with_template(mut self, template: NameTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn into_draft(self, origin: AssetOrigin) -> AssetDraft {
        AssetDraft {
            name: self.name,
            ext: self.ext,
            path: self.path,
            content: self.content,
            template: self.template,
            origin,
        }
    }
}

/// What a transform returns.
#[derive(Debug)]
pub struct TransformOutput {
    pub content: Content,
    pub meta: Meta,
    pub side_outputs: Vec<SideOutput>,
}

impl TransformOutput {
    pub fn new(content: impl Into<Content>, meta: Meta) -> Self {
        Self {
            content: content.into(),
            meta,
            side_outputs: Vec::new(),
        }
    }

    pub fn with_side_output(mut self, side: SideOutput) -> Self {
        self.side_outputs.push(side);
        self
    }
}

/// Final result of running one module through its chain.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Module id.
    pub module: String,
    pub content: Content,
    pub meta: Meta,
    /// Output extension of `content`.
    pub ext: String,
    pub side_outputs: Vec<SideOutput>,
    /// Index of the rule that handled the module, `None` when unmatched.
    pub rule: Option<usize>,
    /// Set when a best-effort rule fell back to copying the source.
    pub warning: Option<String>,
}

/// A content transform.
pub trait Transform: Send + Sync {
    /// Stable id used by rules (`use = ["script"]`).
    fn id(&self) -> &str;

    /// Receive raw bytes instead of decoded text.
    fn raw(&self) -> bool {
        false
    }

    /// Check options once, when the chain is built.
    fn validate(&self, _options: &Options) -> anyhow::Result<()> {
        Ok(())
    }

    fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput>;
}

/// Deserialize stage options into a typed struct.
pub fn parse_options<T: DeserializeOwned>(options: &Options) -> anyhow::Result<T> {
    Ok(serde_json::from_value(Value::Object(options.clone()))?)
}

/// Output extension recorded in meta, falling back to `default`.
pub fn meta_ext(meta: &Meta, default: &str) -> String {
    meta.get(META_EXT)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}
