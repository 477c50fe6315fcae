//! Transform chains.
//!
//! ```text
//! declared:  [A, B, C]      options validated A → B → C
//! composed:  [C, B, A]      content flows raw → C → B → A
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{
    META_EXT, Meta, Options, Transform, TransformContext, TransformInput, TransformResult,
    meta_ext,
};
use crate::core::{Content, ContentType};
use crate::pipeline::PipelineError;

/// One declared stage of a chain.
#[derive(Clone)]
pub struct ChainStage {
    pub transform: Arc<dyn Transform>,
    pub options: Options,
}

impl ChainStage {
    pub fn new(transform: Arc<dyn Transform>, options: Options) -> Self {
        Self { transform, options }
    }

    #[inline]
    pub fn id(&self) -> &str {
        self.transform.id()
    }
}

impl fmt::Debug for ChainStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainStage")
            .field("transform", &self.id())
            .field("options", &self.options)
            .finish()
    }
}

/// An ordered list of transforms, as declared by a rule.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    stages: Vec<ChainStage>,
}

impl Chain {
    /// Build a chain, validating each stage's options in declared order.
    ///
    /// Returns the failing stage id with the validation error.
    pub fn new(stages: Vec<ChainStage>) -> Result<Self, (String, anyhow::Error)> {
        for stage in &stages {
            stage
                .transform
                .validate(&stage.options)
                .map_err(|err| (stage.id().to_owned(), err))?;
        }
        Ok(Self { stages })
    }

    /// An empty chain (no-op pass-through).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stages in declared order.
    pub fn declared(&self) -> &[ChainStage] {
        &self.stages
    }

    /// Stages in execution order (reverse of declared).
    pub fn compose(&self) -> Vec<&ChainStage> {
        self.stages.iter().rev().collect()
    }

    /// Transform ids in execution order.
    pub fn execution_order(&self) -> Vec<&str> {
        self.compose().into_iter().map(ChainStage::id).collect()
    }

    /// Run the module's raw content through every stage.
    ///
    /// An empty chain copies the source through unchanged.
    pub fn run(&self, ctx: TransformContext<'_>) -> Result<TransformResult, PipelineError> {
        let module = ctx.module;
        let source_ext = module.ext();

        let mut meta = Meta::new();
        meta.insert(META_EXT.into(), Value::from(source_ext.as_str()));

        let mut content: Option<Content> = None;
        let mut side_outputs = Vec::new();

        for stage in self.compose() {
            let input = prepare_input(stage, content.take(), &module.raw, &module.id)?;
            let output = stage
                .transform
                .apply(TransformInput {
                    content: input,
                    meta,
                    options: &stage.options,
                    ctx,
                })
                .map_err(|err| PipelineError::Transform {
                    transform: stage.id().to_owned(),
                    module: module.id.clone(),
                    cause: format!("{err:#}"),
                })?;

            content = Some(output.content);
            meta = output.meta;
            side_outputs.extend(output.side_outputs);
        }

        let content = content.unwrap_or_else(|| Content::from_bytes(module.raw.clone()));
        Ok(TransformResult {
            module: module.id.clone(),
            ext: meta_ext(&meta, &source_ext),
            content,
            meta,
            side_outputs,
            rule: None,
            warning: None,
        })
    }
}

/// Convert the previous stage's output (or the raw source) to what `stage` accepts.
fn prepare_input(
    stage: &ChainStage,
    previous: Option<Content>,
    raw: &[u8],
    module: &str,
) -> Result<Content, PipelineError> {
    let mismatch = || PipelineError::TypeMismatch {
        transform: stage.id().to_owned(),
        module: module.to_owned(),
        expected: ContentType::Text,
        found: ContentType::Binary,
    };

    match (stage.transform.raw(), previous) {
        (true, Some(content)) => Ok(Content::Binary(content.into_bytes())),
        (true, None) => Ok(Content::Binary(raw.to_vec())),
        (false, Some(Content::Binary(_))) => Err(mismatch()),
        (false, Some(text)) => Ok(text),
        (false, None) => String::from_utf8(raw.to_vec())
            .map(Content::Text)
            .map_err(|_| mismatch()),
    }
}
