//! Chunks and their lifecycle.
//!
//! ```text
//! Seeded ──► ModulesTransformed ──► Finalized ──► Emitted
//! ```
//!
//! No transition skips a state and `Emitted` is terminal.

use std::fmt;

use super::PipelineError;
use crate::asset::{AssetDraft, AssetOrigin};
use crate::core::{Content, Module};
use crate::transform::TransformResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkState {
    Seeded,
    ModulesTransformed,
    Finalized,
    Emitted,
}

impl ChunkState {
    /// The only state this one may advance to.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Seeded => Some(Self::ModulesTransformed),
            Self::ModulesTransformed => Some(Self::Finalized),
            Self::Finalized => Some(Self::Emitted),
            Self::Emitted => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::ModulesTransformed => "modules-transformed",
            Self::Finalized => "finalized",
            Self::Emitted => "emitted",
        }
    }
}

impl fmt::Display for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output group bound to one entry point.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub name: String,
    /// Seeds first (declared order), then statically scanned files.
    pub modules: Vec<Module>,
    state: ChunkState,
    /// Per-module chain results, in module order.
    pub results: Vec<TransformResult>,
    /// Side outputs queued by transforms, in module order.
    pub side_outputs: Vec<AssetDraft>,
    /// Assembled drafts, available once finalized.
    pub drafts: Vec<AssetDraft>,
    /// Logical names of the assets emitted for this chunk.
    pub assets: Vec<String>,
}

impl Chunk {
    pub fn new(name: impl Into<String>, modules: Vec<Module>) -> Self {
        Self {
            name: name.into(),
            modules,
            state: ChunkState::Seeded,
            results: Vec::new(),
            side_outputs: Vec::new(),
            drafts: Vec::new(),
            assets: Vec::new(),
        }
    }

    #[inline]
    pub const fn state(&self) -> ChunkState {
        self.state
    }

    fn advance(&mut self, to: ChunkState) -> Result<(), PipelineError> {
        if self.state.next() != Some(to) {
            return Err(PipelineError::InvalidTransition {
                chunk: self.name.clone(),
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Store chain results and queue their side outputs.
    pub fn record_transformed(
        &mut self,
        results: Vec<TransformResult>,
    ) -> Result<(), PipelineError> {
        self.advance(ChunkState::ModulesTransformed)?;
        for result in &results {
            self.side_outputs.extend(result.side_outputs.iter().map(|side| {
                side.clone().into_draft(AssetOrigin::SideOutput {
                    chunk: self.name.clone(),
                    module: result.module.clone(),
                })
            }));
        }
        self.results = results;
        Ok(())
    }

    /// Assemble primary outputs and side outputs into drafts.
    ///
    /// Text drafts sharing origin kind, name, extension, path and template
    /// are joined with `\n` in module order. Side outputs of several modules
    /// merge with each other but never with the chunk's primary outputs.
    /// Binary drafts are never merged. Empty primary text contributes nothing.
    pub fn finalize(&mut self) -> Result<(), PipelineError> {
        self.advance(ChunkState::Finalized)?;

        let primary = self
            .results
            .iter()
            .filter(|r| !(r.content.as_text().is_some_and(str::is_empty)))
            .map(|r| {
                AssetDraft::new(
                    self.name.clone(),
                    r.ext.clone(),
                    r.content.clone(),
                    AssetOrigin::Chunk(self.name.clone()),
                )
            });

        let mut drafts: Vec<AssetDraft> = Vec::new();
        for draft in primary.chain(self.side_outputs.iter().cloned()) {
            if let Content::Text(text) = &draft.content
                && let Some(Content::Text(buf)) = drafts
                    .iter_mut()
                    .find(|existing| {
                        !existing.content.is_binary() && existing.merge_key() == draft.merge_key()
                    })
                    .map(|existing| &mut existing.content)
            {
                buf.push('\n');
                buf.push_str(text);
                continue;
            }
            drafts.push(draft);
        }

        self.drafts = drafts;
        Ok(())
    }

    /// Record emitted names; the chunk becomes terminal.
    pub fn mark_emitted(&mut self, names: Vec<String>) -> Result<(), PipelineError> {
        self.advance(ChunkState::Emitted)?;
        self.assets = names;
        Ok(())
    }
}
