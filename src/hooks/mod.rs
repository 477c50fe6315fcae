//! Plugin hooks.
//!
//! Plugins observe the whole bundle at fixed points of a run and may add
//! assets or replace the bytes of emitted ones.
//!
//! ```text
//! transform ─► before-chunk-finalize ─► finalize ─► before-emit ─► emit ─► after-emit ─► commit
//! ```
//!
//! Within a phase, hooks run by ascending priority, then registration
//! order. Each hook sees the effects of the ones before it.

mod html;
mod minimize;
mod phase;
mod registry;

use crate::asset::{AssetDraft, AssetSet};
use crate::pipeline::Chunk;

pub use html::{HtmlPlugin, Inject};
pub use minimize::{MinimizeTarget, Minimizer};
pub use phase::HookPhase;
pub use registry::{Hook, HookRegistry};

/// Read-only view of the run handed to a plugin.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub phase: HookPhase,
    /// Every chunk, in entry order.
    pub chunks: &'a [Chunk],
    /// Emitted assets (empty before `after-emit`).
    pub assets: &'a AssetSet,
}

impl<'a> HookContext<'a> {
    pub fn chunk(&self, name: &str) -> Option<&'a Chunk> {
        self.chunks.iter().find(|chunk| chunk.name == name)
    }
}

/// New bytes for an emitted asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMutation {
    pub logical_name: String,
    pub bytes: Vec<u8>,
}

/// What a plugin asks the pipeline to change.
#[derive(Debug, Default)]
pub struct HookOutput {
    pub new_assets: Vec<AssetDraft>,
    pub mutated_assets: Vec<AssetMutation>,
}

impl HookOutput {
    pub fn is_empty(&self) -> bool {
        self.new_assets.is_empty() && self.mutated_assets.is_empty()
    }
}

/// A whole-bundle plugin.
pub trait Plugin: Send + Sync {
    fn id(&self) -> &str;

    fn apply(&self, ctx: &HookContext<'_>) -> anyhow::Result<HookOutput>;
}
