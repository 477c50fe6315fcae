//! Hook registration and phase execution.

use std::fmt;
use std::sync::Arc;

use super::{HookContext, HookOutput, HookPhase, Plugin};
use crate::asset::Emitter;
use crate::pipeline::{BuildState, PipelineError};

/// A plugin bound to a phase.
#[derive(Clone)]
pub struct Hook {
    pub phase: HookPhase,
    /// Lower runs first.
    pub priority: i32,
    /// Registration order, breaks priority ties.
    pub seq: usize,
    pub plugin: Arc<dyn Plugin>,
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .field("plugin", &self.plugin.id())
            .finish()
    }
}

/// Hooks of one pipeline. Owned by the pipeline, never global.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Hook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plugin` for `phase`. Returns its sequence number.
    pub fn register(&mut self, phase: HookPhase, priority: i32, plugin: Arc<dyn Plugin>) -> usize {
        let seq = self.hooks.len();
        self.hooks.push(Hook {
            phase,
            priority,
            seq,
            plugin,
        });
        seq
    }

    /// Hooks of `phase` in execution order.
    pub fn hooks(&self, phase: HookPhase) -> Vec<&Hook> {
        let mut hooks: Vec<_> = self.hooks.iter().filter(|h| h.phase == phase).collect();
        hooks.sort_by_key(|h| (h.priority, h.seq));
        hooks
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook of `phase`, applying each output before the next hook.
    ///
    /// New assets from `after-emit` hooks are sealed right away; earlier
    /// phases queue them for emission. Mutations are only valid once assets
    /// are emitted; a mutated asset is re-fingerprinted and renamed.
    pub fn run_phase(
        &self,
        phase: HookPhase,
        state: &mut BuildState,
        emitter: &Emitter,
    ) -> Result<(), PipelineError> {
        for hook in self.hooks(phase) {
            let id = hook.plugin.id();
            let ctx = HookContext {
                phase,
                chunks: &state.chunks,
                assets: &state.assets,
            };
            let output = hook.plugin.apply(&ctx).map_err(|err| PipelineError::Hook {
                phase,
                plugin: id.to_owned(),
                cause: format!("{err:#}"),
            })?;

            crate::debug!(
                "hooks";
                "{phase}: `{id}` added {} and mutated {} assets",
                output.new_assets.len(),
                output.mutated_assets.len()
            );
            apply_output(phase, id, output, state, emitter)?;
        }
        Ok(())
    }
}

fn apply_output(
    phase: HookPhase,
    plugin: &str,
    output: HookOutput,
    state: &mut BuildState,
    emitter: &Emitter,
) -> Result<(), PipelineError> {
    for mutation in output.mutated_assets {
        let Some(asset) = state.assets.remove(&mutation.logical_name) else {
            return Err(PipelineError::Hook {
                phase,
                plugin: plugin.to_owned(),
                cause: format!("no emitted asset named `{}`", mutation.logical_name),
            });
        };
        let resealed = emitter.reseal(asset, mutation.bytes)?;
        let new_name = state.assets.insert(resealed)?;
        if new_name != mutation.logical_name {
            state.rename(&mutation.logical_name, &new_name);
        }
    }

    if phase == HookPhase::AfterEmit {
        for draft in output.new_assets {
            state.assets.insert(emitter.seal(draft)?)?;
        }
    } else {
        state.pending.extend(output.new_assets);
    }
    Ok(())
}
