//! Pipeline orchestration.
//!
//! ```text
//! resolve ──► transform (rayon) ──► before-chunk-finalize
//!    ──► finalize ──► before-emit ──► emit ──► after-emit ──► commit
//! ```
//!
//! Everything up to `after-emit` happens in memory. The output root is only
//! touched by [`Pipeline::run`] once every phase succeeded, so a failed run
//! leaves the previous output untouched.
//!
//! # Modules
//!
//! - `entry`: entry points → seeded chunks
//! - `execute`: per-module rule dispatch and chain execution
//! - `chunk`: chunk lifecycle and draft assembly
//! - `setup`: building a pipeline from `kiln.toml`
//! - `error`: error taxonomy and failure reports

mod chunk;
mod entry;
mod error;
mod execute;
mod setup;


use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Deserialize;

use crate::asset::{AssetDraft, AssetSet, CommitReport, Emitter, commit};
use crate::hooks::{HookPhase, HookRegistry};
use crate::logger::ProgressLine;
use crate::rule::RuleTable;

pub use chunk::{Chunk, ChunkState};
pub use entry::{EntryDef, module_id};
pub use error::{BuildFailure, ErrorRecord, PipelineError};

/// Mutable state shared by the orchestrator and hook phases.
#[derive(Debug, Default)]
pub struct BuildState {
    pub chunks: Vec<Chunk>,
    pub assets: AssetSet,
    /// Drafts added by hooks before emission, sealed with the chunks.
    pub pending: Vec<AssetDraft>,
}

impl BuildState {
    /// Follow an asset rename in every chunk that lists it.
    pub fn rename(&mut self, old: &str, new: &str) {
        for chunk in &mut self.chunks {
            for name in chunk.assets.iter_mut().filter(|name| *name == old) {
                *name = new.to_owned();
            }
        }
    }
}

/// Non-fatal findings of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// More than one rule matched; the first one was used.
    RuleMatchAmbiguity { module: String, rules: Vec<usize> },
    /// A best-effort rule failed and the module was copied through.
    BestEffortSkip {
        module: String,
        rule: usize,
        cause: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleMatchAmbiguity { module, rules } => {
                let listed: Vec<_> = rules.iter().map(|i| format!("#{i}")).collect();
                write!(
                    f,
                    "`{module}` matches rules {}, using the first",
                    listed.join(", ")
                )
            }
            Self::BestEffortSkip {
                module,
                rule,
                cause,
            } => write!(f, "rule #{rule} skipped `{module}`, copied as-is: {cause}"),
        }
    }
}

/// What happens to a module no rule matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Copy the source bytes through unchanged.
    #[default]
    Copy,
    /// Fail the run.
    Error,
}

/// Paths and switches of one pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Project root; module ids are relative to it.
    pub root: PathBuf,
    /// Output root.
    pub output: PathBuf,
    /// Remove stale files from the output root on commit.
    pub clean: bool,
    pub unmatched: UnmatchedPolicy,
}

/// In-memory result of a successful run.
#[derive(Debug)]
pub struct Compilation {
    pub chunks: Vec<Chunk>,
    pub assets: AssetSet,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn module_count(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.modules.len()).sum()
    }
}

/// A committed run.
#[derive(Debug)]
pub struct BuildReport {
    pub compilation: Compilation,
    pub commit: CommitReport,
}

impl BuildReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.compilation.diagnostics
    }
}

/// A configured build: entries, rules, hooks and naming.
///
/// Owns its hook registry, so independent pipelines never share hooks.
#[derive(Debug)]
pub struct Pipeline {
    settings: PipelineSettings,
    entries: Vec<EntryDef>,
    rules: Arc<RuleTable>,
    hooks: HookRegistry,
    emitter: Emitter,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        entries: Vec<EntryDef>,
        rules: RuleTable,
        hooks: HookRegistry,
        emitter: Emitter,
    ) -> Self {
        Self {
            settings,
            entries,
            rules: Arc::new(rules),
            hooks,
            emitter,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn entries(&self) -> &[EntryDef] {
        &self.entries
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Run every phase in memory. Nothing is written.
    ///
    /// With `show_progress`, a module counter is displayed while transforming.
    pub fn compile(&self, show_progress: bool) -> Result<Compilation, BuildFailure> {
        let mut chunks = entry::resolve(
            &self.entries,
            &self.rules,
            &self.settings.root,
            &self.settings.output,
        )?;

        let total = chunks.iter().map(|chunk| chunk.modules.len()).sum();
        let progress = show_progress.then(|| ProgressLine::new(&[("modules", total)]));
        let outcomes: Vec<_> = chunks
            .par_iter()
            .map(|chunk| {
                execute::transform_chunk(chunk, &self.rules, &self.settings, progress.as_ref())
            })
            .collect();
        if let Some(progress) = progress {
            progress.finish();
        }

        let mut diagnostics = Vec::new();
        let mut errors = Vec::new();
        for (chunk, outcome) in chunks.iter_mut().zip(outcomes) {
            match outcome {
                Ok(outcome) => {
                    diagnostics.extend(outcome.diagnostics);
                    chunk.record_transformed(outcome.results)?;
                }
                Err(mut errs) => errors.append(&mut errs),
            }
        }
        if !errors.is_empty() {
            return Err(BuildFailure::new(errors));
        }

        let mut state = BuildState {
            chunks,
            ..BuildState::default()
        };

        self.hooks
            .run_phase(HookPhase::BeforeChunkFinalize, &mut state, &self.emitter)?;
        for chunk in &mut state.chunks {
            chunk.finalize()?;
        }

        self.hooks
            .run_phase(HookPhase::BeforeEmit, &mut state, &self.emitter)?;
        for chunk in &mut state.chunks {
            self.emitter.emit(chunk, &mut state.assets)?;
        }
        for draft in std::mem::take(&mut state.pending) {
            state.assets.insert(self.emitter.seal(draft)?)?;
        }

        self.hooks
            .run_phase(HookPhase::AfterEmit, &mut state, &self.emitter)?;

        crate::debug!(
            "pipeline";
            "{} chunks, {} assets, {} diagnostics",
            state.chunks.len(),
            state.assets.len(),
            diagnostics.len()
        );

        Ok(Compilation {
            chunks: state.chunks,
            assets: state.assets,
            diagnostics,
        })
    }

    /// Compile, then write the asset set to the output root.
    ///
    /// Cleaning an output root that contains the project root is refused
    /// before anything is compiled.
    pub fn run(&self, show_progress: bool) -> Result<BuildReport, BuildFailure> {
        let settings = &self.settings;
        if settings.clean && settings.root.starts_with(&settings.output) {
            return Err(PipelineError::UnsafeClean(settings.output.clone()).into());
        }
        let compilation = self.compile(show_progress)?;
        let commit = commit(&compilation.assets, &self.settings.output, self.settings.clean)?;
        Ok(BuildReport {
            compilation,
            commit,
        })
    }
}
