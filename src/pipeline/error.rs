//! Pipeline error taxonomy and run-level failure reports.

use std::fmt;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use super::ChunkState;
use crate::core::ContentType;
use crate::hooks::HookPhase;

/// Fatal errors raised while resolving, transforming, emitting or committing.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot resolve `{seed}` for chunk `{chunk}`: {cause}")]
    Resolve {
        chunk: String,
        seed: String,
        cause: String,
    },

    #[error("no rule matches `{module}`")]
    UnmatchedModule { module: String },

    #[error("transform `{transform}` failed on `{module}`: {cause}")]
    Transform {
        transform: String,
        module: String,
        cause: String,
    },

    #[error("transform `{transform}` expects {expected} content but `{module}` is {found}")]
    TypeMismatch {
        transform: String,
        module: String,
        expected: ContentType,
        found: ContentType,
    },

    #[error("conflicting assets for `{logical_name}`: {first} and {second} differ")]
    EmitConflict {
        logical_name: String,
        first: String,
        second: String,
    },

    #[error("invalid output name `{logical_name}`: {reason}")]
    InvalidName {
        logical_name: String,
        reason: &'static str,
    },

    #[error("plugin `{plugin}` failed during {phase}: {cause}")]
    Hook {
        phase: HookPhase,
        plugin: String,
        cause: String,
    },

    #[error("chunk `{chunk}` cannot move from {from} to {to}")]
    InvalidTransition {
        chunk: String,
        from: ChunkState,
        to: ChunkState,
    },

    #[error("I/O error on `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("refusing to clean `{}`: it contains the project root", .0.display())]
    UnsafeClean(PathBuf),
}

impl PipelineError {
    /// Pipeline phase the error belongs to.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolve",
            Self::UnmatchedModule { .. } | Self::Transform { .. } | Self::TypeMismatch { .. } => {
                "transform"
            }
            Self::EmitConflict { .. } | Self::InvalidName { .. } => "emit",
            Self::Hook { phase, .. } => phase.as_str(),
            Self::InvalidTransition { .. } => "lifecycle",
            Self::Io(..) | Self::UnsafeClean(_) => "commit",
        }
    }

    /// Component that raised the error.
    pub fn component(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolver",
            Self::UnmatchedModule { .. } => "rules",
            Self::Transform { .. } | Self::TypeMismatch { .. } => "executor",
            Self::EmitConflict { .. }
            | Self::InvalidName { .. }
            | Self::Io(..)
            | Self::UnsafeClean(_) => "emitter",
            Self::Hook { .. } => "hooks",
            Self::InvalidTransition { .. } => "orchestrator",
        }
    }

    /// Module, plugin, chunk or asset the error is about.
    pub fn subject(&self) -> String {
        match self {
            Self::Resolve { seed, .. } => seed.clone(),
            Self::UnmatchedModule { module }
            | Self::Transform { module, .. }
            | Self::TypeMismatch { module, .. } => module.clone(),
            Self::EmitConflict { logical_name, .. } | Self::InvalidName { logical_name, .. } => {
                logical_name.clone()
            }
            Self::Hook { plugin, .. } => plugin.clone(),
            Self::InvalidTransition { chunk, .. } => chunk.clone(),
            Self::Io(path, _) | Self::UnsafeClean(path) => path.display().to_string(),
        }
    }
}

/// One line of a failed run's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub phase: &'static str,
    pub component: &'static str,
    pub subject: String,
    pub cause: String,
}

impl From<&PipelineError> for ErrorRecord {
    fn from(err: &PipelineError) -> Self {
        let cause = match err {
            PipelineError::Io(_, source) => format!("{err}: {source}"),
            _ => err.to_string(),
        };
        Self {
            phase: err.phase(),
            component: err.component(),
            subject: err.subject(),
            cause,
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}{} {} {} {}",
            "[".dimmed(),
            self.phase.cyan(),
            self.component.cyan(),
            "]".dimmed(),
            self.subject.bold(),
            "→".red(),
            self.cause
        )
    }
}

/// A run that stopped before writing any output.
#[derive(Debug)]
pub struct BuildFailure {
    pub errors: Vec<PipelineError>,
}

impl BuildFailure {
    pub fn new(errors: Vec<PipelineError>) -> Self {
        Self { errors }
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.errors.iter().map(ErrorRecord::from).collect()
    }
}

impl From<PipelineError> for BuildFailure {
    fn from(err: PipelineError) -> Self {
        Self::new(vec![err])
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "build failed:".red().bold())?;
        for (i, record) in self.records().iter().enumerate() {
            write!(f, "{record}")?;
            if i + 1 < self.errors.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for BuildFailure {}
