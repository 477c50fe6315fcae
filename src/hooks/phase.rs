//! Hook phases.

use serde::{Deserialize, Serialize};

/// A point in the pipeline lifecycle where plugin hooks run.
///
/// Phases always execute in declaration order:
/// `before-chunk-finalize → before-emit → after-emit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPhase {
    /// All chunks transformed, none finalized yet.
    BeforeChunkFinalize,
    /// All chunks finalized, no asset named yet.
    BeforeEmit,
    /// Every chunk emitted; logical names are final.
    AfterEmit,
}

impl HookPhase {
    pub const ALL: [Self; 3] = [Self::BeforeChunkFinalize, Self::BeforeEmit, Self::AfterEmit];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeChunkFinalize => "before-chunk-finalize",
            Self::BeforeEmit => "before-emit",
            Self::AfterEmit => "after-emit",
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
