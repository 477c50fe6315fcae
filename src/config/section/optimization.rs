//! `[optimization]` section configuration.
//!
//! ```toml
//! [optimization]
//! minimize = true
//! minimizer = ["css"]      # default: ["css", "js"]
//! ```

use serde::Deserialize;

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::hooks::MinimizeTarget;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Register the minimizer plugins.
    pub minimize: bool,
    /// Which minimizers `minimize` registers.
    pub minimizer: Vec<String>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            minimize: false,
            minimizer: vec!["css".into(), "js".into()],
        }
    }
}

impl OptimizationConfig {
    /// Minimizers to register, de-duplicated in declared order.
    pub fn targets(&self) -> Vec<MinimizeTarget> {
        let mut targets = Vec::new();
        for target in self.minimizer.iter().filter_map(|m| MinimizeTarget::parse(m)) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for name in &self.minimizer {
            if MinimizeTarget::parse(name).is_none() {
                diag.error_with_hint(
                    FieldPath::new("optimization.minimizer"),
                    format!("unknown minimizer `{name}`"),
                    "available: \"css\", \"js\"",
                );
            }
        }
    }
}
