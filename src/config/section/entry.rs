//! `[[entry]]` tables: named entry points.
//!
//! ```toml
//! [[entry]]
//! name = "main"
//! seeds = ["src/site.js", "src/styles/site.scss"]
//! include = ["src/images/**/*.png"]
//! ```

use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::pipeline::EntryDef;
use crate::rule::Matcher;

#[derive(Debug, Clone, Deserialize)]
pub struct EntryConfig {
    /// Chunk name, used for `[name]` in output templates.
    pub name: String,
    /// Files loaded in declared order.
    #[serde(default)]
    pub seeds: Vec<String>,
    /// Globs over root-relative paths, loaded after the seeds.
    #[serde(default)]
    pub include: Vec<String>,
}

impl EntryConfig {
    pub fn to_def(&self) -> EntryDef {
        EntryDef {
            name: self.name.clone(),
            seeds: self.seeds.clone(),
            include: self.include.clone(),
        }
    }

    /// Validate every entry; names must be unique.
    pub fn validate_all(entries: &[Self], diag: &mut ConfigDiagnostics) {
        if entries.is_empty() {
            diag.error_with_hint(
                FieldPath::new("entry"),
                "no entry points declared",
                "add an `[[entry]]` table with a `name` and `seeds`",
            );
            return;
        }

        let mut names = FxHashSet::default();
        for (i, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                diag.error(FieldPath::indexed("entry", i, "name"), "must not be empty");
            } else if !names.insert(entry.name.as_str()) {
                diag.error(
                    FieldPath::indexed("entry", i, "name"),
                    format!("duplicate entry name `{}`", entry.name),
                );
            }

            if entry.seeds.is_empty() && entry.include.is_empty() {
                diag.error(
                    FieldPath::indexed("entry", i, ""),
                    "needs at least one seed or include pattern",
                );
            }

            for pattern in &entry.include {
                if let Err(err) = Matcher::glob(pattern) {
                    diag.error(
                        FieldPath::indexed("entry", i, "include"),
                        format!("invalid glob `{pattern}`: {err}"),
                    );
                }
            }
        }
    }
}
