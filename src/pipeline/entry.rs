//! Entry resolution: named entry points → seeded chunks.
//!
//! Seeds load in declared order. `include` globs add statically matched
//! files after the seeds, sorted by id. Imports are never followed, and
//! two entries naming the same file each load their own copy. Scans never
//! descend into the output root or a commit's staging directory, so one
//! run's output is never the next run's input.

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use super::{BuildFailure, Chunk, PipelineError};
use crate::asset::STAGING_PREFIX;
use crate::core::{Module, to_slash};
use crate::rule::{Matcher, RuleTable, normalize_id};
use crate::utils::path::lexical_normalize;

/// A named entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDef {
    pub name: String,
    /// Root-relative (or absolute) paths, in load order.
    pub seeds: Vec<String>,
    /// Glob patterns over module ids.
    pub include: Vec<String>,
}

impl EntryDef {
    pub fn new(name: impl Into<String>, seeds: Vec<String>) -> Self {
        Self {
            name: name.into(),
            seeds,
            include: Vec::new(),
        }
    }
}

/// Absolute path and module id of a seed.
///
/// Ids of files outside `root` keep their absolute form.
pub fn module_id(root: &Path, seed: &str) -> (PathBuf, String) {
    let path = lexical_normalize(&root.join(seed));
    let id = match path.strip_prefix(root) {
        Ok(rel) => to_slash(rel),
        Err(_) => normalize_id(&path.to_string_lossy()),
    };
    (path, id)
}

/// Resolve every entry into a chunk. All failures are reported together.
///
/// `output` is the output root; include scans skip it.
pub fn resolve(
    entries: &[EntryDef],
    rules: &RuleTable,
    root: &Path,
    output: &Path,
) -> Result<Vec<Chunk>, BuildFailure> {
    let mut chunks = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();

    for entry in entries {
        match resolve_entry(entry, rules, root, output) {
            Ok(chunk) => chunks.push(chunk),
            Err(mut errs) => errors.append(&mut errs),
        }
    }

    if errors.is_empty() {
        Ok(chunks)
    } else {
        Err(BuildFailure::new(errors))
    }
}

fn resolve_entry(
    entry: &EntryDef,
    rules: &RuleTable,
    root: &Path,
    output: &Path,
) -> Result<Chunk, Vec<PipelineError>> {
    let mut modules = Vec::new();
    let mut seen = FxHashSet::default();
    let mut errors = Vec::new();

    for seed in &entry.seeds {
        let (path, id) = module_id(root, seed);
        if !seen.insert(id.clone()) {
            continue;
        }
        match load(&path, &id, rules) {
            Ok(module) => modules.push(module),
            Err(cause) => errors.push(PipelineError::Resolve {
                chunk: entry.name.clone(),
                seed: seed.clone(),
                cause,
            }),
        }
    }

    for (path, id) in scan_includes(&entry.include, root, output) {
        if !seen.insert(id.clone()) {
            continue;
        }
        match fs::read(&path) {
            Ok(raw) => modules.push(Module::new(path, id, raw)),
            Err(err) => errors.push(PipelineError::Resolve {
                chunk: entry.name.clone(),
                seed: id,
                cause: err.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        crate::debug!("resolve"; "chunk `{}`: {} modules", entry.name, modules.len());
        Ok(Chunk::new(entry.name.clone(), modules))
    } else {
        Err(errors)
    }
}

fn load(path: &Path, id: &str, rules: &RuleTable) -> Result<Module, String> {
    if path.is_file() {
        return fs::read(path)
            .map(|raw| Module::new(path.to_path_buf(), id.to_owned(), raw))
            .map_err(|err| err.to_string());
    }
    if rules.has_identity(id) {
        return Ok(Module::new_virtual(path.to_path_buf(), id.to_owned()));
    }
    Err("no such file, and no `path` rule names it".into())
}

/// Files under `root` matching any of `patterns`, sorted by id.
fn scan_includes(patterns: &[String], root: &Path, output: &Path) -> Vec<(PathBuf, String)> {
    let matchers: Vec<_> = patterns
        .iter()
        .filter_map(|pattern| Matcher::glob(pattern).ok().map(|m| (glob_base(pattern), m)))
        .collect();
    if matchers.is_empty() {
        return Vec::new();
    }

    let mut bases: Vec<&str> = matchers.iter().map(|(base, _)| base.as_str()).collect();
    bases.sort_unstable();
    bases.dedup();

    let mut found = Vec::new();
    for base in bases {
        let dir = root.join(base);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            if is_build_output(&path, rel, output) {
                continue;
            }
            let id = to_slash(rel);
            if matchers.iter().any(|(_, m)| m.matches(&id)) {
                found.push((path, id));
            }
        }
    }

    found.sort_by(|a, b| a.1.cmp(&b.1));
    found.dedup_by(|a, b| a.1 == b.1);
    found
}

/// Inside the output root or a staging directory.
fn is_build_output(path: &Path, rel: &Path, output: &Path) -> bool {
    path.starts_with(output)
        || rel.components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|s| s.starts_with(STAGING_PREFIX))
        })
}

/// Leading directory of a glob that contains no wildcard.
fn glob_base(pattern: &str) -> String {
    let pattern = normalize_id(pattern);
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts
        .iter()
        .take(parts.len().saturating_sub(1))
        .take_while(|part| !part.contains(['*', '?']))
        .copied()
        .collect::<Vec<_>>();
    literal.join("/")
}
