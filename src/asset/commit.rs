//! Writing an asset set to the output root.
//!
//! Every asset is first written into a staging directory created next to
//! the output root. Only once staging succeeded are files moved into
//! place, so a failed write never leaves a half-updated output. With
//! `clean`, files not in the set are removed afterwards, then any
//! directories left empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use super::AssetSet;
use crate::core::to_slash;
use crate::pipeline::PipelineError;

/// Summary of one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Logical names whose bytes changed (or were new).
    pub written: Vec<String>,
    /// Logical names already up to date on disk.
    pub unchanged: usize,
    /// Stale paths removed by `clean`, relative to the output root.
    pub removed: Vec<String>,
}

/// Name prefix of the staging directory created beside the output root.
pub const STAGING_PREFIX: &str = ".kiln-staging-";

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> PipelineError + '_ {
    move |err| PipelineError::Io(path.to_path_buf(), err)
}

/// Write `set` under `output`.
pub fn commit(set: &AssetSet, output: &Path, clean: bool) -> Result<CommitReport, PipelineError> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(io_err(parent))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(io_err(parent))?;

    for asset in set.iter() {
        let staged = staging.path().join(&asset.logical_name);
        create_parent(&staged)?;
        fs::write(&staged, &asset.bytes).map_err(io_err(&staged))?;
    }

    fs::create_dir_all(output).map_err(io_err(output))?;

    let mut report = CommitReport::default();
    for asset in set.iter() {
        let dest = output.join(&asset.logical_name);
        if fs::read(&dest).is_ok_and(|existing| existing == asset.bytes) {
            report.unchanged += 1;
            continue;
        }
        create_parent(&dest)?;
        let staged = staging.path().join(&asset.logical_name);
        if fs::rename(&staged, &dest).is_err() {
            fs::copy(&staged, &dest).map_err(io_err(&dest))?;
        }
        report.written.push(asset.logical_name.clone());
    }

    if clean {
        report.removed = remove_stale(set, output)?;
    }

    crate::debug!(
        "commit";
        "{} written, {} unchanged, {} removed",
        report.written.len(),
        report.unchanged,
        report.removed.len()
    );
    Ok(report)
}

fn create_parent(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(dir) => fs::create_dir_all(dir).map_err(io_err(dir)),
        None => Ok(()),
    }
}

/// Remove files under `output` not in `set`, then empty directories.
fn remove_stale(set: &AssetSet, output: &Path) -> Result<Vec<String>, PipelineError> {
    let keep: FxHashSet<&str> = set.names().collect();

    let mut stale = Vec::new();
    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(output)
        .sort(true)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path == output {
            continue;
        }
        if entry.file_type().is_dir() {
            dirs.push(path);
            continue;
        }
        let Ok(rel) = path.strip_prefix(output) else {
            continue;
        };
        let rel = to_slash(rel);
        if !keep.contains(rel.as_str()) {
            fs::remove_file(&path).map_err(io_err(&path))?;
            stale.push(rel);
        }
    }

    // deepest first so parents see their children removed
    dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
    for dir in dirs {
        let empty = fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            fs::remove_dir(&dir).map_err(io_err(&dir))?;
            if let Ok(rel) = dir.strip_prefix(output) {
                stale.push(format!("{}/", to_slash(rel)));
            }
        }
    }

    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetDraft, AssetOrigin, Emitter, NameTemplate, OutputTemplates};
    use crate::core::Content;
    use tempfile::TempDir;

    fn set_of(files: &[(&str, &str)]) -> AssetSet {
        let emitter = Emitter::new(
            OutputTemplates {
                script: NameTemplate::parse("[name].js").unwrap(),
                style: NameTemplate::parse("[name].css").unwrap(),
                asset: NameTemplate::parse("[path][name].[ext]").unwrap(),
            },
            8,
        );
        let mut set = AssetSet::new();
        for (name, content) in files {
            let (stem, ext) = name.rsplit_once('.').unwrap();
            let (path, stem) = match stem.rsplit_once('/') {
                Some((dir, stem)) => (format!("{dir}/"), stem),
                None => (String::new(), stem),
            };
            let draft = AssetDraft::new(
                stem,
                ext,
                Content::from(*content),
                AssetOrigin::Chunk("main".into()),
            )
            .with_path(path);
            set.insert(emitter.seal(draft).unwrap()).unwrap();
        }
        set
    }

    #[test]
    fn test_commit_writes_every_asset() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("dist");
        let set = set_of(&[("main.js", "a()"), ("images/logo.png", "png")]);

        let report = commit(&set, &output, false).unwrap();
        assert_eq!(report.written.len(), 2);
        assert_eq!(fs::read_to_string(output.join("main.js")).unwrap(), "a()");
        assert_eq!(
            fs::read_to_string(output.join("images/logo.png")).unwrap(),
            "png"
        );
    }

    #[test]
    fn test_clean_removes_stale_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("dist");
        fs::create_dir_all(output.join("old/deep")).unwrap();
        fs::write(output.join("old/deep/x.js"), "stale").unwrap();
        fs::write(output.join("stale.css"), "stale").unwrap();

        let set = set_of(&[("main.js", "a()")]);
        let first = commit(&set, &output, true).unwrap();
        assert!(first.removed.contains(&"stale.css".to_string()));
        assert!(first.removed.contains(&"old/deep/x.js".to_string()));
        assert!(!output.join("old").exists());

        let second = commit(&set, &output, true).unwrap();
        assert!(second.written.is_empty());
        assert!(second.removed.is_empty());
        assert_eq!(second.unchanged, 1);

        let files: Vec<_> = fs::read_dir(&output)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("main.js")]);
    }

    #[test]
    fn test_without_clean_keeps_foreign_files() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("dist");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("keep.txt"), "mine").unwrap();

        commit(&set_of(&[("main.js", "a()")]), &output, false).unwrap();
        assert!(output.join("keep.txt").exists());
    }

    #[test]
    fn test_staging_directory_is_removed() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("dist");
        commit(&set_of(&[("main.js", "a()")]), &output, true).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(STAGING_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }
}
