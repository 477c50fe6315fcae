//! One-shot build command.
//!
//! Build phases:
//! - **Setup** - Compile rules, transform chains and plugins from config
//! - **Compile** - Resolve entries, transform modules, finalize, emit, hooks
//! - **Commit** - Stage the asset set and move it into the output root
//! - **Report** - Log the summary and any diagnostics

use crate::{
    config::{BundleConfig, ConfigError},
    log,
    pipeline::{BuildReport, Pipeline},
    transform::TransformRegistry,
    utils::plural::plural_count,
};
use anyhow::Result;

/// Build the pipeline described by `config` and write its output.
///
/// `quiet` hides the progress line and the summary (watch rebuilds
/// report through the status line instead).
pub fn build_assets(config: &BundleConfig, quiet: bool) -> Result<BuildReport> {
    let registry = TransformRegistry::with_builtins();
    let pipeline = Pipeline::from_config(config, &registry).map_err(ConfigError::Diagnostics)?;

    let report = pipeline.run(!quiet)?;

    for diagnostic in report.diagnostics() {
        log!("warning"; "{}", diagnostic);
    }
    if !quiet {
        log_summary(&report);
    }
    Ok(report)
}

fn log_summary(report: &BuildReport) {
    let compilation = &report.compilation;
    let commit = &report.commit;
    log!(
        "build";
        "{} in {} → {}",
        plural_count(compilation.module_count(), "module"),
        plural_count(compilation.chunks.len(), "chunk"),
        plural_count(compilation.assets.len(), "asset")
    );
    crate::debug_do! {
        for name in &commit.written {
            crate::debug!("commit"; "wrote {}", name);
        }
    }
    if commit.unchanged > 0 {
        log!("commit"; "{} written, {} unchanged", commit.written.len(), commit.unchanged);
    }
    if !commit.removed.is_empty() {
        log!("commit"; "removed {}", plural_count(commit.removed.len(), "stale file"));
    }
}

/// One-line summary for the watch status display.
pub fn summarize(report: &BuildReport) -> String {
    let commit = &report.commit;
    match commit.written.as_slice() {
        [] => "no output changed".to_owned(),
        [single] => format!("rebuilt: {single}"),
        written => format!("rebuilt {}", plural_count(written.len(), "asset")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, BundleConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/site.js"), "site()").unwrap();
        let mut config = test_parse_config(
            r#"
[output]
filename = "[name].js"

[[entry]]
name = "main"
seeds = ["src/site.js"]
"#,
        );
        config.root = dir.path().to_path_buf();
        (dir, config)
    }

    #[test]
    fn test_build_writes_output() {
        let (dir, config) = project();
        let report = build_assets(&config, true).unwrap();
        assert_eq!(report.commit.written, vec!["main.js"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("dist/main.js")).unwrap(),
            "site()"
        );
        assert_eq!(summarize(&report), "rebuilt: main.js");

        let again = build_assets(&config, true).unwrap();
        assert_eq!(summarize(&again), "no output changed");
    }

    #[test]
    fn test_config_problems_surface_as_error() {
        let (_dir, mut config) = project();
        config.rules = test_parse_config("[[rule]]\ntest = '('\nuse = []").rules;
        let err = build_assets(&config, true).unwrap_err();
        assert!(err.to_string().contains("rule[0].test"));
    }
}
