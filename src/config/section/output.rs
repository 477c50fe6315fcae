//! `[output]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [output]
//! path = "dist"
//! filename = "[name].[fullhash].js"
//! css_filename = "[name].[fullhash].css"
//! asset_filename = "[name].[fingerprint].[ext]"
//! clean = true
//! fingerprint_length = 20
//! unmatched = "copy"
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::asset::{MAX_FINGERPRINT_LEN, NameTemplate};
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::pipeline::UnmatchedPolicy;

/// Output naming and writing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output root, relative to the project root.
    pub path: PathBuf,
    /// Template for script outputs.
    pub filename: String,
    /// Template for stylesheet outputs.
    pub css_filename: String,
    /// Template for every other output.
    pub asset_filename: String,
    /// Remove files not produced by the run.
    pub clean: bool,
    /// Hex digits kept from the fingerprint.
    pub fingerprint_length: usize,
    pub unmatched: UnmatchedPolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dist"),
            filename: "[name].[fingerprint].js".into(),
            css_filename: "[name].[fingerprint].css".into(),
            asset_filename: "[name].[fingerprint].[ext]".into(),
            clean: false,
            fingerprint_length: 20,
            unmatched: UnmatchedPolicy::Copy,
        }
    }
}

impl OutputConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.path.as_os_str().is_empty() {
            diag.error(FieldPath::new("output.path"), "must not be empty");
        }

        for (field, template) in [
            (FieldPath::new("output.filename"), &self.filename),
            (FieldPath::new("output.css_filename"), &self.css_filename),
            (FieldPath::new("output.asset_filename"), &self.asset_filename),
        ] {
            if let Err(err) = NameTemplate::parse(template) {
                diag.error(field, err.to_string());
            }
        }

        if !(1..=MAX_FINGERPRINT_LEN).contains(&self.fingerprint_length) {
            diag.error_with_hint(
                FieldPath::new("output.fingerprint_length"),
                format!("{} is out of range", self.fingerprint_length),
                format!("use a value between 1 and {MAX_FINGERPRINT_LEN}"),
            );
        }
    }
}
