//! Bundle configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── output     # [output]
//! │   ├── entry      # [[entry]]
//! │   ├── rule       # [[rule]]
//! │   ├── plugin     # [[plugin]]
//! │   ├── optimization # [optimization]
//! │   └── serve      # [serve]
//! ├── types/         # ConfigError, diagnostics, field paths
//! └── mod.rs         # BundleConfig (this file)
//! ```
//!
//! Loading only checks the file's shape. Regexes, transform ids and
//! transform options are checked when the pipeline is built from it
//! (`Pipeline::from_config`), and both passes report every problem at once.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    EntryConfig, MatcherConfig, OptimizationConfig, OutputConfig, PluginConfig, PluginKind,
    RuleConfig, ServeConfig, UseEntry,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{BuildArgs, Cli, Commands};
use crate::log;
use crate::utils::path::{lexical_normalize, normalize_path};
use anyhow::Result;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default, rename = "entry")]
    pub entries: Vec<EntryConfig>,

    /// Rules in declaration order; the first match wins.
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,

    #[serde(default, rename = "plugin")]
    pub plugins: Vec<PluginConfig>,

    #[serde(default)]
    pub optimization: OptimizationConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl BundleConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file. The project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path =
            find_config_file(&cli.config).ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.set_config_path(path);
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Record the config file and derive the project root from it.
    pub fn set_config_path(&mut self, path: &Path) {
        self.config_path = normalize_path(path);
        self.root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        lexical_normalize(&self.root.join(path))
    }

    /// Absolute output root.
    pub fn output_dir(&self) -> PathBuf {
        self.root_join(&self.output.path)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Serve {
                build_args,
                interface,
                port,
                watch,
            } => {
                self.apply_build_args(build_args);
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
        }
    }

    /// Apply build arguments from CLI.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        crate::logger::set_verbose(args.verbose);

        Self::update_option(&mut self.optimization.minimize, args.minify.as_ref());
        if args.clean {
            self.output.clean = true;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check the config's shape. Collects all errors and returns them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.output.validate(&mut diag);
        self.validate_output_root(&mut diag);
        EntryConfig::validate_all(&self.entries, &mut diag);
        for (i, rule) in self.rules.iter().enumerate() {
            rule.validate(i, &mut diag);
        }
        for (i, plugin) in self.plugins.iter().enumerate() {
            plugin.validate(i, &mut diag);
        }
        self.optimization.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// The output root may be cleaned, so it must hold no sources: not the
    /// project root, no entry seed and no rule `include` prefix.
    pub fn validate_output_root(&self, diag: &mut ConfigDiagnostics) {
        const HINT: &str = "point it at a dedicated directory such as `dist`";
        let output = self.output_dir();
        let field = FieldPath::new("output.path");

        if self.root.starts_with(&output) {
            diag.error_with_hint(
                field,
                format!("`{}` contains the project root", self.output.path.display()),
                HINT,
            );
            return;
        }

        let seeds = self.entries.iter().flat_map(|entry| entry.seeds.iter());
        let prefixes = self.rules.iter().filter_map(|rule| rule.include.as_ref());
        for source in seeds.chain(prefixes) {
            if self.root_join(source).starts_with(&output) {
                diag.error_with_hint(
                    field.clone(),
                    format!("`{}` contains source `{source}`", self.output.path.display()),
                    HINT,
                );
            }
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> BundleConfig {
    let (parsed, ignored) = BundleConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = "[[entry]]\nname = \"main\"\nseeds = [\"src/site.js\"]\n";

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(BundleConfig::from_str("[output\npath = \"dist\"").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = format!("{MINIMAL}[unknown_section]\nfield = \"value\"");
        let (config, ignored) = BundleConfig::parse_with_ignored(&content).unwrap();
        assert_eq!(config.entries[0].name, "main");
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_from_path_sets_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiln.toml");
        fs::write(&path, MINIMAL).unwrap();

        let config = BundleConfig::from_path(&path).unwrap();
        let root = normalize_path(dir.path());
        assert_eq!(config.get_root(), root);
        assert_eq!(config.output_dir(), root.join("dist"));
    }

    #[test]
    fn test_validate_collects_every_section() {
        let config = test_parse_config(
            r#"
[output]
filename = "[name].[chunkhash].js"

[[rule]]
use = ["script"]

[[plugin]]
kind = "favicon"
"#,
        );
        let Err(ConfigError::Diagnostics(diag)) = config.validate() else {
            panic!("expected diagnostics");
        };
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["output.filename", "entry", "rule[0]", "plugin[0].kind"]
        );
    }

    #[test]
    fn test_output_root_must_not_hold_sources() {
        let errors = |toml: &str| {
            let mut config = test_parse_config(toml);
            config.root = PathBuf::from("/site");
            let mut diag = ConfigDiagnostics::new();
            config.validate_output_root(&mut diag);
            diag.errors()
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
        };

        assert!(errors(MINIMAL).is_empty());
        for path in [".", "..", "./"] {
            let found = errors(&format!("[output]\npath = \"{path}\"\n{MINIMAL}"));
            assert_eq!(found.len(), 1, "path `{path}`");
            assert!(found[0].contains("contains the project root"));
        }

        let found = errors(&format!(
            "[output]\npath = \"src\"\n{MINIMAL}[[rule]]\ninclude = \"src/vendor\"\nuse = []\n"
        ));
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("`src/site.js`"));
        assert!(found[1].contains("`src/vendor`"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = test_parse_config(MINIMAL);
        let cli = Cli {
            color: clap::ColorChoice::Never,
            config: PathBuf::from("kiln.toml"),
            command: Commands::Serve {
                build_args: BuildArgs {
                    clean: true,
                    minify: Some(true),
                    verbose: false,
                },
                interface: None,
                port: Some(8080),
                watch: Some(false),
            },
        };
        config.apply_command_options(&cli);
        assert!(config.output.clean);
        assert!(config.optimization.minimize);
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.watch);
    }
}
