//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module         | TOML Section       | Purpose                               |
//! |----------------|--------------------|---------------------------------------|
//! | `output`       | `[output]`         | Output root, name templates, clean    |
//! | `entry`        | `[[entry]]`        | Named entry points                    |
//! | `rule`         | `[[rule]]`         | Ordered module rules                  |
//! | `plugin`       | `[[plugin]]`       | Hook plugins (html, minimizers)       |
//! | `optimization` | `[optimization]`   | Whole-bundle minimization             |
//! | `serve`        | `[serve]`          | Development server                    |

mod entry;
mod optimization;
mod output;
mod plugin;
mod rule;
mod serve;

pub use entry::EntryConfig;
pub use optimization::OptimizationConfig;
pub use output::OutputConfig;
pub use plugin::{PluginConfig, PluginKind};
pub use rule::{MatcherConfig, RuleConfig, UseEntry};
pub use serve::ServeConfig;
