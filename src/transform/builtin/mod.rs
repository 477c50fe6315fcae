//! Transforms shipped with kiln.
//!
//! | id            | input  | primary output          | side outputs              |
//! |---------------|--------|-------------------------|---------------------------|
//! | `script`      | text   | normalized script       | -                         |
//! | `css`         | text   | printed stylesheet      | -                         |
//! | `sass`        | text   | compiled stylesheet     | -                         |
//! | `extract-css` | text   | empty                   | stylesheet named by chunk |
//! | `file`        | raw    | empty                   | source bytes              |
//! | `expose`      | text   | wrapped script          | -                         |
//! | `data`        | text   | `export default <json>` | -                         |
//! | `minify`      | text   | minified by output ext  | -                         |

mod data;
mod expose;
mod extract;
mod file;
mod minify;
mod sass;
mod script;
mod style;

use std::sync::Arc;

use serde_json::Value;

use super::{META_EXT, Meta, TransformRegistry};
use crate::core::Content;

pub use data::DataTransform;
pub use expose::ExposeTransform;
pub use extract::ExtractCss;
pub use file::FileTransform;
pub use minify::MinifyTransform;
pub use sass::SassTransform;
pub use script::ScriptTransform;
pub use style::CssTransform;

pub(super) fn register_all(registry: &mut TransformRegistry) {
    registry.register(Arc::new(ScriptTransform));
    registry.register(Arc::new(CssTransform));
    registry.register(Arc::new(SassTransform));
    registry.register(Arc::new(ExtractCss));
    registry.register(Arc::new(FileTransform));
    registry.register(Arc::new(ExposeTransform));
    registry.register(Arc::new(DataTransform));
    registry.register(Arc::new(MinifyTransform));
}

/// Record the output extension of the primary content.
fn set_ext(mut meta: Meta, ext: &str) -> Meta {
    meta.insert(META_EXT.into(), Value::from(ext));
    meta
}

/// Text of a non-raw stage's input. The chain never hands binary to text stages.
fn text(content: Content) -> String {
    match content {
        Content::Text(text) => text,
        Content::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}
