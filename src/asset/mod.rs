//! Asset naming, emission and output commits.
//!
//! ```text
//! AssetDraft ──seal──► Asset ──commit──► <output root>/<logical name>
//!   (name, ext)        (fingerprint,       (staged, then moved into place)
//!                       logical name)
//! ```

mod commit;
mod draft;
mod emit;
pub mod fingerprint;
mod kind;
pub mod minify;
mod template;

pub use commit::{CommitReport, STAGING_PREFIX, commit};
pub use draft::{Asset, AssetDraft, AssetOrigin};
pub use emit::{AssetSet, Emitter, OutputTemplates};
pub use kind::AssetKind;
pub use template::{MAX_FINGERPRINT_LEN, NameTemplate, TemplateError, TemplateVars};
