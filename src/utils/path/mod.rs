//! Path utilities.

pub mod fs;

pub use fs::{lexical_normalize, normalize_path};
