//! Transform lookup by id.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::Transform;
use super::builtin;

/// Transforms available to rules, keyed by id.
#[derive(Default, Clone)]
pub struct TransformRegistry {
    transforms: FxHashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with every built-in transform.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register a transform, replacing any previous one with the same id.
    pub fn register(&mut self, transform: Arc<dyn Transform>) -> Option<Arc<dyn Transform>> {
        self.transforms
            .insert(transform.id().to_owned(), transform)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Transform>> {
        self.transforms.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.transforms.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.transforms.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{TransformInput, TransformOutput};

    struct Upper;

    impl Transform for Upper {
        fn id(&self) -> &str {
            "script"
        }

        fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
            let text = input.content.to_text_lossy().to_uppercase();
            Ok(TransformOutput::new(text, input.meta))
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TransformRegistry::with_builtins();
        for id in [
            "script",
            "css",
            "sass",
            "extract-css",
            "file",
            "expose",
            "data",
            "minify",
        ] {
            assert!(registry.contains(id), "missing builtin `{id}`");
        }
        assert!(!registry.contains("less"));
    }

    #[test]
    fn test_register_replaces_builtin() {
        let mut registry = TransformRegistry::with_builtins();
        let previous = registry.register(Arc::new(Upper));
        assert!(previous.is_some());
        assert_eq!(registry.get("script").map(|t| t.raw()), Some(false));
        assert_eq!(registry.ids().len(), 7);
    }
}
