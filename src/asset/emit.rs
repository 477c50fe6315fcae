//! Naming and collecting emitted assets.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::fingerprint;
use super::{Asset, AssetDraft, AssetKind, AssetOrigin, NameTemplate, TemplateVars};
use crate::pipeline::{Chunk, PipelineError};

/// Default templates per output kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplates {
    /// `js` outputs.
    pub script: NameTemplate,
    /// `css` outputs.
    pub style: NameTemplate,
    /// Everything else.
    pub asset: NameTemplate,
}

impl OutputTemplates {
    pub fn for_ext(&self, ext: &str) -> &NameTemplate {
        match ext {
            "js" | "mjs" | "cjs" => &self.script,
            "css" => &self.style,
            _ => &self.asset,
        }
    }
}

/// Turns drafts into fingerprinted, named assets.
#[derive(Debug, Clone)]
pub struct Emitter {
    templates: OutputTemplates,
    fingerprint_len: usize,
}

impl Emitter {
    pub fn new(templates: OutputTemplates, fingerprint_len: usize) -> Self {
        Self {
            templates,
            fingerprint_len,
        }
    }

    pub fn templates(&self) -> &OutputTemplates {
        &self.templates
    }

    /// Fingerprint a draft's final bytes and resolve its logical name.
    pub fn seal(&self, draft: AssetDraft) -> Result<Asset, PipelineError> {
        let template = draft
            .template
            .unwrap_or_else(|| self.templates.for_ext(&draft.ext).clone());
        self.build(
            draft.content.into_bytes(),
            draft.name,
            draft.ext,
            draft.path,
            template,
            draft.origin,
        )
    }

    /// Re-seal an asset with new bytes, keeping its template and origin.
    pub fn reseal(&self, asset: Asset, bytes: Vec<u8>) -> Result<Asset, PipelineError> {
        self.build(
            bytes,
            asset.name,
            asset.ext,
            asset.path,
            asset.template,
            asset.origin,
        )
    }

    fn build(
        &self,
        bytes: Vec<u8>,
        name: String,
        ext: String,
        path: String,
        template: NameTemplate,
        origin: AssetOrigin,
    ) -> Result<Asset, PipelineError> {
        let full = fingerprint::compute(&bytes);
        let logical_name = template.render(
            &TemplateVars {
                name: &name,
                ext: &ext,
                path: &path,
                fingerprint: &full,
            },
            self.fingerprint_len,
        );
        validate_name(&logical_name)?;
        let fingerprint_len = template.fingerprint_len(self.fingerprint_len);

        Ok(Asset {
            fingerprint: fingerprint::truncate(&full, fingerprint_len).to_owned(),
            kind: AssetKind::from_ext(&ext),
            logical_name,
            bytes,
            name,
            ext,
            path,
            template,
            origin,
        })
    }

    /// Seal every finalized draft of `chunk` into `set`; the chunk becomes emitted.
    ///
    /// Returns the logical names in draft order.
    pub fn emit(
        &self,
        chunk: &mut Chunk,
        set: &mut AssetSet,
    ) -> Result<Vec<String>, PipelineError> {
        let mut names = Vec::with_capacity(chunk.drafts.len());
        for draft in std::mem::take(&mut chunk.drafts) {
            let asset = self.seal(draft)?;
            names.push(set.insert(asset)?);
        }
        chunk.mark_emitted(names.clone())?;
        Ok(names)
    }
}

/// Reject names that would escape the output root or be unwritable.
fn validate_name(name: &str) -> Result<(), PipelineError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with('/') {
        Some("name must be relative")
    } else if name.contains('\\') || name.contains('\0') {
        Some("name contains a forbidden character")
    } else if name.split('/').any(|part| part == "..") {
        Some("name escapes the output root")
    } else if name.split('/').any(str::is_empty) {
        Some("name has an empty path segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PipelineError::InvalidName {
            logical_name: name.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

/// The run's output set, keyed by logical name.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    assets: BTreeMap<String, Asset>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset. Identical bytes under one name are de-duplicated;
    /// different bytes are a conflict.
    pub fn insert(&mut self, asset: Asset) -> Result<String, PipelineError> {
        match self.assets.entry(asset.logical_name.clone()) {
            Entry::Vacant(slot) => {
                let name = slot.key().clone();
                slot.insert(asset);
                Ok(name)
            }
            Entry::Occupied(existing) if existing.get().bytes == asset.bytes => {
                Ok(existing.key().clone())
            }
            Entry::Occupied(existing) => Err(PipelineError::EmitConflict {
                logical_name: asset.logical_name,
                first: existing.get().origin.to_string(),
                second: asset.origin.to_string(),
            }),
        }
    }

    pub fn get(&self, logical_name: &str) -> Option<&Asset> {
        self.assets.get(logical_name)
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.assets.contains_key(logical_name)
    }

    pub fn remove(&mut self, logical_name: &str) -> Option<Asset> {
        self.assets.remove(logical_name)
    }

    /// Assets sorted by logical name.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Assets belonging to `chunk`, in name order.
    pub fn for_chunk<'a>(&'a self, chunk: &'a str) -> impl Iterator<Item = &'a Asset> + 'a {
        self.iter().filter(move |asset| asset.chunk() == Some(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Content;

    fn templates() -> OutputTemplates {
        OutputTemplates {
            script: NameTemplate::parse("[name].[fingerprint].js").unwrap(),
            style: NameTemplate::parse("[name].[fingerprint].css").unwrap(),
            asset: NameTemplate::parse("[path][name].[ext]").unwrap(),
        }
    }

    fn draft(name: &str, ext: &str, content: &str) -> AssetDraft {
        AssetDraft::new(
            name,
            ext,
            Content::from(content),
            AssetOrigin::Chunk(name.into()),
        )
    }

    #[test]
    fn test_seal_is_deterministic() {
        let emitter = Emitter::new(templates(), 8);
        let a = emitter.seal(draft("main", "js", "a()")).unwrap();
        let b = emitter.seal(draft("main", "js", "a()")).unwrap();
        assert_eq!(a.logical_name, b.logical_name);
        assert_eq!(a.fingerprint.len(), 8);
        assert_eq!(a.logical_name, format!("main.{}.js", a.fingerprint));

        let c = emitter.seal(draft("main", "js", "b()")).unwrap();
        assert_ne!(a.logical_name, c.logical_name);
    }

    #[test]
    fn test_seal_uses_explicit_template() {
        let emitter = Emitter::new(templates(), 8);
        let asset = emitter
            .seal(
                draft("logo", "png", "x")
                    .with_path("icons/")
                    .with_template(NameTemplate::parse("images/[path][name].[ext]").unwrap()),
            )
            .unwrap();
        assert_eq!(asset.logical_name, "images/icons/logo.png");
    }

    #[test]
    fn test_fingerprint_matches_explicit_template_length() {
        let emitter = Emitter::new(templates(), 20);
        let asset = emitter
            .seal(
                draft("main", "css", "a{}")
                    .with_template(NameTemplate::parse("[name].[contenthash:8].css").unwrap()),
            )
            .unwrap();
        assert_eq!(asset.fingerprint.len(), 8);
        assert_eq!(asset.logical_name, format!("main.{}.css", asset.fingerprint));

        let default = emitter.seal(draft("main", "css", "a{}")).unwrap();
        assert_eq!(default.fingerprint.len(), 20);
        assert!(default.fingerprint.starts_with(&asset.fingerprint));
    }

    #[test]
    fn test_seal_rejects_escaping_names() {
        let emitter = Emitter::new(templates(), 8);
        let err = emitter
            .seal(draft("x", "txt", "").with_path("../"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidName { .. }));
    }

    #[test]
    fn test_reseal_renames() {
        let emitter = Emitter::new(templates(), 8);
        let asset = emitter.seal(draft("main", "css", "a { }")).unwrap();
        let old = asset.logical_name.clone();
        let resealed = emitter.reseal(asset, b"a{}".to_vec()).unwrap();
        assert_ne!(resealed.logical_name, old);
        assert_eq!(resealed.bytes, b"a{}");
    }

    #[test]
    fn test_set_dedupes_identical_and_rejects_conflicts() {
        let emitter = Emitter::new(
            OutputTemplates {
                script: NameTemplate::parse("bundle.js").unwrap(),
                ..templates()
            },
            8,
        );
        let mut set = AssetSet::new();
        set.insert(emitter.seal(draft("main", "js", "a()")).unwrap())
            .unwrap();
        set.insert(emitter.seal(draft("common", "js", "a()")).unwrap())
            .unwrap();
        assert_eq!(set.len(), 1);

        let err = set
            .insert(emitter.seal(draft("other", "js", "b()")).unwrap())
            .unwrap_err();
        match err {
            PipelineError::EmitConflict {
                logical_name,
                first,
                second,
            } => {
                assert_eq!(logical_name, "bundle.js");
                assert!(first.contains("main"));
                assert!(second.contains("other"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_emit_marks_chunk() {
        let emitter = Emitter::new(templates(), 8);
        let mut chunk = Chunk::new("main", Vec::new());
        chunk.record_transformed(Vec::new()).unwrap();
        chunk.finalize().unwrap();
        chunk.drafts.push(draft("main", "js", "a()"));

        let mut set = AssetSet::new();
        let names = emitter.emit(&mut chunk, &mut set).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(chunk.assets, names);
        assert_eq!(chunk.state(), crate::pipeline::ChunkState::Emitted);
        assert_eq!(set.for_chunk("main").count(), 1);
    }
}
