//! Per-module rule dispatch.
//!
//! Each module runs through the chain of the first matching rule. Modules
//! no rule matches are copied through (or rejected, per policy). A failing
//! best-effort rule also copies the module through, but never hides a
//! content type mismatch.

use rayon::prelude::*;

use super::{Chunk, Diagnostic, PipelineError, PipelineSettings, UnmatchedPolicy};
use crate::core::Module;
use crate::logger::ProgressLine;
use crate::rule::RuleTable;
use crate::transform::{Chain, TransformContext, TransformResult};

/// Chain results of one chunk, in module order.
#[derive(Debug)]
pub(super) struct ChunkOutcome {
    pub results: Vec<TransformResult>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Transform every module of `chunk`. Errors from all modules are collected.
pub(super) fn transform_chunk(
    chunk: &Chunk,
    rules: &RuleTable,
    settings: &PipelineSettings,
    progress: Option<&ProgressLine>,
) -> Result<ChunkOutcome, Vec<PipelineError>> {
    let outcomes: Vec<_> = chunk
        .modules
        .par_iter()
        .map(|module| {
            let outcome = transform_module(module, &chunk.name, rules, settings);
            if let Some(progress) = progress {
                progress.inc("modules");
            }
            outcome
        })
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut diagnostics = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok((result, mut diags)) => {
                results.push(result);
                diagnostics.append(&mut diags);
            }
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(ChunkOutcome {
            results,
            diagnostics,
        })
    } else {
        Err(errors)
    }
}

fn transform_module(
    module: &Module,
    chunk: &str,
    rules: &RuleTable,
    settings: &PipelineSettings,
) -> Result<(TransformResult, Vec<Diagnostic>), PipelineError> {
    let ctx = TransformContext {
        module,
        chunk,
        root: &settings.root,
    };

    let mut diagnostics = Vec::new();
    let matching = rules.find_all(&module.id);
    if matching.len() > 1 {
        diagnostics.push(Diagnostic::RuleMatchAmbiguity {
            module: module.id.clone(),
            rules: matching,
        });
    }

    let Some((index, rule)) = rules.find(&module.id) else {
        return match settings.unmatched {
            UnmatchedPolicy::Copy => {
                crate::debug!("transform"; "`{}` unmatched, copied", module.id);
                Ok((Chain::empty().run(ctx)?, diagnostics))
            }
            UnmatchedPolicy::Error => Err(PipelineError::UnmatchedModule {
                module: module.id.clone(),
            }),
        };
    };

    match rule.chain.run(ctx) {
        Ok(mut result) => {
            result.rule = Some(index);
            Ok((result, diagnostics))
        }
        Err(err @ PipelineError::Transform { .. }) if rule.best_effort => {
            let cause = err.to_string();
            let mut result = Chain::empty().run(ctx)?;
            result.rule = Some(index);
            result.warning = Some(cause.clone());
            diagnostics.push(Diagnostic::BestEffortSkip {
                module: module.id.clone(),
                rule: index,
                cause,
            });
            Ok((result, diagnostics))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Content;
    use crate::rule::{Matcher, Rule};
    use crate::transform::{ChainStage, Options, Transform, TransformInput, TransformOutput};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Upper;

    impl Transform for Upper {
        fn id(&self) -> &str {
            "upper"
        }

        fn apply(&self, input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
            let text = input.content.to_text_lossy().to_uppercase();
            Ok(TransformOutput::new(text, input.meta))
        }
    }

    struct Broken;

    impl Transform for Broken {
        fn id(&self) -> &str {
            "broken"
        }

        fn apply(&self, _input: TransformInput<'_>) -> anyhow::Result<TransformOutput> {
            anyhow::bail!("cannot parse")
        }
    }

    fn chain(transform: impl Transform + 'static) -> Chain {
        Chain::new(vec![ChainStage::new(Arc::new(transform), Options::new())]).unwrap()
    }

    fn settings(unmatched: UnmatchedPolicy) -> PipelineSettings {
        PipelineSettings {
            root: PathBuf::from("/site"),
            output: PathBuf::from("/site/dist"),
            clean: false,
            unmatched,
        }
    }

    fn chunk(modules: &[(&str, &[u8])]) -> Chunk {
        let modules = modules
            .iter()
            .map(|(id, raw)| {
                Module::new(PathBuf::from("/site").join(id), (*id).into(), raw.to_vec())
            })
            .collect();
        Chunk::new("main", modules)
    }

    #[test]
    fn test_first_match_wins_and_ambiguity_is_reported() {
        let rules = RuleTable::new(vec![
            Rule::new(Matcher::regex(r"\.js$").unwrap(), chain(Upper)),
            Rule::new(Matcher::prefix("src"), chain(Broken)),
        ]);
        let chunk = chunk(&[("src/a.js", b"a()")]);
        let outcome =
            transform_chunk(&chunk, &rules, &settings(UnmatchedPolicy::Copy), None).unwrap();

        assert_eq!(outcome.results[0].content, Content::from("A()"));
        assert_eq!(outcome.results[0].rule, Some(0));
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::RuleMatchAmbiguity {
                module: "src/a.js".into(),
                rules: vec![0, 1],
            }]
        );
    }

    #[test]
    fn test_unmatched_policy() {
        let rules = RuleTable::new(vec![Rule::new(
            Matcher::regex(r"\.js$").unwrap(),
            chain(Upper),
        )]);
        let chunk = chunk(&[("notes.txt", b"hello")]);

        let outcome =
            transform_chunk(&chunk, &rules, &settings(UnmatchedPolicy::Copy), None).unwrap();
        assert_eq!(outcome.results[0].content.as_bytes(), b"hello");
        assert_eq!(outcome.results[0].rule, None);

        let errors =
            transform_chunk(&chunk, &rules, &settings(UnmatchedPolicy::Error), None).unwrap_err();
        assert!(matches!(
            &errors[0],
            PipelineError::UnmatchedModule { module } if module == "notes.txt"
        ));
    }

    #[test]
    fn test_best_effort_copies_and_warns() {
        let rules = RuleTable::new(vec![
            Rule::new(Matcher::regex(r"\.js$").unwrap(), chain(Broken)).best_effort(true),
        ]);
        let chunk = chunk(&[("a.js", b"a(")]);
        let outcome =
            transform_chunk(&chunk, &rules, &settings(UnmatchedPolicy::Copy), None).unwrap();

        assert_eq!(outcome.results[0].content.as_bytes(), b"a(");
        assert!(outcome.results[0].warning.is_some());
        assert!(matches!(
            &outcome.diagnostics[0],
            Diagnostic::BestEffortSkip { rule: 0, .. }
        ));
    }

    #[test]
    fn test_best_effort_does_not_hide_type_mismatch() {
        let rules = RuleTable::new(vec![
            Rule::new(Matcher::regex(r"\.png$").unwrap(), chain(Upper)).best_effort(true),
        ]);
        let chunk = chunk(&[("logo.png", &[0x89, 0xff, 0x00])]);
        let errors =
            transform_chunk(&chunk, &rules, &settings(UnmatchedPolicy::Copy), None).unwrap_err();
        assert!(matches!(errors[0], PipelineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_errors_from_every_module_are_collected() {
        let rules = RuleTable::new(vec![Rule::new(
            Matcher::regex(r"\.js$").unwrap(),
            chain(Broken),
        )]);
        let chunk = chunk(&[("a.js", b"a"), ("b.js", b"b"), ("c.txt", b"c")]);
        let errors =
            transform_chunk(&chunk, &rules, &settings(UnmatchedPolicy::Copy), None).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
