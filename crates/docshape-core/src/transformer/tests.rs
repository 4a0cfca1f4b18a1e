//! Tests for the batch transformation system
//!
//! This module exercises the batch operators, the derive engine and the
//! subpipeline composer against small hand-written documents.
//!
//! Copyright (c) 2025 Docshape Team
//! Licensed under the Apache-2.0 license

#[cfg(test)]
mod tests {
    use super::super::{
        batch, boxed, built_in, derive, derive_fn, pipeline_factory, subpipeline, value_fn,
        DeriveRule, DeriveRuleBuilder, EmptyPolicy, NestedPipeline, Subpipeline,
    };
    use crate::error::{Error, Result};
    use crate::ops::WritePolicy;
    use crate::path;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn double() -> DeriveRule {
        DeriveRule::new(
            vec![path!("a", "b")],
            boxed(|values| Ok(json!(values[0].as_i64().unwrap_or(0) * 2))),
            vec![path!("a", "c")],
        )
    }

    #[test]
    fn test_batch_add_in_order() {
        let mut doc = json!({});
        let adds = vec![(path!("a", "b"), json!(1)), (path!("a", "c"), json!([]))];
        let report = batch::add(&mut doc, &adds).unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(doc, json!({"a": {"b": 1, "c": []}}));
        assert!(matches!(
            batch::add(&mut doc, &adds).unwrap_err(),
            Error::TargetExists { .. }
        ));
    }

    #[test]
    fn test_batch_get_failure_markers() {
        let doc = json!({"a": 1, "b": {"c": null}});
        let values = batch::get(&doc, &[path!("a"), path!("missing"), path!("b", "c")], true).unwrap();
        assert_eq!(values, vec![Some(json!(1)), None, Some(Value::Null)]);

        let err = batch::get(&doc, &[path!("missing")], false).unwrap_err();
        assert!(err.is_missing_path());
    }

    #[test]
    fn test_batch_optional_get_through_sequence() {
        let doc = json!({"samples": [{"species": "mouse"}], "title": "Atlas"});
        let values = batch::get(&doc, &[path!("samples", "species"), path!("title")], true).unwrap();
        assert_eq!(values, vec![None, Some(json!("Atlas"))]);

        let err = batch::get(&doc, &[path!("samples", "species")], false).unwrap_err();
        assert!(err.is_missing_path());
    }

    #[test]
    fn test_optional_derive_source_through_sequence_skips_rule() {
        let mut doc = json!({"samples": [{"species": "mouse"}], "title": "atlas"});
        let rules = vec![
            DeriveRule::new(
                vec![path!("samples", "species")],
                boxed(|values| Ok(values[0].clone())),
                vec![path!("species")],
            ),
            DeriveRule::new(
                vec![path!("title")],
                boxed(|values| Ok(json!(values[0].as_str().unwrap_or_default().to_uppercase()))),
                vec![path!("loud")],
            ),
        ];

        let report = derive(&mut doc, &rules, true, EmptyPolicy::Cull).unwrap();
        assert_eq!((report.applied, report.skipped), (1, 1));
        assert_eq!(doc["loud"], json!("ATLAS"));
        assert!(doc.get("species").is_none());
    }

    #[test]
    fn test_batch_write_through_scalar_is_type_mismatch() {
        let mut doc = json!({"title": "flat"});
        let err = batch::add(&mut doc, &[(path!("title", "en"), json!("x"))]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_batch_pop_and_delete_are_eager() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        let popped = batch::pop(&mut doc, &[path!("a"), path!("z")], true).unwrap();
        assert_eq!(popped, vec![Some(json!(1)), None]);

        let report = batch::delete(&mut doc, &[path!("b"), path!("z")], true).unwrap();
        assert_eq!((report.applied, report.skipped), (1, 1));
        assert_eq!(doc, json!({"c": 3}));

        assert!(batch::delete(&mut doc, &[path!("z")], false).is_err());
    }

    #[test]
    fn test_later_rules_observe_earlier_mutations() {
        let mut doc = json!({"a": 1});
        let moves = vec![(path!("a"), path!("b")), (path!("b"), path!("c"))];
        batch::move_values(&mut doc, &moves, false).unwrap();
        assert_eq!(doc, json!({"c": 1}));
    }

    #[test]
    fn test_batch_copy_and_copy_all() {
        let mut doc = json!({"src": {"name": "x", "age": 3}});
        let copies = batch::copy_all(&path!("src"), &path!("dst"), ["name", "age", "sex"]);
        assert_eq!(copies.len(), 3);

        let report = batch::copy(&mut doc, &copies, true).unwrap();
        assert_eq!((report.applied, report.skipped), (2, 1));
        assert_eq!(doc["dst"], json!({"name": "x", "age": 3}));
    }

    #[test]
    fn test_batch_update_and_lift() {
        let mut doc = json!({"species": "Mus Musculus", "count": "12"});
        let updates = vec![(
            path!("species"),
            value_fn(|v| Ok(json!(v.as_str().unwrap_or_default().to_lowercase()))),
        )];
        batch::update(&mut doc, &updates, false).unwrap();
        assert_eq!(doc["species"], json!("mus musculus"));

        let lifts = vec![
            (path!("count"), value_fn(|v| Ok(json!({"value": v})))),
            (path!("absent"), value_fn(Ok)),
        ];
        let report = batch::lift(&mut doc, &lifts, true).unwrap();
        assert_eq!((report.applied, report.skipped), (1, 1));
        assert_eq!(doc["count"], json!({"value": "12"}));
    }

    #[test]
    fn test_update_propagates_transform_errors() {
        let mut doc = json!({"a": 1});
        let updates = vec![(path!("a"), value_fn(|_| Err(Error::transform("bad value"))))];
        let err = batch::update(&mut doc, &updates, true).unwrap_err();
        assert!(matches!(err, Error::Transform { .. }));
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_derive_single_output() {
        let mut doc = json!({"a": {"b": 1}});
        let report = derive(&mut doc, &[double()], false, EmptyPolicy::Cull).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(doc, json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn test_derive_missing_optional_source() {
        let mut doc = json!({});
        let rule = DeriveRule::new(vec![path!("missing")], built_in::identity(), vec![path!("out")]);
        let report = derive(&mut doc, &[rule.clone()], true, EmptyPolicy::Cull).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(doc, json!({}));

        let err = derive(&mut doc, &[rule], false, EmptyPolicy::Cull).unwrap_err();
        assert!(err.is_missing_path());
    }

    #[test]
    fn test_derive_per_rule_optional_overrides_batch() {
        let mut doc = json!({});
        let rule = DeriveRule::new(vec![path!("missing")], built_in::identity(), vec![path!("out")])
            .optional(false);
        assert!(derive(&mut doc, &[rule], true, EmptyPolicy::Cull).is_err());
    }

    #[test]
    fn test_derive_arity_mismatch_is_fatal_even_when_optional() {
        let mut doc = json!({"a": 1});
        let rule = DeriveRule::new(
            vec![path!("a")],
            derive_fn(|_| Ok(vec![json!(1), json!(2)])),
            vec![path!("x"), path!("y"), path!("z")],
        );

        for optional in [true, false] {
            match derive(&mut doc, &[rule.clone()], optional, EmptyPolicy::Cull).unwrap_err() {
                Error::ArityMismatch { expected, found } => {
                    assert_eq!((expected, found), (3, 2));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_derive_empty_policies() {
        let rule = DeriveRule::new(
            vec![path!("a")],
            derive_fn(|_| Ok(vec![json!(""), json!("kept")])),
            vec![path!("empty"), path!("full")],
        );

        let mut culled = json!({"a": 1});
        let report = derive(&mut culled, &[rule.clone()], false, EmptyPolicy::Cull).unwrap();
        assert_eq!(report.culled, 1);
        assert_eq!(culled, json!({"a": 1, "full": "kept"}));

        let mut written = json!({"a": 1});
        derive(&mut written, &[rule.clone()], false, EmptyPolicy::Ok).unwrap();
        assert_eq!(written, json!({"a": 1, "empty": "", "full": "kept"}));

        let mut failed = json!({"a": 1});
        let err = derive(&mut failed, &[rule], false, EmptyPolicy::Error).unwrap_err();
        assert!(matches!(err, Error::EmptyValue { ref path } if *path == path!("empty")));
        assert_eq!(failed, json!({"a": 1}));
    }

    #[test]
    fn test_derive_target_must_be_fresh() {
        let mut doc = json!({"a": {"b": 1, "c": 0}});
        let err = derive(&mut doc, &[double()], true, EmptyPolicy::Cull).unwrap_err();
        assert!(matches!(err, Error::TargetExists { .. }));
        assert_eq!(doc, json!({"a": {"b": 1, "c": 0}}));
    }

    #[test]
    fn test_derive_unwritable_later_target_writes_nothing() {
        let mut doc = json!({"a": 1, "s": "scalar"});
        let rule = DeriveRule::new(
            vec![path!("a")],
            derive_fn(|values| Ok(vec![values[0].clone(), values[0].clone()])),
            vec![path!("x"), path!("s", "y")],
        );

        let err = derive(&mut doc, &[rule], true, EmptyPolicy::Cull).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(doc, json!({"a": 1, "s": "scalar"}));
    }

    #[test]
    fn test_derive_overlapping_targets_write_nothing() {
        let two_outputs = derive_fn(|values| Ok(vec![values[0].clone(), json!({"inner": true})]));

        for targets in [
            vec![path!("d"), path!("d")],
            vec![path!("d"), path!("d", "e")],
            vec![path!("d", "e"), path!("d")],
        ] {
            let mut doc = json!({"a": 1});
            let rule = DeriveRule::new(vec![path!("a")], two_outputs.clone(), targets.clone());
            let err = derive(&mut doc, &[rule], true, EmptyPolicy::Cull).unwrap_err();
            assert!(matches!(err, Error::TargetExists { ref path, .. } if *path == targets[1]));
            assert_eq!(doc, json!({"a": 1}));
        }
    }

    #[test]
    fn test_derive_multiple_sources_and_targets() {
        let mut doc = json!({"contributor": {"first": "Jane", "last": "Doe"}});
        let rules = vec![
            DeriveRuleBuilder::new()
                .source("contributor.first")
                .source("contributor.last")
                .target("contributor.name")
                .function(built_in::concat())
                .build()
                .unwrap(),
            DeriveRule::new(
                vec![path!("contributor", "name")],
                built_in::split_name(),
                vec![path!("split", "first"), path!("split", "last")],
            ),
        ];

        derive(&mut doc, &rules, false, EmptyPolicy::Cull).unwrap();
        assert_eq!(doc["contributor"]["name"], json!("Jane Doe"));
        assert_eq!(doc["split"], json!({"first": "Jane", "last": "Doe"}));
    }

    #[test]
    fn test_derive_effect_rule_discards_output() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let rule = DeriveRule::effect(
            vec![path!("a")],
            derive_fn(move |values| {
                seen.fetch_add(values.len(), Ordering::SeqCst);
                Ok(vec![json!("ignored"), json!("also ignored")])
            }),
        );

        let mut doc = json!({"a": 1});
        let report = derive(&mut doc, &[rule], false, EmptyPolicy::Error).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(doc, json!({"a": 1}));
    }

    /// Records how often its data was requested
    struct Counting {
        input: Value,
        calls: Arc<AtomicUsize>,
    }

    impl NestedPipeline for Counting {
        fn data(&mut self) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"seen": self.input.clone()}))
        }
    }

    fn counting(calls: &Arc<AtomicUsize>) -> super::super::PipelineFactory {
        let calls = Arc::clone(calls);
        pipeline_factory(move |input| {
            Ok(Box::new(Counting {
                input,
                calls: Arc::clone(&calls),
            }) as Box<dyn NestedPipeline>)
        })
    }

    #[test]
    fn test_subpipeline_merges_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut doc = json!({"meta": {"title": "t", "id": 7}, "out": "old"});
        let descriptors = vec![Subpipeline::new("meta", counting(&calls))
            .select(path!("meta", "title"), path!("name"))
            .select(path!("meta", "id"), path!("ids", "primary"))
            .target(path!("out"))];

        let outcome = subpipeline(&mut doc, &descriptors, WritePolicy::Overwrite, true).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.pipelines.len(), 1);
        assert_eq!(doc["out"], json!({"seen": {"name": "t", "ids": {"primary": 7}}}));
        assert_eq!(doc["meta"], json!({"title": "t", "id": 7}));
    }

    #[test]
    fn test_subpipeline_root_selection_and_discard() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut doc = json!({"samples": [1, 2]});
        let descriptors = vec![Subpipeline::new("samples", counting(&calls)).select_root(path!("samples"))];

        let outcome = subpipeline(&mut doc, &descriptors, WritePolicy::Overwrite, true).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.pipelines[0].0, "samples");
        assert_eq!(doc, json!({"samples": [1, 2]}));
    }

    #[test]
    fn test_subpipeline_failure_records() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut doc = json!({"present": 1});
        let descriptors = vec![
            Subpipeline::new("broken", counting(&calls))
                .select(path!("absent"), path!("x"))
                .target(path!("broken_out")),
            Subpipeline::new("working", counting(&calls))
                .select(path!("present"), path!("x"))
                .target(path!("working_out")),
        ];

        let outcome = subpipeline(&mut doc, &descriptors, WritePolicy::Overwrite, true).unwrap();
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.pipeline, "broken");
        assert_eq!(failure.get_path, path!("absent"));
        assert!(failure.error.is_missing_path());
        assert!(failure.to_string().starts_with("broken: could not select absent"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(doc["working_out"], json!({"seen": {"x": 1}}));
        assert!(doc.get("broken_out").is_none());

        let mut doc = json!({"present": 1});
        assert!(subpipeline(&mut doc, &descriptors, WritePolicy::Overwrite, false).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subpipeline_selections_see_original_document() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut doc = json!({"a": 1});
        let descriptors = vec![
            Subpipeline::new("first", counting(&calls))
                .select(path!("a"), path!("v"))
                .target(path!("a")),
            Subpipeline::new("second", counting(&calls))
                .select(path!("a"), path!("v"))
                .target(path!("b")),
        ];

        subpipeline(&mut doc, &descriptors, WritePolicy::Overwrite, false).unwrap();
        assert_eq!(doc["b"], json!({"seen": {"v": 1}}));
    }

    #[test]
    fn test_subpipeline_fail_on_exists_merge() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut doc = json!({"a": 1, "out": 0});
        let descriptors = vec![Subpipeline::new("p", counting(&calls))
            .select(path!("a"), path!("v"))
            .target(path!("out"))];

        let err = subpipeline(&mut doc, &descriptors, WritePolicy::FailOnExists, false).unwrap_err();
        assert!(matches!(err, Error::TargetExists { .. }));
    }
}
