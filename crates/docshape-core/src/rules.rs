//! Declarative rule sets
//!
//! A [`RuleSet`] is an ordered list of batch steps loaded from JSON, YAML or
//! TOML. Functions are referenced by name and resolved against a
//! [`FunctionRegistry`] when the rule set is compiled, so a rule file can be
//! validated completely before it touches a document.
//!
//! ```
//! use docshape_core::{FunctionRegistry, RuleSet, TransformOptions};
//! use serde_json::json;
//!
//! let rules: RuleSet = serde_json::from_value(json!({
//!     "steps": [
//!         {"op": "move", "rules": [{"source": ["old"], "target": ["new"]}]},
//!         {"op": "derive", "rules": [
//!             {"sources": [["new"]], "function": "uppercase", "targets": [["loud"]]}
//!         ]}
//!     ]
//! })).unwrap();
//!
//! let mut doc = json!({"old": "quiet"});
//! let registry = FunctionRegistry::with_built_ins();
//! rules.apply(&mut doc, &registry, &TransformOptions::default()).unwrap();
//! assert_eq!(doc, json!({"new": "quiet", "loud": "QUIET"}));
//! ```

use crate::error::{value_kind, Error, Result};
use crate::ops::WritePolicy;
use crate::path::Path;
use crate::transformer::{
    batch, derive, pipeline_factory, subpipeline, BatchReport, DeriveRule, EmptyPolicy,
    FunctionRegistry, NestedPipeline, Selection, Subpipeline, ValueFn,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// An ordered list of transformation steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    /// Label used in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional-source flag for every step that does not set its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key_optional: Option<bool>,
    /// Empty policy for every derive step that does not set its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyPolicy>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One batch step of a rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    Add {
        rules: Vec<AddRule>,
    },
    Update {
        rules: Vec<FunctionRule>,
        #[serde(default)]
        optional: Option<bool>,
    },
    Lift {
        rules: Vec<FunctionRule>,
        #[serde(default)]
        optional: Option<bool>,
    },
    Copy {
        rules: Vec<PathPair>,
        #[serde(default)]
        optional: Option<bool>,
    },
    /// Copy the same fields from one parent mapping to another
    CopyAll {
        source: Path,
        target: Path,
        fields: Vec<String>,
        #[serde(default)]
        optional: Option<bool>,
    },
    Move {
        rules: Vec<PathPair>,
        #[serde(default)]
        optional: Option<bool>,
    },
    Delete {
        paths: Vec<Path>,
        #[serde(default)]
        optional: Option<bool>,
    },
    Derive {
        rules: Vec<DeriveSpec>,
        #[serde(default)]
        optional: Option<bool>,
        #[serde(default)]
        empty: Option<EmptyPolicy>,
    },
    Subpipeline {
        pipelines: Vec<SubpipelineSpec>,
        #[serde(default)]
        optional: Option<bool>,
        /// How pipeline data is merged; overwrites by default
        #[serde(default)]
        merge: Option<WritePolicy>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddRule {
    pub path: Path,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionRule {
    pub path: Path,
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathPair {
    pub source: Path,
    pub target: Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeriveSpec {
    pub sources: Vec<Path>,
    pub function: String,
    /// No targets makes an effect-only rule
    #[serde(default)]
    pub targets: Vec<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubpipelineSpec {
    pub name: String,
    pub selections: Vec<SelectionSpec>,
    #[serde(default)]
    pub target: Option<Path>,
    /// Rules run over the assembled sub-document
    pub rules: RuleSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionSpec {
    pub get: Path,
    #[serde(default)]
    pub add: Option<Path>,
}

impl Step {
    /// The step's `op` tag
    pub fn op(&self) -> &'static str {
        match self {
            Step::Add { .. } => "add",
            Step::Update { .. } => "update",
            Step::Lift { .. } => "lift",
            Step::Copy { .. } => "copy",
            Step::CopyAll { .. } => "copy_all",
            Step::Move { .. } => "move",
            Step::Delete { .. } => "delete",
            Step::Derive { .. } => "derive",
            Step::Subpipeline { .. } => "subpipeline",
        }
    }

    /// Whether sources are optional when nothing overrides it
    fn default_optional(&self) -> bool {
        matches!(self, Step::Lift { .. } | Step::Derive { .. } | Step::Subpipeline { .. })
    }
}

/// Caller-level defaults, below anything a rule set declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    pub source_key_optional: Option<bool>,
    pub empty: Option<EmptyPolicy>,
}

/// What one step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub op: &'static str,
    #[serde(flatten)]
    pub report: BatchReport,
}

/// What a rule set run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
    /// Skipped subpipeline descriptors, rendered for display
    pub failures: Vec<String>,
}

impl RunReport {
    /// Counts summed over all steps
    pub fn totals(&self) -> BatchReport {
        let mut totals = BatchReport::default();
        for step in &self.steps {
            totals.merge(step.report);
        }
        totals
    }
}

enum Compiled {
    Add(Vec<(Path, Value)>),
    Update(Vec<(Path, ValueFn)>, bool),
    Lift(Vec<(Path, ValueFn)>, bool),
    Copy(Vec<(Path, Path)>, bool),
    Move(Vec<(Path, Path)>, bool),
    Delete(Vec<Path>, bool),
    Derive(Vec<DeriveRule>, bool, EmptyPolicy),
    Subpipeline(Vec<CompiledSubpipeline>, bool, WritePolicy),
}

struct CompiledSubpipeline {
    name: String,
    selections: Vec<Selection>,
    target: Option<Path>,
    rules: Arc<CompiledRuleSet>,
}

/// A rule set with every function name resolved
pub struct CompiledRuleSet {
    name: Option<String>,
    steps: Vec<(&'static str, Compiled)>,
}

impl RuleSet {
    /// Parse a rule set from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve every function name and every optional/empty setting.
    ///
    /// Settings are taken from the step, then the rule set, then `options`,
    /// then the operator's own default.
    pub fn compile(&self, registry: &FunctionRegistry, options: &TransformOptions) -> Result<CompiledRuleSet> {
        let optional_for = |step: &Step, declared: Option<bool>| {
            declared
                .or(self.source_key_optional)
                .or(options.source_key_optional)
                .unwrap_or_else(|| step.default_optional())
        };
        let value_fns = |rules: &[FunctionRule]| {
            rules
                .iter()
                .map(|rule| Ok((rule.path.clone(), registry.value_fn(&rule.function)?)))
                .collect::<Result<Vec<_>>>()
        };

        let mut steps = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let compiled = match step {
                Step::Add { rules } => Compiled::Add(
                    rules
                        .iter()
                        .map(|rule| (rule.path.clone(), rule.value.clone()))
                        .collect(),
                ),
                Step::Update { rules, optional } => {
                    Compiled::Update(value_fns(rules)?, optional_for(step, *optional))
                }
                Step::Lift { rules, optional } => {
                    Compiled::Lift(value_fns(rules)?, optional_for(step, *optional))
                }
                Step::Copy { rules, optional } => Compiled::Copy(pairs(rules), optional_for(step, *optional)),
                Step::CopyAll {
                    source,
                    target,
                    fields,
                    optional,
                } => Compiled::Copy(batch::copy_all(source, target, fields), optional_for(step, *optional)),
                Step::Move { rules, optional } => Compiled::Move(pairs(rules), optional_for(step, *optional)),
                Step::Delete { paths, optional } => Compiled::Delete(paths.clone(), optional_for(step, *optional)),
                Step::Derive { rules, optional, empty } => {
                    let rules = rules
                        .iter()
                        .map(|spec| {
                            let mut rule = DeriveRule::new(
                                spec.sources.clone(),
                                registry.get(&spec.function)?,
                                spec.targets.clone(),
                            );
                            rule.optional = spec.optional;
                            Ok(rule)
                        })
                        .collect::<Result<Vec<_>>>()?;
                    let empty = empty.or(self.empty).or(options.empty).unwrap_or_default();
                    Compiled::Derive(rules, optional_for(step, *optional), empty)
                }
                Step::Subpipeline {
                    pipelines,
                    optional,
                    merge,
                } => {
                    let pipelines = pipelines
                        .iter()
                        .map(|spec| {
                            Ok(CompiledSubpipeline {
                                name: spec.name.clone(),
                                selections: spec
                                    .selections
                                    .iter()
                                    .map(|s| Selection {
                                        get: s.get.clone(),
                                        add: s.add.clone(),
                                    })
                                    .collect(),
                                target: spec.target.clone(),
                                rules: Arc::new(spec.rules.compile(registry, options)?),
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Compiled::Subpipeline(
                        pipelines,
                        optional_for(step, *optional),
                        merge.unwrap_or(WritePolicy::Overwrite),
                    )
                }
            };
            steps.push((step.op(), compiled));
        }

        Ok(CompiledRuleSet {
            name: self.name.clone(),
            steps,
        })
    }

    /// Compile and run against `doc`
    pub fn apply(&self, doc: &mut Value, registry: &FunctionRegistry, options: &TransformOptions) -> Result<RunReport> {
        self.compile(registry, options)?.apply(doc)
    }
}

fn pairs(rules: &[PathPair]) -> Vec<(Path, Path)> {
    rules
        .iter()
        .map(|rule| (rule.source.clone(), rule.target.clone()))
        .collect()
}

impl CompiledRuleSet {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order.
    ///
    /// The document root must be a mapping unless there are no steps, in
    /// which case any value passes through. A failing step aborts the run;
    /// steps before it have already been applied.
    pub fn apply(&self, doc: &mut Value) -> Result<RunReport> {
        if !self.steps.is_empty() && !doc.is_object() {
            return Err(Error::TypeMismatch {
                path: "$".to_string(),
                expected: "object",
                found: value_kind(doc),
            });
        }

        let mut run = RunReport::default();
        for (index, (op, step)) in self.steps.iter().enumerate() {
            log::debug!(
                "{} step {} ({})",
                self.name.as_deref().unwrap_or("rules"),
                index,
                op
            );
            let report = match step {
                Compiled::Add(rules) => batch::add(doc, rules)?,
                Compiled::Update(rules, optional) => batch::update(doc, rules, *optional)?,
                Compiled::Lift(rules, optional) => batch::lift(doc, rules, *optional)?,
                Compiled::Copy(rules, optional) => batch::copy(doc, rules, *optional)?,
                Compiled::Move(rules, optional) => batch::move_values(doc, rules, *optional)?,
                Compiled::Delete(paths, optional) => batch::delete(doc, paths, *optional)?,
                Compiled::Derive(rules, optional, empty) => derive(doc, rules, *optional, *empty)?,
                Compiled::Subpipeline(pipelines, optional, merge) => {
                    let descriptors: Vec<Subpipeline> = pipelines.iter().map(CompiledSubpipeline::descriptor).collect();
                    let outcome = subpipeline(doc, &descriptors, *merge, *optional)?;
                    run.failures
                        .extend(outcome.failures.iter().map(ToString::to_string));
                    BatchReport {
                        applied: outcome.pipelines.len(),
                        skipped: outcome.failures.len(),
                        culled: 0,
                    }
                }
            };
            run.steps.push(StepReport { op, report });
        }
        Ok(run)
    }
}

impl CompiledSubpipeline {
    fn descriptor(&self) -> Subpipeline {
        let rules = Arc::clone(&self.rules);
        let factory = pipeline_factory(move |input| {
            Ok(Box::new(RulePipeline::new(Arc::clone(&rules), input)) as Box<dyn NestedPipeline>)
        });
        Subpipeline {
            name: self.name.clone(),
            selections: self.selections.clone(),
            factory,
            target: self.target.clone(),
        }
    }
}

/// A nested pipeline that runs a compiled rule set over its input
pub struct RulePipeline {
    rules: Arc<CompiledRuleSet>,
    input: Option<Value>,
    output: Option<Value>,
    report: Option<RunReport>,
}

impl RulePipeline {
    pub fn new(rules: Arc<CompiledRuleSet>, input: Value) -> Self {
        Self {
            rules,
            input: Some(input),
            output: None,
            report: None,
        }
    }

    /// The nested run's report, once data has been produced
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }
}

impl NestedPipeline for RulePipeline {
    fn data(&mut self) -> Result<Value> {
        if let Some(mut doc) = self.input.take() {
            let report = self.rules.apply(&mut doc)?;
            self.report = Some(report);
            self.output = Some(doc);
        }
        Ok(self.output.clone().unwrap_or(Value::Null))
    }
}
