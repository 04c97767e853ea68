//! # Calculation Rules
//!
//! Tenant-configured calculated fields: each rule evaluates a formula over
//! the record's custom fields and writes the result into `output_field`.
//!
//! ## Evaluation Order
//! ```text
//! context { rooms: 3, distance: 40 }
//!      │
//!      ▼
//! rule "volume":  rooms * 150 * 1.2           → volume = 540
//!      │  (written back into the working context)
//!      ▼
//! rule "moving":  200 + volume * 0.5 + distance * 2 → moving = 550
//!      │
//!      ▼
//! RuleEvaluation { outputs, context, failures }
//! ```
//!
//! Rules run in configured order. A rule may read the output of any rule
//! before it, never one after it.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, FormulaError, ValidationError};
use crate::formula::{EvalMode, Formula, FormulaContext};
use crate::validation::{decimal_from_f64, validate_identifier, ValidationResult};

// =============================================================================
// Rule Definition
// =============================================================================

/// A calculated field definition as stored in tenant configuration.
///
/// Keys are snake_case like the rest of `pricing.toml`. The camelCase
/// names the web settings screen sends are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CalculationRule {
    /// Stable identifier, unique within a rule set.
    pub id: String,

    /// Label shown in the settings screen.
    #[serde(default)]
    pub name: String,

    /// Arithmetic formula over context fields.
    pub formula: String,

    /// Field the result is written to.
    #[serde(alias = "outputField")]
    pub output_field: String,

    /// Fields whose change should trigger a recompute.
    #[serde(default, alias = "triggerFields")]
    pub trigger_fields: Vec<String>,
}

impl CalculationRule {
    /// Creates a rule with no trigger fields.
    pub fn new(
        id: impl Into<String>,
        formula: impl Into<String>,
        output_field: impl Into<String>,
    ) -> Self {
        CalculationRule {
            id: id.into(),
            name: String::new(),
            formula: formula.into(),
            output_field: output_field.into(),
            trigger_fields: Vec::new(),
        }
    }

    /// Sets the trigger fields.
    pub fn triggered_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trigger_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// Evaluation Result
// =============================================================================

/// A rule that failed in best-effort mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailure {
    pub rule_id: String,
    pub output_field: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: FormulaError,
}

/// Output of [`RuleSet::apply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    /// Value written by each rule, keyed by output field.
    pub outputs: BTreeMap<String, f64>,
    /// Input context plus every output.
    pub context: FormulaContext,
    /// Rules that fell back to `0.0` (best-effort mode only).
    pub failures: Vec<RuleFailure>,
}

impl RuleEvaluation {
    /// An output converted to `Decimal`, e.g. to price a line item from a
    /// calculated field. `None` if no rule wrote `field`.
    pub fn decimal_output(&self, field: &str) -> Option<ValidationResult<Decimal>> {
        self.outputs
            .get(field)
            .map(|value| decimal_from_f64(field, *value))
    }
}

fn serialize_display<S: Serializer>(error: &FormulaError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

// =============================================================================
// Rule Set
// =============================================================================

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: CalculationRule,
    formula: Formula,
}

/// An ordered list of parsed, validated calculation rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Parses and validates every rule.
    ///
    /// ## Errors
    /// - `ValidationError::Required` for an empty rule id
    /// - `ValidationError::InvalidFormat` for an output field that is not an
    ///   identifier
    /// - `CoreError::DuplicateRule` if two rules share an id
    /// - `CoreError::Rule` if a formula does not parse
    pub fn compile<I>(rules: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = CalculationRule>,
    {
        let mut seen = HashSet::new();
        let mut compiled = Vec::new();

        for (index, rule) in rules.into_iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: format!("calculation_rules[{index}].id"),
                }
                .into());
            }
            if !seen.insert(rule.id.clone()) {
                return Err(CoreError::DuplicateRule(rule.id));
            }
            validate_identifier(
                &format!("calculation_rules[{index}].output_field"),
                &rule.output_field,
            )?;

            let formula = Formula::parse(&rule.formula).map_err(|source| CoreError::Rule {
                rule_id: rule.id.clone(),
                source,
            })?;
            compiled.push(CompiledRule { rule, formula });
        }

        debug!(rules = compiled.len(), "Calculation rules compiled");
        Ok(RuleSet { rules: compiled })
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &CalculationRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// Looks up a rule by id.
    pub fn get(&self, id: &str) -> Option<&CalculationRule> {
        self.rules().find(|rule| rule.id == id)
    }

    /// Rules to recompute when `field` changes, in evaluation order.
    pub fn triggered_by(&self, field: &str) -> Vec<&CalculationRule> {
        self.rules()
            .filter(|rule| rule.trigger_fields.iter().any(|f| f == field))
            .collect()
    }

    /// Evaluates every rule in order against a working copy of `context`.
    ///
    /// ## Errors
    /// In [`EvalMode::Strict`], `CoreError::Rule` for the first failing
    /// rule. [`EvalMode::BestEffort`] never fails; see
    /// [`RuleEvaluation::failures`].
    ///
    /// ## Example
    /// ```rust
    /// use haulwise_core::formula::{EvalMode, FormulaContext};
    /// use haulwise_core::rules::{CalculationRule, RuleSet};
    ///
    /// let rules = RuleSet::compile(vec![
    ///     CalculationRule::new("volume", "rooms * 150 * 1.2", "volume"),
    ///     CalculationRule::new("moving", "200 + volume * 0.5", "movingCost"),
    /// ])
    /// .unwrap();
    ///
    /// let ctx = FormulaContext::new().with("rooms", 3.0);
    /// let eval = rules.apply(&ctx, EvalMode::Strict).unwrap();
    /// assert_eq!(eval.outputs["movingCost"], 470.0);
    /// ```
    pub fn apply(&self, context: &FormulaContext, mode: EvalMode) -> CoreResult<RuleEvaluation> {
        let mut working = context.clone();
        let mut outputs = BTreeMap::new();
        let mut failures = Vec::new();

        for CompiledRule { rule, formula } in &self.rules {
            let value = match formula.evaluate(&working) {
                Ok(value) => value,
                Err(source) => match mode {
                    EvalMode::Strict => {
                        return Err(CoreError::Rule {
                            rule_id: rule.id.clone(),
                            source,
                        })
                    }
                    EvalMode::BestEffort => {
                        warn!(rule_id = %rule.id, error = %source, "Calculation rule failed, using 0");
                        failures.push(RuleFailure {
                            rule_id: rule.id.clone(),
                            output_field: rule.output_field.clone(),
                            error: source,
                        });
                        0.0
                    }
                },
            };

            working.insert(rule.output_field.clone(), value);
            outputs.insert(rule.output_field.clone(), value);
        }

        debug!(
            rules = self.rules.len(),
            failures = failures.len(),
            "Calculation rules applied"
        );

        Ok(RuleEvaluation {
            outputs,
            context: working,
            failures,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn moving_rules() -> Vec<CalculationRule> {
        vec![
            CalculationRule::new("volume", "rooms * avgRoomSize * 1.2", "volume")
                .triggered_by(["rooms", "avgRoomSize"]),
            CalculationRule::new("moving", "200 + volume * 0.5 + distance * 2", "movingCost")
                .triggered_by(["distance"]),
        ]
    }

    #[test]
    fn test_outputs_chain_in_order() {
        let rules = RuleSet::compile(moving_rules()).unwrap();
        let ctx = FormulaContext::new()
            .with("rooms", 3.0)
            .with("avgRoomSize", 150.0)
            .with("distance", 40.0);

        let eval = rules.apply(&ctx, EvalMode::Strict).unwrap();
        assert!((eval.outputs["volume"] - 540.0).abs() < 1e-9);
        assert!((eval.outputs["movingCost"] - 550.0).abs() < 1e-9);
        assert_eq!(eval.context.get("rooms"), Some(3.0));
        assert!(eval.failures.is_empty());
    }

    #[test]
    fn test_later_outputs_are_not_visible_earlier() {
        let rules = RuleSet::compile(vec![
            CalculationRule::new("a", "b + 1", "a"),
            CalculationRule::new("b", "2", "b"),
        ])
        .unwrap();

        let err = rules.apply(&FormulaContext::new(), EvalMode::Strict).unwrap_err();
        match err {
            CoreError::Rule { rule_id, source } => {
                assert_eq!(rule_id, "a");
                assert_eq!(
                    source,
                    FormulaError::UnboundVariable {
                        name: "b".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_best_effort_records_failures() {
        let rules = RuleSet::compile(moving_rules()).unwrap();
        // avgRoomSize and distance missing
        let ctx = FormulaContext::new().with("rooms", 3.0);

        let eval = rules.apply(&ctx, EvalMode::BestEffort).unwrap();
        assert_eq!(eval.outputs["volume"], 0.0);
        assert_eq!(eval.outputs["movingCost"], 0.0);
        assert_eq!(eval.failures.len(), 2);
        assert_eq!(eval.failures[0].rule_id, "volume");
        assert_eq!(eval.failures[1].output_field, "movingCost");
    }

    #[test]
    fn test_compile_errors() {
        let dup = RuleSet::compile(vec![
            CalculationRule::new("x", "1", "a"),
            CalculationRule::new("x", "2", "b"),
        ]);
        assert!(matches!(dup, Err(CoreError::DuplicateRule(id)) if id == "x"));

        let bad_output = RuleSet::compile(vec![CalculationRule::new("x", "1", "moving cost")]);
        assert!(matches!(
            bad_output,
            Err(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));

        let bad_formula = RuleSet::compile(vec![CalculationRule::new("x", "max(1, 2)", "a")]);
        assert!(matches!(
            bad_formula,
            Err(CoreError::Rule { rule_id, source: FormulaError::UnsupportedFunction { .. } })
                if rule_id == "x"
        ));

        let no_id = RuleSet::compile(vec![CalculationRule::new(" ", "1", "a")]);
        assert!(matches!(
            no_id,
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn test_decimal_output() {
        let rules = RuleSet::compile(vec![CalculationRule::new("labor", "hours * 50", "laborCost")])
            .unwrap();
        let eval = rules
            .apply(&FormulaContext::new().with("hours", 2.5), EvalMode::Strict)
            .unwrap();
        assert_eq!(
            eval.decimal_output("laborCost"),
            Some(Ok(rust_decimal_macros::dec!(125)))
        );
        assert_eq!(eval.decimal_output("missing"), None);

        let big = RuleSet::compile(vec![CalculationRule::new("big", "x * x", "big")]).unwrap();
        let eval = big
            .apply(&FormulaContext::new().with("x", 1e20), EvalMode::Strict)
            .unwrap();
        assert!(matches!(
            eval.decimal_output("big"),
            Some(Err(ValidationError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_triggered_by() {
        let rules = RuleSet::compile(moving_rules()).unwrap();
        let ids: Vec<&str> = rules
            .triggered_by("rooms")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["volume"]);
        assert!(rules.triggered_by("months").is_empty());
    }

    #[rstest]
    #[case(r#"{"id":"v","formula":"rooms * 180","output_field":"volume","trigger_fields":["rooms"]}"#)]
    #[case(r#"{"id":"v","formula":"rooms * 180","outputField":"volume","triggerFields":["rooms"]}"#)]
    fn test_rule_accepts_both_key_styles(#[case] json: &str) {
        let rule: CalculationRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.output_field, "volume");
        assert_eq!(rule.trigger_fields, vec!["rooms".to_string()]);
    }

    #[test]
    fn test_rule_serializes_snake_case() {
        let rule = CalculationRule::new("v", "rooms * 180", "volume").triggered_by(["rooms"]);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["output_field"], "volume");
        assert_eq!(json["trigger_fields"][0], "rooms");
        assert!(json.get("outputField").is_none());
    }

    #[test]
    fn test_failure_serializes_message() {
        let failure = RuleFailure {
            rule_id: "v".to_string(),
            output_field: "volume".to_string(),
            error: FormulaError::DivisionByZero,
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["error"], "division by zero");
        assert_eq!(json["ruleId"], "v");
    }
}
