//! # Formula Module
//!
//! Sandboxed arithmetic for tenant-defined calculated fields.
//!
//! ## What a Formula Can Do
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Formula Sandbox                                 │
//! │                                                                         │
//! │   ✅ ALLOWED                          ❌ REJECTED                       │
//! │   ─────────────────────────────────   ─────────────────────────────     │
//! │   • Numbers: 12, 3.5, .5              • Function calls: max(a, b)       │
//! │   • Context variables: rooms          • Assignment, comparison          │
//! │   • + - * /  and unary minus          • Strings, member access          │
//! │   • Parentheses                       • Anything touching the host      │
//! │                                                                         │
//! │   "rooms * avgRoomSize * 1.2"  +  { rooms: 3, avgRoomSize: 150 }        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   evalexpr tree → whitelist → check bindings → evaluate → 540.0         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Variables are resolved by whole token against the context, never by
//! text substitution, so `rate` cannot leak into `rate2`.
//!
//! ## Usage
//! ```rust
//! use haulwise_core::formula::{evaluate, EvalMode, FormulaContext};
//!
//! let ctx = FormulaContext::new().with("rate", 1.0).with("rate2", 2.0);
//! assert_eq!(evaluate("rate + rate2", &ctx, EvalMode::Strict).unwrap(), 3.0);
//!
//! // Best effort: failures become 0.0
//! assert_eq!(evaluate("rate / 0", &ctx, EvalMode::BestEffort).unwrap(), 0.0);
//! ```

mod sandbox;

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::FormulaError;
use sandbox::{BinaryOp, Expr};

pub use sandbox::MAX_NESTING_DEPTH;

/// Maximum formula length in bytes.
pub const MAX_FORMULA_LEN: usize = 4096;

// =============================================================================
// Evaluation Mode
// =============================================================================

/// What to do when a formula fails.
///
/// There is deliberately no `Default`: every call site states its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    /// Return the `FormulaError`.
    Strict,
    /// Log the error and use `0.0`.
    BestEffort,
}

// =============================================================================
// Formula Context
// =============================================================================

/// Variable bindings for formula evaluation.
///
/// Ordered so that iteration (and therefore logging and error reporting)
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormulaContext {
    values: BTreeMap<String, f64>,
}

impl FormulaContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds `name` to `value`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Returns true if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FormulaContext {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        FormulaContext {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<BTreeMap<String, f64>> for FormulaContext {
    fn from(values: BTreeMap<String, f64>) -> Self {
        FormulaContext { values }
    }
}

// =============================================================================
// Formula
// =============================================================================

/// A parsed formula, ready to evaluate against any number of contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses a formula.
    ///
    /// ## Errors
    /// Any grammar violation (`UnexpectedToken`, `UnsupportedFunction`, ...),
    /// an empty formula, or one longer than [`MAX_FORMULA_LEN`].
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        if source.len() > MAX_FORMULA_LEN {
            return Err(FormulaError::TooLong {
                max: MAX_FORMULA_LEN,
            });
        }

        let expr = sandbox::parse(source)?;

        Ok(Formula {
            source: source.to_string(),
            expr,
        })
    }

    /// The formula text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All identifiers the formula references.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = Vec::new();
        collect_variables(&self.expr, &mut names);
        names.into_iter().collect()
    }

    /// Checks that every referenced identifier is bound, without evaluating.
    ///
    /// Reports the first unbound identifier in reading order.
    pub fn check_bindings(&self, context: &FormulaContext) -> Result<(), FormulaError> {
        let mut names = Vec::new();
        collect_variables(&self.expr, &mut names);

        match names.into_iter().find(|name| !context.contains(name)) {
            Some(name) => Err(FormulaError::UnboundVariable {
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Evaluates in strict mode.
    pub fn evaluate(&self, context: &FormulaContext) -> Result<f64, FormulaError> {
        self.check_bindings(context)?;
        eval(&self.expr, context)
    }

    /// Evaluates with an explicit failure policy.
    pub fn evaluate_with(&self, context: &FormulaContext, mode: EvalMode) -> Result<f64, FormulaError> {
        apply_mode(&self.source, self.evaluate(context), mode)
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses and evaluates `formula` against `context`.
///
/// ## Errors
/// In [`EvalMode::Strict`]: any [`FormulaError`]. In
/// [`EvalMode::BestEffort`] this never fails; errors yield `Ok(0.0)`.
///
/// ## Example
/// ```rust
/// use haulwise_core::formula::{evaluate, EvalMode, FormulaContext};
/// use haulwise_core::FormulaError;
///
/// let ctx = FormulaContext::new().with("a", 1.0);
/// assert_eq!(
///     evaluate("a + b", &ctx, EvalMode::Strict),
///     Err(FormulaError::UnboundVariable { name: "b".to_string() })
/// );
/// ```
pub fn evaluate(formula: &str, context: &FormulaContext, mode: EvalMode) -> Result<f64, FormulaError> {
    let result = Formula::parse(formula).and_then(|f| f.evaluate(context));
    apply_mode(formula, result, mode)
}

fn apply_mode(
    source: &str,
    result: Result<f64, FormulaError>,
    mode: EvalMode,
) -> Result<f64, FormulaError> {
    match (result, mode) {
        (Ok(value), _) => {
            debug!(formula = %source, value, "Formula evaluated");
            Ok(value)
        }
        (Err(err), EvalMode::Strict) => Err(err),
        (Err(err), EvalMode::BestEffort) => {
            warn!(formula = %source, error = %err, "Formula failed, using 0");
            Ok(0.0)
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

fn collect_variables<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Var(name) => out.push(name),
        Expr::Neg(inner) => collect_variables(inner, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_variables(lhs, out);
            collect_variables(rhs, out);
        }
    }
}

fn eval(expr: &Expr, context: &FormulaContext) -> Result<f64, FormulaError> {
    let value = match expr {
        Expr::Number(value) => *value,
        Expr::Var(name) => context
            .get(name)
            .ok_or_else(|| FormulaError::UnboundVariable { name: name.clone() })?,
        Expr::Neg(inner) => -eval(inner, context)?,
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, context)?;
            let rhs = eval(rhs, context)?;
            match op {
                BinaryOp::Add => lhs + rhs,
                BinaryOp::Sub => lhs - rhs,
                BinaryOp::Mul => lhs * rhs,
                BinaryOp::Div => {
                    if rhs == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    lhs / rhs
                }
            }
        }
    };

    if !value.is_finite() {
        return Err(FormulaError::NonFinite);
    }
    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctx() -> FormulaContext {
        FormulaContext::new()
            .with("rooms", 3.0)
            .with("avgRoomSize", 150.0)
            .with("rate", 1.0)
            .with("rate2", 2.0)
            .with("zero", 0.0)
    }

    #[rstest]
    #[case("1 + 2 * 3", 7.0)]
    #[case("(1 + 2) * 3", 9.0)]
    #[case("10 / 4", 2.5)]
    #[case("8 - 4 - 2", 2.0)]
    #[case("-3 + 5", 2.0)]
    #[case("-(rooms)", -3.0)]
    #[case("2 * -rooms", -6.0)]
    #[case(".5 * 4", 2.0)]
    #[case("rooms * avgRoomSize * 1.2", 540.0)]
    #[case("rate + rate2", 3.0)]
    #[case("rate2 - rate", 1.0)]
    fn test_evaluate(#[case] formula: &str, #[case] expected: f64) {
        let value = evaluate(formula, &ctx(), EvalMode::Strict).unwrap();
        assert!((value - expected).abs() < 1e-9, "{formula} = {value}");
    }

    #[test]
    fn test_unbound_variable() {
        let ctx = FormulaContext::new().with("a", 1.0);
        assert_eq!(
            evaluate("a + b", &ctx, EvalMode::Strict),
            Err(FormulaError::UnboundVariable {
                name: "b".to_string()
            })
        );
    }

    #[test]
    fn test_prefix_of_bound_name_is_not_bound() {
        // Only rate2 is bound; rate must not resolve through it
        let ctx = FormulaContext::new().with("rate2", 2.0);
        assert_eq!(
            evaluate("rate", &ctx, EvalMode::Strict),
            Err(FormulaError::UnboundVariable {
                name: "rate".to_string()
            })
        );
    }

    #[test]
    fn test_unbound_reported_before_division_by_zero() {
        assert_eq!(
            evaluate("1 / zero + missing", &ctx(), EvalMode::Strict),
            Err(FormulaError::UnboundVariable {
                name: "missing".to_string()
            })
        );
    }

    #[rstest]
    #[case("rooms / zero", FormulaError::DivisionByZero)]
    #[case("rooms / (rate - rate)", FormulaError::DivisionByZero)]
    #[case("max(rooms, 2)", FormulaError::UnsupportedFunction { name: "max".to_string(), position: 0 })]
    #[case("   ", FormulaError::Empty)]
    #[case("rooms +", FormulaError::UnexpectedEnd)]
    fn test_strict_errors(#[case] formula: &str, #[case] expected: FormulaError) {
        assert_eq!(evaluate(formula, &ctx(), EvalMode::Strict), Err(expected));
    }

    #[test]
    fn test_non_finite_result() {
        let ctx = FormulaContext::new().with("big", f64::MAX);
        assert_eq!(
            evaluate("big * 10", &ctx, EvalMode::Strict),
            Err(FormulaError::NonFinite)
        );

        let ctx = FormulaContext::new().with("nan", f64::NAN);
        assert_eq!(
            evaluate("nan + 1", &ctx, EvalMode::Strict),
            Err(FormulaError::NonFinite)
        );
    }

    #[test]
    fn test_best_effort_substitutes_zero() {
        let ctx = ctx();
        assert_eq!(evaluate("rooms / zero", &ctx, EvalMode::BestEffort), Ok(0.0));
        assert_eq!(evaluate("nope + 1", &ctx, EvalMode::BestEffort), Ok(0.0));
        assert_eq!(evaluate("1 +", &ctx, EvalMode::BestEffort), Ok(0.0));
        assert_eq!(evaluate("rooms + 1", &ctx, EvalMode::BestEffort), Ok(4.0));
    }

    #[test]
    fn test_too_long() {
        let long = "1+".repeat(MAX_FORMULA_LEN) + "1";
        assert_eq!(
            Formula::parse(&long),
            Err(FormulaError::TooLong {
                max: MAX_FORMULA_LEN
            })
        );
    }

    #[test]
    fn test_parsed_formula_reuse() {
        let formula: Formula = "rooms * avgRoomSize".parse().unwrap();
        assert_eq!(formula.source(), "rooms * avgRoomSize");
        assert_eq!(
            formula.variables().into_iter().collect::<Vec<_>>(),
            vec!["avgRoomSize", "rooms"]
        );

        let small = FormulaContext::new().with("rooms", 1.0).with("avgRoomSize", 100.0);
        let large = FormulaContext::new().with("rooms", 5.0).with("avgRoomSize", 200.0);
        assert_eq!(formula.evaluate(&small).unwrap(), 100.0);
        assert_eq!(formula.evaluate(&large).unwrap(), 1000.0);
    }

    #[test]
    fn test_check_bindings_reading_order() {
        let formula = Formula::parse("b + a").unwrap();
        assert_eq!(
            formula.check_bindings(&FormulaContext::new()),
            Err(FormulaError::UnboundVariable {
                name: "b".to_string()
            })
        );
    }

    #[test]
    fn test_deterministic() {
        let ctx = ctx();
        let a = evaluate("rooms * 1.1 / 3", &ctx, EvalMode::Strict).unwrap();
        let b = evaluate("rooms * 1.1 / 3", &ctx, EvalMode::Strict).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_context_serde_is_a_plain_map() {
        let ctx: FormulaContext = serde_json::from_str(r#"{"rooms": 4, "distance": 12.5}"#).unwrap();
        assert_eq!(ctx.get("rooms"), Some(4.0));
        assert_eq!(ctx.len(), 2);

        let names: Vec<&str> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["distance", "rooms"]);
    }
}
