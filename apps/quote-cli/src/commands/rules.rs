//! `rules`: apply the configured calculation rules to a JSON object of
//! field values.

use haulwise_core::{EvalMode, FormulaContext, PricingConfig};
use tracing::info;

use crate::cli::RulesArgs;
use crate::error::CliResult;

pub fn execute(args: &RulesArgs, config: &PricingConfig) -> CliResult<String> {
    let raw = super::read_input(&args.input)?;
    apply(&raw, config, args.best_effort)
}

/// Applies the rules to a JSON context and renders the evaluation as JSON.
pub fn apply(raw: &str, config: &PricingConfig, best_effort: bool) -> CliResult<String> {
    let context: FormulaContext = serde_json::from_str(raw)?;
    let rules = config.rule_set()?;
    let mode = if best_effort {
        EvalMode::BestEffort
    } else {
        EvalMode::Strict
    };

    let evaluation = rules.apply(&context, mode)?;
    if !evaluation.failures.is_empty() {
        info!(failures = evaluation.failures.len(), "Some rules fell back to 0");
    }
    Ok(serde_json::to_string_pretty(&evaluation)?)
}
