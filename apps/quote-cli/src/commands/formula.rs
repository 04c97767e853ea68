//! `eval`: evaluate one formula against `--var` bindings.

use haulwise_core::validation::is_identifier;
use haulwise_core::{evaluate, EvalMode, FormulaContext};

use crate::cli::EvalArgs;
use crate::error::{CliError, CliResult};

pub fn execute(args: &EvalArgs) -> CliResult<String> {
    let context = parse_vars(&args.vars)?;
    let mode = if args.best_effort {
        EvalMode::BestEffort
    } else {
        EvalMode::Strict
    };

    let value = evaluate(&args.formula, &context, mode).map_err(haulwise_core::CoreError::from)?;
    Ok(value.to_string())
}

/// Parses `name=number` pairs into a context. Later bindings win.
pub fn parse_vars(vars: &[String]) -> CliResult<FormulaContext> {
    let mut context = FormulaContext::new();
    for var in vars {
        let (name, value) = var
            .split_once('=')
            .ok_or_else(|| CliError::InvalidVar(var.clone()))?;
        let name = name.trim();
        if !is_identifier(name) {
            return Err(CliError::InvalidVar(var.clone()));
        }
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| CliError::InvalidVar(var.clone()))?;
        context.insert(name, value);
    }
    Ok(context)
}
