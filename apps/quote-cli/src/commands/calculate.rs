//! `calculate`: quote totals from a JSON `CalculationInput`.

use haulwise_core::money::{format_currency, format_percentage};
use haulwise_core::{calculate, CalculationInput, CalculationResult, PricingConfig};
use serde_json::Value;
use tracing::debug;

use crate::cli::{CalculateArgs, OutputFormat};
use crate::error::CliResult;

const TAX_RATE_KEY: &str = "taxRatePercent";

pub fn execute(args: &CalculateArgs, config: &PricingConfig) -> CliResult<String> {
    let raw = super::read_input(&args.input)?;
    let input = parse_input(&raw, config)?;

    let mut result = calculate(&input)?;
    if args.reject_degenerate {
        result = result.reject_degenerate()?;
    }

    match args.format {
        OutputFormat::Json => {
            let result = if args.round {
                result.rounded(config.currency.decimals)
            } else {
                result
            };
            Ok(serde_json::to_string_pretty(&result)?)
        }
        OutputFormat::Text => Ok(render_text(&result, config)),
    }
}

/// Parses the request, filling in the configured tax rate when the request
/// does not carry one.
pub fn parse_input(raw: &str, config: &PricingConfig) -> CliResult<CalculationInput> {
    let mut value: Value = serde_json::from_str(raw)?;

    if let Value::Object(map) = &mut value {
        if !map.contains_key(TAX_RATE_KEY) {
            debug!(tax_rate = %config.default_tax_rate_percent, "Using configured default tax rate");
            map.insert(
                TAX_RATE_KEY.to_string(),
                Value::String(config.default_tax_rate_percent.to_string()),
            );
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Human-readable summary, rounded to the configured currency.
pub fn render_text(result: &CalculationResult, config: &PricingConfig) -> String {
    let money = |amount| format_currency(amount, &config.currency);

    let mut lines = vec![
        format!("{:<16}{}", "Subtotal:", money(result.subtotal)),
        format!("{:<16}{}", "Discount:", money(-result.discount_amount)),
        format!("{:<16}{}", "Tax:", money(result.tax_amount)),
        format!("{:<16}{}", "Total:", money(result.total)),
        format!("{:<16}{}", "Estimated cost:", money(result.estimated_cost)),
        format!(
            "{:<16}{} ({})",
            "Margin:",
            money(result.margin),
            format_percentage(result.margin_percentage)
        ),
    ];
    for warning in result.warnings() {
        lines.push(format!("Warning: {warning}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SCENARIO: &str = r#"{
        "lineItems": [
            {"quantity": "2", "unitPrice": "100", "unitCost": "60", "taxable": true},
            {"quantity": "1", "unitPrice": "50", "unitCost": "20"}
        ],
        "taxRatePercent": "10",
        "discountPercent": "10"
    }"#;

    #[test]
    fn test_default_tax_rate_applied_when_missing() {
        let config = PricingConfig {
            default_tax_rate_percent: dec!(8),
            ..Default::default()
        };
        let input = parse_input(r#"{"lineItems": []}"#, &config).unwrap();
        assert_eq!(input.tax_rate_percent, dec!(8));

        let input = parse_input(SCENARIO, &config).unwrap();
        assert_eq!(input.tax_rate_percent, dec!(10));
    }

    #[test]
    fn test_render_text() {
        let config = PricingConfig::default();
        let input = parse_input(SCENARIO, &config).unwrap();
        let text = render_text(&calculate(&input).unwrap(), &config);

        assert!(text.contains("Subtotal:       $250.00"));
        assert!(text.contains("Discount:       -$25.00"));
        assert!(text.contains("Total:          $243.00"));
        assert!(text.contains("Margin:         $103.00 (42.39%)"));
        assert!(!text.contains("Warning"));
    }

    #[test]
    fn test_render_text_warnings() {
        let config = PricingConfig::default();
        let input = parse_input(
            r#"{"lineItems": [{"quantity": "1", "unitPrice": "10", "unitCost": "50"}]}"#,
            &config,
        )
        .unwrap();
        let text = render_text(&calculate(&input).unwrap(), &config);
        assert!(text.contains("Warning: negative margin"));
    }

    #[test]
    fn test_invalid_json() {
        let config = PricingConfig::default();
        assert!(parse_input("{not json", &config).is_err());
    }
}
