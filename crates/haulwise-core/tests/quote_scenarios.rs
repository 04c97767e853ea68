//! End-to-end pricing scenarios through the public API, starting from the
//! JSON the quote editor sends.

use haulwise_core::formula::{evaluate, EvalMode, FormulaContext};
use haulwise_core::money::format_currency;
use haulwise_core::{
    calculate, CalculationInput, CoreError, DegenerateResult, FormulaError, PricingConfig,
    ValidationError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn input_from_json(json: &str) -> CalculationInput {
    serde_json::from_str(json).unwrap()
}

#[test]
fn editor_payload_scenario() {
    let input = input_from_json(
        r#"{
            "lineItems": [
                {"id": "l1", "name": "Packing crew", "type": "service",
                 "quantity": "2", "unitPrice": "100", "unitCost": "60",
                 "taxable": true, "total": "999"},
                {"id": "l2", "name": "Boxes", "type": "product",
                 "quantity": 1, "unitPrice": 50, "unitCost": 20,
                 "taxable": false}
            ],
            "taxRatePercent": "10",
            "discountPercent": "10"
        }"#,
    );

    let result = calculate(&input).unwrap();
    assert_eq!(result.subtotal, dec!(250));
    assert_eq!(result.discount_amount, dec!(25));
    assert_eq!(result.taxable_items_total, dec!(200));
    assert_eq!(result.tax_amount, dec!(18));
    assert_eq!(result.total, dec!(243));
    assert_eq!(result.estimated_cost, dec!(140));
    assert_eq!(result.margin, dec!(103));
    assert_eq!(result.rounded(2).margin_percentage, dec!(42.39));
    assert!(result.warnings().is_empty());
}

#[test]
fn result_serializes_camel_case() {
    let input = input_from_json(
        r#"{"lineItems": [{"quantity": "1", "unitPrice": "10", "taxable": true}],
            "taxRatePercent": "5"}"#,
    );
    let json = serde_json::to_value(calculate(&input).unwrap()).unwrap();

    for key in [
        "subtotal",
        "discountAmount",
        "taxableItemsTotal",
        "taxAmount",
        "total",
        "estimatedCost",
        "margin",
        "marginPercentage",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn single_non_taxable_item_has_no_tax() {
    let input = input_from_json(
        r#"{"lineItems": [{"quantity": "3", "unitPrice": "40"}], "taxRatePercent": "13"}"#,
    );
    let result = calculate(&input).unwrap();
    assert_eq!(result.tax_amount, Decimal::ZERO);
    assert_eq!(result.total, dec!(120));
}

#[test]
fn fixed_discount_larger_than_quote_is_flagged() {
    let input = input_from_json(
        r#"{"lineItems": [{"quantity": "1", "unitPrice": "80", "unitCost": "30"}],
            "discountAmount": "100"}"#,
    );
    let result = calculate(&input).unwrap();
    assert_eq!(result.total, dec!(-20));
    assert_eq!(
        result.warnings(),
        vec![
            DegenerateResult::DiscountExceedsSubtotal,
            DegenerateResult::NegativeTotal,
            DegenerateResult::NegativeMargin,
        ]
    );
    assert!(matches!(
        result.reject_degenerate(),
        Err(CoreError::Degenerate(w)) if w.len() == 3
    ));
}

#[test]
fn full_discount_on_partly_taxable_quote_is_free() {
    for discount in [r#""discountPercent": "100""#, r#""discountAmount": "300""#] {
        let input = input_from_json(&format!(
            r#"{{"lineItems": [
                    {{"quantity": "1", "unitPrice": "100", "taxable": true}},
                    {{"quantity": "1", "unitPrice": "200", "unitCost": "50"}}
                ],
                "taxRatePercent": "10",
                {discount}}}"#
        ));

        let result = calculate(&input).unwrap();
        assert_eq!(result.tax_amount, Decimal::ZERO, "{discount}");
        assert_eq!(result.total, Decimal::ZERO, "{discount}");
        assert_eq!(result.margin_percentage, Decimal::ZERO, "{discount}");
        assert_eq!(result.warnings(), vec![DegenerateResult::NegativeMargin]);
    }
}

#[test]
fn negative_price_names_the_line() {
    let input = input_from_json(
        r#"{"lineItems": [
                {"quantity": "1", "unitPrice": "10"},
                {"quantity": "1", "unitPrice": "-10"}
            ]}"#,
    );
    match calculate(&input) {
        Err(CoreError::Validation(ValidationError::Negative { field })) => {
            assert_eq!(field, "lineItems[1].unitPrice")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn configured_rules_and_estimates_agree() {
    let config: PricingConfig = toml::from_str(
        r#"
        [[calculation_rules]]
        id = "volume"
        formula = "rooms * 150 * 1.2"
        output_field = "volume"
        trigger_fields = ["rooms"]

        [[calculation_rules]]
        id = "labor"
        formula = "hours * workers * 50"
        output_field = "laborCost"
        trigger_fields = ["hours", "workers"]
        "#,
    )
    .unwrap();
    config.validate().unwrap();

    let rules = config.rule_set().unwrap();
    let ctx = FormulaContext::new()
        .with("rooms", 4.0)
        .with("hours", 6.0)
        .with("workers", 3.0);
    let eval = rules.apply(&ctx, EvalMode::Strict).unwrap();

    let volume = config.estimates.packed_volume(dec!(4)).unwrap();
    let labor = config.estimates.labor_cost(dec!(6), dec!(3)).unwrap();
    assert_eq!(volume, dec!(720));
    assert_eq!(labor, dec!(900));
    assert!((eval.outputs["volume"] - 720.0).abs() < 1e-9);
    assert!((eval.outputs["laborCost"] - 900.0).abs() < 1e-9);
}

#[test]
fn formula_sandbox_rejects_host_access() {
    let ctx = FormulaContext::new().with("a", 1.0);
    for attempt in [
        "process.exit(1)",
        "a; a",
        "constructor(a)",
        "a = 2",
        "'a'",
        "\"a\"",
        "a == a",
        "a ^ 2",
        "a % 2",
        "true",
        "a, a",
        "str::len(a)",
    ] {
        assert!(
            evaluate(attempt, &ctx, EvalMode::Strict).is_err(),
            "{attempt} should be rejected"
        );
    }
    assert_eq!(
        evaluate("constructor(a)", &ctx, EvalMode::Strict),
        Err(FormulaError::UnsupportedFunction {
            name: "constructor".to_string(),
            position: 0
        })
    );
}

#[test]
fn display_uses_configured_currency() {
    let config = PricingConfig::default();
    assert_eq!(
        format_currency(dec!(1234.567), &config.currency),
        "$1,234.57"
    );
}
