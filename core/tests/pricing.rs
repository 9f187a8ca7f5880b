use feedesk_core::{
    error::DeskError,
    pricing::{realized_fee, rule_fee, validate_amount},
    rule::{FeeRule, SetCriterion, ValueCriterion},
};

fn priced_rule(id: u32, fixed_amount: f64, rate: f64) -> FeeRule {
    FeeRule {
        id,
        card_scheme: "VisaNet".to_string(),
        account_type: SetCriterion::Any,
        merchant_category_code: SetCriterion::Any,
        aci: SetCriterion::Any,
        is_credit: ValueCriterion::Any,
        intracountry: ValueCriterion::Any,
        capture_delay: ValueCriterion::Any,
        monthly_volume: ValueCriterion::Any,
        monthly_fraud_level: ValueCriterion::Any,
        fixed_amount,
        rate,
    }
}

#[test]
fn fee_is_fixed_plus_rate_per_ten_thousand() {
    // 0.10 + 50 * 100 / 10000 = 0.60
    let rule = priced_rule(1, 0.10, 50.0);
    let fee = rule_fee(&rule, 100.0);
    assert!((fee - 0.60).abs() < 1e-12, "expected 0.60, got {fee}");
}

#[test]
fn zero_amount_charges_only_the_fixed_part() {
    let rule = priced_rule(1, 0.25, 90.0);
    assert!((rule_fee(&rule, 0.0) - 0.25).abs() < 1e-12);
}

#[test]
fn tied_rules_average_their_fees() {
    let a = priced_rule(1, 1.00, 0.0);
    let b = priced_rule(2, 2.00, 0.0);
    let fee = realized_fee(&[&a, &b], 100.0);
    assert!((fee - 1.50).abs() < 1e-12, "expected 1.50, got {fee}");
}

#[test]
fn empty_applied_set_prices_to_zero() {
    assert_eq!(realized_fee(&[], 123.45), 0.0);
}

#[test]
fn malformed_rules_are_rejected_at_validation() {
    let mut rule = priced_rule(1, -0.10, 50.0);
    assert!(matches!(
        rule.validate(),
        Err(DeskError::InvalidRule { id: 1, .. })
    ));

    rule.fixed_amount = 0.10;
    rule.rate = -1.0;
    assert!(rule.validate().is_err());

    rule.rate = 50.0;
    assert!(rule.validate().is_ok());
}

#[test]
fn negative_and_non_finite_amounts_violate_the_caller_contract() {
    assert!(matches!(
        validate_amount(-1.0),
        Err(DeskError::InvalidAmount(_))
    ));
    assert!(validate_amount(f64::NAN).is_err());
    assert!(validate_amount(f64::INFINITY).is_err());
    assert!(validate_amount(0.0).is_ok());
    assert!(validate_amount(250.0).is_ok());
}
