use feedesk_core::{
    error::DeskError,
    merchant::{CaptureBucket, MerchantProfile},
    query::{Dimension, Objective, RuleFilter},
    rule::{FeeRule, SetCriterion, ValueCriterion},
    snapshot::DeskSnapshot,
    transaction::Transaction,
};

fn wildcard_rule(id: u32, scheme: &str, fixed_amount: f64) -> FeeRule {
    FeeRule {
        id,
        card_scheme: scheme.to_string(),
        account_type: SetCriterion::Any,
        merchant_category_code: SetCriterion::Any,
        aci: SetCriterion::Any,
        is_credit: ValueCriterion::Any,
        intracountry: ValueCriterion::Any,
        capture_delay: ValueCriterion::Any,
        monthly_volume: ValueCriterion::Any,
        monthly_fraud_level: ValueCriterion::Any,
        fixed_amount,
        rate: 0.0,
    }
}

fn profile(merchant: &str, account_type: &str) -> MerchantProfile {
    MerchantProfile {
        merchant: merchant.to_string(),
        account_type: account_type.to_string(),
        merchant_category_code: 5942,
        capture_delay_bucket: CaptureBucket::Under3,
        acquirer: vec!["gringotts".to_string()],
    }
}

fn txn(psp_reference: u64, merchant: &str, scheme: &str, aci: &str, eur_amount: f64) -> Transaction {
    Transaction {
        psp_reference,
        merchant: merchant.to_string(),
        card_scheme: scheme.to_string(),
        year: 2023,
        day_of_year: 75,
        is_credit: false,
        eur_amount,
        issuing_country: "NL".to_string(),
        acquirer_country: "NL".to_string(),
        aci: aci.to_string(),
        has_fraudulent_dispute: false,
    }
}

fn snapshot(rules: Vec<FeeRule>, transactions: Vec<Transaction>) -> DeskSnapshot {
    DeskSnapshot::new(
        rules,
        vec![profile("Book_Nook", "R"), profile("Gadget_Hub", "D")],
        Vec::new(),
        transactions,
    )
    .expect("valid snapshot")
}

#[test]
fn scheme_steering_picks_the_cheapest_and_most_expensive_totals() {
    let snap = snapshot(
        vec![
            wildcard_rule(1, "GlobalCard", 1.00),
            wildcard_rule(2, "TransactPlus", 3.00),
        ],
        vec![
            txn(1, "Book_Nook", "GlobalCard", "C", 100.0),
            txn(2, "Book_Nook", "GlobalCard", "C", 100.0),
        ],
    );
    let txns: Vec<&Transaction> = snap.transactions().iter().collect();

    let (scheme, total) = snap
        .best_dimension_value(&txns, Dimension::CardScheme, Objective::Cheapest)
        .unwrap();
    assert_eq!(scheme, "GlobalCard");
    assert!((total - 2.00).abs() < 1e-12);

    let (scheme, total) = snap
        .best_dimension_value(&txns, Dimension::CardScheme, Objective::MostExpensive)
        .unwrap();
    assert_eq!(scheme, "TransactPlus");
    assert!((total - 6.00).abs() < 1e-12);
}

#[test]
fn dimension_ties_break_to_the_lowest_candidate() {
    // GlobalCard and NexPay price identically; GlobalCard sorts first.
    let snap = snapshot(
        vec![
            wildcard_rule(1, "NexPay", 1.00),
            wildcard_rule(2, "GlobalCard", 1.00),
            wildcard_rule(3, "TransactPlus", 3.00),
        ],
        vec![txn(1, "Book_Nook", "TransactPlus", "C", 100.0)],
    );
    let txns: Vec<&Transaction> = snap.transactions().iter().collect();

    let (scheme, _) = snap
        .best_dimension_value(&txns, Dimension::CardScheme, Objective::Cheapest)
        .unwrap();
    assert_eq!(scheme, "GlobalCard");
}

#[test]
fn aci_steering_draws_candidates_from_the_whole_snapshot() {
    let mut card_present = wildcard_rule(1, "GlobalCard", 2.00);
    card_present.aci = SetCriterion::of(["C".to_string()]);
    let mut card_absent = wildcard_rule(2, "GlobalCard", 0.50);
    card_absent.aci = SetCriterion::of(["F".to_string()]);

    // The "F" candidate exists only because some snapshot transaction
    // uses it; the steered subset is all-"C".
    let snap = snapshot(
        vec![card_present, card_absent],
        vec![
            txn(1, "Book_Nook", "GlobalCard", "C", 100.0),
            txn(2, "Book_Nook", "GlobalCard", "C", 100.0),
            txn(3, "Gadget_Hub", "GlobalCard", "F", 10.0),
        ],
    );
    let steered: Vec<&Transaction> = snap
        .transactions()
        .iter()
        .filter(|t| t.merchant == "Book_Nook")
        .collect();

    let (aci, total) = snap
        .best_dimension_value(&steered, Dimension::Aci, Objective::Cheapest)
        .unwrap();
    assert_eq!(aci, "F");
    assert!((total - 1.00).abs() < 1e-12);
}

#[test]
fn empty_candidate_pool_is_a_contract_error_not_a_default() {
    let snap = snapshot(Vec::new(), vec![txn(1, "Book_Nook", "GlobalCard", "C", 100.0)]);
    let txns: Vec<&Transaction> = snap.transactions().iter().collect();

    let err = snap
        .best_dimension_value(&txns, Dimension::CardScheme, Objective::Cheapest)
        .unwrap_err();
    assert!(matches!(
        err,
        DeskError::NoCandidates {
            dimension: "card_scheme"
        }
    ));
}

#[test]
fn affected_merchants_requires_a_real_matching_transaction() {
    let mut retail_only = wildcard_rule(1, "GlobalCard", 1.00);
    retail_only.account_type = SetCriterion::of(["R".to_string()]);

    let snap = snapshot(
        vec![retail_only],
        vec![
            txn(1, "Book_Nook", "GlobalCard", "C", 100.0),
            txn(2, "Gadget_Hub", "GlobalCard", "C", 100.0),
        ],
    );

    let affected = snap.affected_merchants(1, None).unwrap();
    assert_eq!(affected.into_iter().collect::<Vec<_>>(), vec!["Book_Nook"]);
}

#[test]
fn narrowing_excludes_merchants_already_of_the_new_type() {
    let snap = snapshot(
        vec![wildcard_rule(1, "GlobalCard", 1.00)],
        vec![
            txn(1, "Book_Nook", "GlobalCard", "C", 100.0),
            txn(2, "Gadget_Hub", "GlobalCard", "C", 100.0),
        ],
    );

    let affected = snap.affected_merchants(1, None).unwrap();
    assert_eq!(affected.len(), 2);

    // Narrow the rule to account type D: Gadget_Hub is already D, so
    // the change would not alter its outcome.
    let affected = snap.affected_merchants(1, Some("D")).unwrap();
    assert_eq!(affected.into_iter().collect::<Vec<_>>(), vec!["Book_Nook"]);
}

#[test]
fn rule_ids_by_criteria_use_wildcard_or_member_semantics() {
    let mut retail = wildcard_rule(1, "GlobalCard", 1.00);
    retail.account_type = SetCriterion::of(["R".to_string()]);
    let open = wildcard_rule(2, "GlobalCard", 1.00);
    let mut diner_f = wildcard_rule(3, "GlobalCard", 1.00);
    diner_f.account_type = SetCriterion::of(["D".to_string()]);
    diner_f.aci = SetCriterion::of(["F".to_string()]);

    let snap = snapshot(vec![retail, open, diner_f], Vec::new());

    let filter = RuleFilter {
        account_type: Some("R".to_string()),
        ..RuleFilter::default()
    };
    assert_eq!(snap.rule_ids_where(&filter).into_iter().collect::<Vec<_>>(), vec![1, 2]);

    let filter = RuleFilter {
        aci: Some("F".to_string()),
        ..RuleFilter::default()
    };
    assert_eq!(snap.rule_ids_where(&filter).into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);

    let filter = RuleFilter {
        account_type: Some("D".to_string()),
        aci: Some("F".to_string()),
        ..RuleFilter::default()
    };
    assert_eq!(snap.rule_ids_where(&filter).into_iter().collect::<Vec<_>>(), vec![2, 3]);
}

#[test]
fn average_rule_fee_is_none_when_nothing_admits() {
    let snap = snapshot(vec![wildcard_rule(1, "GlobalCard", 1.00)], Vec::new());
    let filter = RuleFilter {
        card_scheme: Some("NexPay".to_string()),
        ..RuleFilter::default()
    };
    assert_eq!(snap.average_rule_fee(&filter, 50.0).unwrap(), None);
}

#[test]
fn average_rule_fee_treats_credit_as_wildcard_or_equal() {
    let mut credit_only = wildcard_rule(1, "GlobalCard", 2.00);
    credit_only.is_credit = ValueCriterion::Equals(true);
    let open = wildcard_rule(2, "GlobalCard", 1.00);
    let mut debit_only = wildcard_rule(3, "GlobalCard", 9.00);
    debit_only.is_credit = ValueCriterion::Equals(false);

    let snap = snapshot(vec![credit_only, open, debit_only], Vec::new());
    let filter = RuleFilter {
        card_scheme: Some("GlobalCard".to_string()),
        is_credit: Some(true),
        ..RuleFilter::default()
    };
    let average = snap.average_rule_fee(&filter, 0.0).unwrap().unwrap();
    assert!((average - 1.50).abs() < 1e-12, "expected 1.50, got {average}");
}

#[test]
fn hypothetical_amounts_are_validated_at_the_boundary() {
    let snap = snapshot(vec![wildcard_rule(1, "GlobalCard", 1.00)], Vec::new());
    let err = snap
        .average_rule_fee(&RuleFilter::default(), -10.0)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidAmount(_)));
    assert!(snap.best_scheme_by_average_fee(f64::NAN, Objective::Cheapest).is_err());
    assert!(snap.extreme_mcc_by_average_fee(-1.0, Objective::Cheapest).is_err());
}

#[test]
fn best_scheme_averages_over_each_schemes_rules() {
    let snap = snapshot(
        vec![
            wildcard_rule(1, "GlobalCard", 1.00),
            wildcard_rule(2, "GlobalCard", 3.00),
            wildcard_rule(3, "TransactPlus", 5.00),
        ],
        Vec::new(),
    );

    let (scheme, average) = snap
        .best_scheme_by_average_fee(100.0, Objective::Cheapest)
        .unwrap();
    assert_eq!(scheme, "GlobalCard");
    assert!((average - 2.00).abs() < 1e-12);

    let (scheme, average) = snap
        .best_scheme_by_average_fee(100.0, Objective::MostExpensive)
        .unwrap();
    assert_eq!(scheme, "TransactPlus");
    assert!((average - 5.00).abs() < 1e-12);
}

#[test]
fn extreme_mcc_considers_wildcard_rules_for_every_candidate() {
    let mut books = wildcard_rule(1, "GlobalCard", 4.00);
    books.merchant_category_code = SetCriterion::of([5942]);
    let mut electronics = wildcard_rule(2, "GlobalCard", 1.00);
    electronics.merchant_category_code = SetCriterion::of([5732]);
    let open = wildcard_rule(3, "GlobalCard", 2.00);

    let snap = snapshot(vec![books, electronics, open], Vec::new());

    // 5942: mean(4.00, 2.00) = 3.00; 5732: mean(1.00, 2.00) = 1.50
    let most = snap
        .extreme_mcc_by_average_fee(0.0, Objective::MostExpensive)
        .unwrap();
    assert_eq!(most, vec![5942]);
    let least = snap
        .extreme_mcc_by_average_fee(0.0, Objective::Cheapest)
        .unwrap();
    assert_eq!(least, vec![5732]);
}

#[test]
fn extreme_mcc_keeps_all_tied_candidates_sorted() {
    let mut books = wildcard_rule(1, "GlobalCard", 1.00);
    books.merchant_category_code = SetCriterion::of([5942]);
    let mut electronics = wildcard_rule(2, "GlobalCard", 1.00);
    electronics.merchant_category_code = SetCriterion::of([5732]);

    let snap = snapshot(vec![books, electronics], Vec::new());
    let tied = snap
        .extreme_mcc_by_average_fee(0.0, Objective::MostExpensive)
        .unwrap();
    assert_eq!(tied, vec![5732, 5942]);
}

#[test]
fn best_aci_averages_over_admitting_rules_per_candidate() {
    let mut card_present = wildcard_rule(1, "GlobalCard", 2.00);
    card_present.aci = SetCriterion::of(["C".to_string()]);
    let mut card_absent = wildcard_rule(2, "GlobalCard", 0.50);
    card_absent.aci = SetCriterion::of(["F".to_string()]);
    let open = wildcard_rule(3, "GlobalCard", 1.00);

    let snap = snapshot(
        vec![card_present, card_absent, open],
        vec![
            txn(1, "Book_Nook", "GlobalCard", "C", 100.0),
            txn(2, "Book_Nook", "GlobalCard", "F", 100.0),
        ],
    );

    // C: mean(2.00, 1.00) = 1.50; F: mean(0.50, 1.00) = 0.75
    let (aci, average) = snap
        .best_aci_by_average_fee("GlobalCard", None, 0.0, Objective::MostExpensive)
        .unwrap();
    assert_eq!(aci, "C");
    assert!((average - 1.50).abs() < 1e-12);

    let (aci, average) = snap
        .best_aci_by_average_fee("GlobalCard", None, 0.0, Objective::Cheapest)
        .unwrap();
    assert_eq!(aci, "F");
    assert!((average - 0.75).abs() < 1e-12);
}
