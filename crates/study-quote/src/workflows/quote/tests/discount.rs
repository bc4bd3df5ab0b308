use chrono::NaiveDate;

use super::common::*;
use crate::workflows::quote::discount::{
    AppliedDiscount, DiscountConfig, DiscountKind, DiscountPolicy, DiscountRule,
    EarlyBookingRule,
};
use crate::workflows::quote::domain::{AccommodationType, Money, Selection};

/// Flat amount off whenever it runs; used to exercise stacking and the cap.
#[derive(Debug)]
struct FixedAmountRule(Money);

impl DiscountRule for FixedAmountRule {
    fn evaluate(
        &self,
        _selection: &Selection,
        _subtotal: Money,
        _today: NaiveDate,
    ) -> Option<AppliedDiscount> {
        Some(AppliedDiscount {
            kind: DiscountKind::EarlyBooking,
            amount: self.0,
            notes: "fixed".to_string(),
        })
    }
}

fn starting(start_date: Option<NaiveDate>) -> Selection {
    selection(12, AccommodationType::Homestay, start_date, &[])
}

#[test]
fn early_booking_applies_at_exactly_the_minimum_lead_time() {
    let policy = DiscountPolicy::default();

    let outcome = policy.evaluate(&starting(Some(early_start())), Money(1_610_000), today());
    assert_eq!(outcome.total, Money(80_500));
    assert_eq!(outcome.applied.len(), 1);
    assert!(outcome.applied[0].notes.contains("90 days"));

    let outcome = policy.evaluate(&starting(Some(late_start())), Money(1_610_000), today());
    assert_eq!(outcome.total, Money::ZERO);
    assert!(outcome.applied.is_empty());
}

#[test]
fn unknown_start_date_never_earns_the_discount() {
    let outcome = DiscountPolicy::default().evaluate(&starting(None), Money(500_000), today());
    assert_eq!(outcome.total, Money::ZERO);
    assert!(outcome.applied.is_empty());
}

#[test]
fn discount_amount_is_floored_to_whole_minor_units() {
    let rule = EarlyBookingRule::from_config(&DiscountConfig::default());
    let applied = rule
        .evaluate(&starting(Some(early_start())), Money(12_345), today())
        .expect("rule applies");
    // 5% of 12,345 = 617.25
    assert_eq!(applied.amount, Money(617));
}

#[test]
fn configured_threshold_and_rate_are_honoured() {
    let policy = DiscountPolicy::new(DiscountConfig {
        early_booking_min_days: 60,
        early_booking_bps: 1_000,
    });
    let start = today() + chrono::Duration::days(60);

    let outcome = policy.evaluate(&starting(Some(start)), Money(200_000), today());
    assert_eq!(outcome.total, Money(20_000));
}

#[test]
fn qualifying_rules_stack() {
    let policy = DiscountPolicy::with_rules(vec![
        Box::new(EarlyBookingRule::from_config(&DiscountConfig::default())),
        Box::new(FixedAmountRule(Money(10_000))),
    ]);

    let outcome = policy.evaluate(&starting(Some(early_start())), Money(1_000_000), today());
    assert_eq!(outcome.applied.len(), 2);
    assert_eq!(outcome.total, Money(60_000));
}

#[test]
fn stacked_discounts_are_capped_at_the_subtotal() {
    let policy = DiscountPolicy::with_rules(vec![
        Box::new(FixedAmountRule(Money(7_000))),
        Box::new(FixedAmountRule(Money(7_000))),
    ]);

    let outcome = policy.evaluate(&starting(None), Money(10_000), today());
    assert_eq!(outcome.applied.len(), 2);
    assert_eq!(outcome.total, Money(10_000));
}
