mod config;
mod rules;

pub use config::DiscountConfig;
pub use rules::EarlyBookingRule;

use super::domain::{Money, Selection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    EarlyBooking,
}

impl DiscountKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::EarlyBooking => "Early booking discount",
        }
    }
}

/// Single rule contribution, kept for the audit trail on a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub kind: DiscountKind,
    pub amount: Money,
    pub notes: String,
}

/// A discount rule is evaluated independently of every other rule.
pub trait DiscountRule: fmt::Debug + Send + Sync {
    fn evaluate(
        &self,
        selection: &Selection,
        subtotal: Money,
        today: NaiveDate,
    ) -> Option<AppliedDiscount>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountOutcome {
    pub applied: Vec<AppliedDiscount>,
    /// Sum of every applied rule, capped at the subtotal.
    pub total: Money,
}

/// Evaluates every rule, stacks the qualifying ones, and caps the sum.
#[derive(Debug)]
pub struct DiscountPolicy {
    rules: Vec<Box<dyn DiscountRule>>,
}

impl DiscountPolicy {
    pub fn new(config: DiscountConfig) -> Self {
        Self::with_rules(vec![Box::new(EarlyBookingRule::from_config(&config))])
    }

    pub fn with_rules(rules: Vec<Box<dyn DiscountRule>>) -> Self {
        Self { rules }
    }

    pub fn none() -> Self {
        Self::with_rules(Vec::new())
    }

    pub fn evaluate(
        &self,
        selection: &Selection,
        subtotal: Money,
        today: NaiveDate,
    ) -> DiscountOutcome {
        let applied: Vec<AppliedDiscount> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(selection, subtotal, today))
            .collect();

        let stacked: Money = applied.iter().map(|discount| discount.amount).sum();
        let total = stacked.min(subtotal.max(Money::ZERO));

        DiscountOutcome { applied, total }
    }
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self::new(DiscountConfig::default())
    }
}
