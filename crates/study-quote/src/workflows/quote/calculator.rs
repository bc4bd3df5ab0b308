use super::catalog::{OptionPricing, PricingCatalog};
use super::discount::{AppliedDiscount, DiscountPolicy};
use super::domain::{
    AccommodationType, CurrencyCode, Money, QuoteError, SchoolId, Selection, SelectionIssue,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Tuition,
    Accommodation,
    Fees,
    Options,
}

impl CostCategory {
    pub const fn ordered() -> [Self; 4] {
        [Self::Tuition, Self::Accommodation, Self::Fees, Self::Options]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Tuition => "Tuition",
            Self::Accommodation => "Accommodation",
            Self::Fees => "Fees",
            Self::Options => "Options",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemUnit {
    PerWeek { rate: Money, weeks: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownItem {
    pub name: String,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<ItemUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownCategory {
    pub category: CostCategory,
    pub items: Vec<BreakdownItem>,
    pub subtotal: Money,
}

impl BreakdownCategory {
    fn new(category: CostCategory, items: Vec<BreakdownItem>) -> Self {
        let subtotal = items.iter().map(|item| item.amount).sum();
        Self {
            category,
            items,
            subtotal,
        }
    }
}

/// Priced, itemized estimate. Only the calculator can assemble one, so the
/// subtotal, total, and breakdown always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    school_id: SchoolId,
    weeks: u32,
    accommodation_type: AccommodationType,
    tuition: Money,
    accommodation: Money,
    fees: Money,
    options: Money,
    subtotal: Money,
    discounts: Money,
    total: Money,
    currency: CurrencyCode,
    exchange_rate: Decimal,
    breakdown: Vec<BreakdownCategory>,
    applied_discounts: Vec<AppliedDiscount>,
}

impl CalculationResult {
    pub fn school_id(&self) -> &SchoolId {
        &self.school_id
    }

    pub fn weeks(&self) -> u32 {
        self.weeks
    }

    pub fn accommodation_type(&self) -> AccommodationType {
        self.accommodation_type
    }

    pub fn tuition(&self) -> Money {
        self.tuition
    }

    pub fn accommodation(&self) -> Money {
        self.accommodation
    }

    pub fn fees(&self) -> Money {
        self.fees
    }

    pub fn options(&self) -> Money {
        self.options
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discounts(&self) -> Money {
        self.discounts
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn exchange_rate(&self) -> Decimal {
        self.exchange_rate
    }

    pub fn breakdown(&self) -> &[BreakdownCategory] {
        &self.breakdown
    }

    pub fn applied_discounts(&self) -> &[AppliedDiscount] {
        &self.applied_discounts
    }

    pub fn category(&self, category: CostCategory) -> Option<&BreakdownCategory> {
        self.breakdown
            .iter()
            .find(|entry| entry.category == category)
    }
}

/// Pure pricing: catalog + selection in, itemized result out.
#[derive(Debug, Default)]
pub struct PricingCalculator {
    policy: DiscountPolicy,
}

impl PricingCalculator {
    pub fn new(policy: DiscountPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DiscountPolicy {
        &self.policy
    }

    pub fn calculate(
        &self,
        catalog: &PricingCatalog,
        selection: &Selection,
        today: NaiveDate,
    ) -> Result<CalculationResult, QuoteError> {
        catalog.validate()?;
        let (weeks, accommodation_type) = selection.priced_fields()?;

        if let Some(unknown) = selection
            .options
            .iter()
            .find(|key| catalog.option(key).is_none())
        {
            return Err(SelectionIssue::UnknownOption(unknown.clone()).into());
        }

        let breakdown = vec![
            tuition_category(catalog, weeks),
            accommodation_category(catalog, accommodation_type, weeks),
            fees_category(catalog),
            options_category(catalog, selection, weeks),
        ];

        let category_total = |category: CostCategory| {
            breakdown
                .iter()
                .find(|entry| entry.category == category)
                .map(|entry| entry.subtotal)
                .unwrap_or(Money::ZERO)
        };
        let tuition = category_total(CostCategory::Tuition);
        let accommodation = category_total(CostCategory::Accommodation);
        let fees = category_total(CostCategory::Fees);
        let options = category_total(CostCategory::Options);
        let subtotal = tuition + accommodation + fees + options;

        let outcome = self.policy.evaluate(selection, subtotal, today);
        let total = (subtotal - outcome.total).max(Money::ZERO);

        Ok(CalculationResult {
            school_id: catalog.school_id.clone(),
            weeks,
            accommodation_type,
            tuition,
            accommodation,
            fees,
            options,
            subtotal,
            discounts: outcome.total,
            total,
            currency: catalog.currency,
            exchange_rate: catalog.exchange_rate,
            breakdown,
            applied_discounts: outcome.applied,
        })
    }
}

fn tuition_category(catalog: &PricingCatalog, weeks: u32) -> BreakdownCategory {
    BreakdownCategory::new(
        CostCategory::Tuition,
        vec![BreakdownItem {
            name: "Tuition".to_string(),
            amount: catalog.base_price_per_week.times(weeks),
            unit: Some(ItemUnit::PerWeek {
                rate: catalog.base_price_per_week,
                weeks,
            }),
        }],
    )
}

fn accommodation_category(
    catalog: &PricingCatalog,
    accommodation_type: AccommodationType,
    weeks: u32,
) -> BreakdownCategory {
    let items = match accommodation_type {
        AccommodationType::None => Vec::new(),
        other => {
            let rate = catalog.accommodation.weekly_rate(other);
            vec![BreakdownItem {
                name: other.label().to_string(),
                amount: rate.times(weeks),
                unit: Some(ItemUnit::PerWeek { rate, weeks }),
            }]
        }
    };
    BreakdownCategory::new(CostCategory::Accommodation, items)
}

fn fees_category(catalog: &PricingCatalog) -> BreakdownCategory {
    let items = catalog
        .fixed_fees
        .entries()
        .into_iter()
        .filter(|(_, amount)| *amount != Money::ZERO)
        .map(|(name, amount)| BreakdownItem {
            name: name.to_string(),
            amount,
            unit: None,
        })
        .collect();
    BreakdownCategory::new(CostCategory::Fees, items)
}

fn options_category(
    catalog: &PricingCatalog,
    selection: &Selection,
    weeks: u32,
) -> BreakdownCategory {
    let items = catalog
        .options
        .iter()
        .filter(|option| selection.options.contains(&option.key))
        .map(|option| BreakdownItem {
            name: option.name.clone(),
            amount: option.pricing.price_for(weeks),
            unit: match option.pricing {
                OptionPricing::Flat(_) => None,
                OptionPricing::PerWeek(rate) => Some(ItemUnit::PerWeek { rate, weeks }),
            },
        })
        .collect();
    BreakdownCategory::new(CostCategory::Options, items)
}
