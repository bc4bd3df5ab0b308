use super::{AccommodationRates, FixedFees, OptionDefinition, OptionPricing, PricingCatalog};
use crate::workflows::quote::domain::{CurrencyCode, Money, OptionKey, SchoolId};
use rust_decimal::Decimal;

pub const MAPLE_LEAF_ID: &str = "maple-leaf-vancouver";
pub const HARBOUR_ID: &str = "harbour-english-sydney";

pub(super) fn standard_catalogs() -> Vec<PricingCatalog> {
    vec![maple_leaf_vancouver(), harbour_english_sydney()]
}

/// Agency package priced directly in yen.
fn maple_leaf_vancouver() -> PricingCatalog {
    PricingCatalog {
        school_id: SchoolId::new(MAPLE_LEAF_ID),
        school_name: "Maple Leaf Language Institute (Vancouver)".to_string(),
        base_price_per_week: Money(50_000),
        accommodation: AccommodationRates {
            homestay: Money(80_000),
            dormitory: Money(60_000),
            apartment: Money(95_000),
        },
        fixed_fees: FixedFees {
            registration: Money(30_000),
            materials: Money(15_000),
            technology: Money(5_000),
        },
        options: vec![
            OptionDefinition {
                key: OptionKey::new("airport_pickup"),
                name: "Airport pickup".to_string(),
                pricing: OptionPricing::Flat(Money(20_000)),
            },
            OptionDefinition {
                key: OptionKey::new("travel_insurance"),
                name: "Travel insurance".to_string(),
                pricing: OptionPricing::PerWeek(Money(3_000)),
            },
            OptionDefinition {
                key: OptionKey::new("private_lessons"),
                name: "Private lessons (5 per week)".to_string(),
                pricing: OptionPricing::PerWeek(Money(25_000)),
            },
            OptionDefinition {
                key: OptionKey::new("exam_preparation"),
                name: "IELTS exam preparation".to_string(),
                pricing: OptionPricing::Flat(Money(40_000)),
            },
        ],
        currency: CurrencyCode::Jpy,
        exchange_rate: Decimal::ONE,
    }
}

/// School price list in Australian cents, converted to yen for display only.
fn harbour_english_sydney() -> PricingCatalog {
    PricingCatalog {
        school_id: SchoolId::new(HARBOUR_ID),
        school_name: "Harbour English College (Sydney)".to_string(),
        base_price_per_week: Money(42_000),
        accommodation: AccommodationRates {
            homestay: Money(35_000),
            dormitory: Money(30_000),
            apartment: Money(45_000),
        },
        fixed_fees: FixedFees {
            registration: Money(25_000),
            materials: Money(15_000),
            technology: Money(0),
        },
        options: vec![
            OptionDefinition {
                key: OptionKey::new("airport_pickup"),
                name: "Airport pickup".to_string(),
                pricing: OptionPricing::Flat(Money(16_000)),
            },
            OptionDefinition {
                key: OptionKey::new("health_cover"),
                name: "Overseas student health cover".to_string(),
                pricing: OptionPricing::PerWeek(Money(1_500)),
            },
        ],
        currency: CurrencyCode::Aud,
        exchange_rate: Decimal::new(9840, 2),
    }
}
