mod parser;
mod standard;

pub use parser::CatalogImportError;
pub use standard::{HARBOUR_ID, MAPLE_LEAF_ID};

use super::domain::{
    AccommodationType, CatalogIssue, CurrencyCode, Money, OptionKey, SchoolId, MAX_WEEKS,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// Weekly accommodation rates by type. `none` is always free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccommodationRates {
    pub homestay: Money,
    pub dormitory: Money,
    pub apartment: Money,
}

impl AccommodationRates {
    pub fn weekly_rate(&self, accommodation: AccommodationType) -> Money {
        match accommodation {
            AccommodationType::Homestay => self.homestay,
            AccommodationType::Dormitory => self.dormitory,
            AccommodationType::Apartment => self.apartment,
            AccommodationType::None => Money::ZERO,
        }
    }
}

/// One-time fees charged regardless of program length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedFees {
    pub registration: Money,
    pub materials: Money,
    pub technology: Money,
}

impl FixedFees {
    pub fn entries(&self) -> [(&'static str, Money); 3] {
        [
            ("Registration fee", self.registration),
            ("Materials fee", self.materials),
            ("Technology fee", self.technology),
        ]
    }

    pub fn total(&self) -> Money {
        self.entries().iter().map(|(_, amount)| *amount).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum OptionPricing {
    Flat(Money),
    PerWeek(Money),
}

impl OptionPricing {
    pub fn rate(self) -> Money {
        match self {
            Self::Flat(amount) | Self::PerWeek(amount) => amount,
        }
    }

    pub fn price_for(self, weeks: u32) -> Money {
        match self {
            Self::Flat(amount) => amount,
            Self::PerWeek(rate) => rate.times(weeks),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub key: OptionKey,
    pub name: String,
    pub pricing: OptionPricing,
}

/// Pricing table for a single program, treated as read-only input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingCatalog {
    pub school_id: SchoolId,
    pub school_name: String,
    pub base_price_per_week: Money,
    pub accommodation: AccommodationRates,
    pub fixed_fees: FixedFees,
    pub options: Vec<OptionDefinition>,
    pub currency: CurrencyCode,
    /// Units of the home currency per one unit of `currency`.
    pub exchange_rate: Decimal,
}

impl PricingCatalog {
    pub fn validate(&self) -> Result<(), CatalogIssue> {
        let mut rates = vec![
            ("base price per week".to_string(), self.base_price_per_week),
            ("homestay rate".to_string(), self.accommodation.homestay),
            ("dormitory rate".to_string(), self.accommodation.dormitory),
            ("apartment rate".to_string(), self.accommodation.apartment),
            ("registration fee".to_string(), self.fixed_fees.registration),
            ("materials fee".to_string(), self.fixed_fees.materials),
            ("technology fee".to_string(), self.fixed_fees.technology),
        ];
        rates.extend(
            self.options
                .iter()
                .map(|option| (format!("option '{}' price", option.key), option.pricing.rate())),
        );

        if let Some((field, _)) = rates.into_iter().find(|(_, amount)| amount.is_negative()) {
            return Err(CatalogIssue::NegativeRate { field });
        }

        if self.exchange_rate <= Decimal::ZERO {
            return Err(CatalogIssue::NonPositiveExchangeRate);
        }

        let mut seen = BTreeSet::new();
        for option in &self.options {
            if !seen.insert(&option.key) {
                return Err(CatalogIssue::DuplicateOption(option.key.clone()));
            }
        }

        self.longest_program_ceiling()
            .ok_or(CatalogIssue::AmountOverflow)?;

        Ok(())
    }

    /// Subtotal of the most expensive selection at the longest duration, or
    /// `None` when it does not fit in `Money`. Every quote priced from a
    /// validated catalog stays at or below this figure.
    fn longest_program_ceiling(&self) -> Option<Money> {
        let accommodation = AccommodationType::ordered()
            .into_iter()
            .map(|kind| self.accommodation.weekly_rate(kind))
            .max()
            .unwrap_or(Money::ZERO);
        let mut ceiling = self
            .base_price_per_week
            .checked_times(MAX_WEEKS)?
            .checked_add(accommodation.checked_times(MAX_WEEKS)?)?;
        for (_, fee) in self.fixed_fees.entries() {
            ceiling = ceiling.checked_add(fee)?;
        }
        for option in &self.options {
            let price = match option.pricing {
                OptionPricing::Flat(amount) => amount,
                OptionPricing::PerWeek(rate) => rate.checked_times(MAX_WEEKS)?,
            };
            ceiling = ceiling.checked_add(price)?;
        }
        Some(ceiling)
    }

    pub fn option(&self, key: &OptionKey) -> Option<&OptionDefinition> {
        self.options.iter().find(|option| &option.key == key)
    }
}

/// Read-only lookup of pricing catalogs by school.
#[derive(Debug, Clone, Default)]
pub struct CatalogDirectory {
    catalogs: BTreeMap<SchoolId, PricingCatalog>,
}

impl CatalogDirectory {
    pub fn standard() -> Self {
        Self::from_catalogs(standard::standard_catalogs())
    }

    pub fn from_catalogs(catalogs: impl IntoIterator<Item = PricingCatalog>) -> Self {
        Self {
            catalogs: catalogs
                .into_iter()
                .map(|catalog| (catalog.school_id.clone(), catalog))
                .collect(),
        }
    }

    /// Import one catalog per CSV row. Every imported catalog is validated.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogImportError> {
        let catalogs = parser::parse_catalogs(reader)?;
        for catalog in &catalogs {
            catalog
                .validate()
                .map_err(|issue| CatalogImportError::Catalog {
                    school_id: catalog.school_id.clone(),
                    issue,
                })?;
        }
        Ok(Self::from_catalogs(catalogs))
    }

    pub fn get(&self, school_id: &SchoolId) -> Option<&PricingCatalog> {
        self.catalogs.get(school_id)
    }

    pub fn catalogs(&self) -> impl Iterator<Item = &PricingCatalog> {
        self.catalogs.values()
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}
