use super::{AccommodationRates, FixedFees, OptionDefinition, OptionPricing, PricingCatalog};
use crate::workflows::quote::domain::{CatalogIssue, CurrencyCode, Money, OptionKey, SchoolId};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum CatalogImportError {
    #[error("failed to read catalog csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog csv line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
    #[error("catalog for '{school_id}' is invalid: {issue}")]
    Catalog {
        school_id: SchoolId,
        issue: CatalogIssue,
    },
}

pub(super) fn parse_catalogs<R: Read>(reader: R) -> Result<Vec<PricingCatalog>, CatalogImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut catalogs = Vec::new();

    for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
        let row = record?;
        // header occupies line 1
        let line = index + 2;
        catalogs.push(row.into_catalog(line)?);
    }

    Ok(catalogs)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    school_id: String,
    school_name: String,
    currency: String,
    exchange_rate: String,
    tuition_per_week: i64,
    homestay_per_week: i64,
    dormitory_per_week: i64,
    apartment_per_week: i64,
    registration_fee: i64,
    materials_fee: i64,
    technology_fee: i64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    options: Option<String>,
}

impl CatalogRow {
    fn into_catalog(self, line: usize) -> Result<PricingCatalog, CatalogImportError> {
        let invalid = |reason: String| CatalogImportError::InvalidRow { line, reason };

        if self.school_id.is_empty() {
            return Err(invalid("school_id is empty".to_string()));
        }

        let currency = CurrencyCode::parse(&self.currency)
            .ok_or_else(|| invalid(format!("unsupported currency '{}'", self.currency)))?;
        let exchange_rate = Decimal::from_str(self.exchange_rate.trim()).map_err(|err| {
            invalid(format!(
                "exchange_rate '{}' is not a decimal ({err})",
                self.exchange_rate
            ))
        })?;
        let options = match self.options.as_deref() {
            Some(raw) => parse_options(raw).map_err(invalid)?,
            None => Vec::new(),
        };

        Ok(PricingCatalog {
            school_id: SchoolId::new(self.school_id),
            school_name: self.school_name,
            base_price_per_week: Money(self.tuition_per_week),
            accommodation: AccommodationRates {
                homestay: Money(self.homestay_per_week),
                dormitory: Money(self.dormitory_per_week),
                apartment: Money(self.apartment_per_week),
            },
            fixed_fees: FixedFees {
                registration: Money(self.registration_fee),
                materials: Money(self.materials_fee),
                technology: Money(self.technology_fee),
            },
            options,
            currency,
            exchange_rate,
        })
    }
}

/// Entries look like `airport_pickup:Airport pickup:flat:20000`, separated by `;`.
fn parse_options(raw: &str) -> Result<Vec<OptionDefinition>, String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_option)
        .collect()
}

fn parse_option(entry: &str) -> Result<OptionDefinition, String> {
    let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
    let [key, name, kind, amount] = parts.as_slice() else {
        return Err(format!(
            "option '{entry}' must have the form key:name:flat|weekly:amount"
        ));
    };

    let amount = amount
        .parse::<i64>()
        .map(Money)
        .map_err(|_| format!("option '{key}' amount '{amount}' is not an integer"))?;
    let pricing = match kind.to_ascii_lowercase().as_str() {
        "flat" => OptionPricing::Flat(amount),
        "weekly" | "per_week" => OptionPricing::PerWeek(amount),
        other => return Err(format!("option '{key}' has unknown pricing kind '{other}'")),
    };

    Ok(OptionDefinition {
        key: OptionKey::new(*key),
        name: (*name).to_string(),
        pricing,
    })
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
