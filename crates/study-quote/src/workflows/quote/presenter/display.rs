use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::DisplayConfig;
use crate::workflows::quote::calculator::{BreakdownItem, CalculationResult, ItemUnit};
use crate::workflows::quote::domain::{CurrencyCode, Money, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ja,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Some(Self::En),
            "ja" | "ja-jp" | "ja_jp" => Some(Self::Ja),
            _ => None,
        }
    }

    pub fn format_date(self, date: NaiveDate) -> String {
        match self {
            Self::En => date.format("%B %-d, %Y").to_string(),
            Self::Ja => date.format("%Y年%-m月%-d日").to_string(),
        }
    }

    pub fn weeks_label(self, weeks: u32) -> String {
        match self {
            Self::En if weeks == 1 => "1 week".to_string(),
            Self::En => format!("{weeks} weeks"),
            Self::Ja => format!("{weeks}週間"),
        }
    }

    pub(super) fn save_failed_notice(self) -> &'static str {
        match self {
            Self::En => "We couldn't save your quote. Please try again.",
            Self::Ja => "見積もりを保存できませんでした。もう一度お試しください。",
        }
    }
}

/// Symbol, thousands separators, and the currency's minor digits.
pub fn format_money(amount: Money, currency: CurrencyCode) -> String {
    let exponent = currency.exponent();
    let divisor = 10u64.pow(exponent);
    let absolute = amount.minor_units().unsigned_abs();
    let major = group_thousands(absolute / divisor);
    let sign = if amount.is_negative() { "-" } else { "" };

    if exponent == 0 {
        format!("{sign}{}{major}", currency.symbol())
    } else {
        let minor = absolute % divisor;
        format!(
            "{sign}{}{major}.{minor:0width$}",
            currency.symbol(),
            width = exponent as usize
        )
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Converts a display amount only; totals on the result are never touched.
pub fn convert_for_display(
    amount: Money,
    from: CurrencyCode,
    rate: Decimal,
    to: CurrencyCode,
) -> Option<Money> {
    let major = Decimal::new(amount.minor_units(), from.exponent());
    let converted = major
        .checked_mul(rate)?
        .round_dp_with_strategy(to.exponent(), RoundingStrategy::MidpointNearestEven);
    let minor = converted.checked_mul(Decimal::from(10i64.pow(to.exponent())))?;
    minor.to_i64().map(Money)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayLine {
    pub name: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayCategory {
    pub label: String,
    pub items: Vec<DisplayLine>,
    pub subtotal: String,
}

/// Display-ready rendering of a [`CalculationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayModel {
    pub school_id: String,
    pub currency: CurrencyCode,
    pub weeks_label: String,
    pub accommodation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    pub categories: Vec<DisplayCategory>,
    pub subtotal: String,
    pub discounts: Vec<DisplayLine>,
    pub discount_total: String,
    pub total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_currency_total: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_note: Option<String>,
}

pub(super) fn render(
    result: &CalculationResult,
    selection: &Selection,
    config: &DisplayConfig,
) -> DisplayModel {
    let currency = result.currency();
    let locale = config.locale;
    let money = |amount: Money| format_money(amount, currency);

    let categories = result
        .breakdown()
        .iter()
        .map(|category| DisplayCategory {
            label: category.category.label().to_string(),
            items: category
                .items
                .iter()
                .map(|item| item_line(item, currency, locale))
                .collect(),
            subtotal: money(category.subtotal),
        })
        .collect();

    let discounts = result
        .applied_discounts()
        .iter()
        .map(|discount| DisplayLine {
            name: discount.kind.label().to_string(),
            amount: format!("-{}", money(discount.amount)),
            detail: Some(discount.notes.clone()),
        })
        .collect();

    let (home_currency_total, exchange_note) = if currency == config.home_currency {
        (None, None)
    } else {
        let converted = convert_for_display(
            result.total(),
            currency,
            result.exchange_rate(),
            config.home_currency,
        )
        .map(|amount| format!("≈ {}", format_money(amount, config.home_currency)));
        let note = format!(
            "1 {} = {} {}",
            currency,
            result.exchange_rate().normalize(),
            config.home_currency
        );
        (converted, Some(note))
    };

    DisplayModel {
        school_id: result.school_id().to_string(),
        currency,
        weeks_label: locale.weeks_label(result.weeks()),
        accommodation: result.accommodation_type().label().to_string(),
        start_date: selection.start_date.map(|date| locale.format_date(date)),
        categories,
        subtotal: money(result.subtotal()),
        discounts,
        discount_total: money(result.discounts()),
        total: money(result.total()),
        home_currency_total,
        exchange_note,
    }
}

fn item_line(item: &BreakdownItem, currency: CurrencyCode, locale: Locale) -> DisplayLine {
    let detail = item.unit.map(|unit| match unit {
        ItemUnit::PerWeek { rate, weeks } => format!(
            "{} × {}",
            format_money(rate, currency),
            locale.weeks_label(weeks)
        ),
    });

    DisplayLine {
        name: item.name.clone(),
        amount: format_money(item.amount, currency),
        detail,
    }
}
