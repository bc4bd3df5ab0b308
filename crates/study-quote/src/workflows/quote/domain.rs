use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

pub const MIN_WEEKS: u32 = 1;
pub const MAX_WEEKS: u32 = 52;

/// Amount of money expressed in integer minor units of its currency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn times(self, weeks: u32) -> Money {
        Money(self.0 * i64::from(weeks))
    }

    pub fn checked_times(self, weeks: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(weeks)).map(Money)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Floor of `self * bps / 10_000`.
    pub fn percent_bps(self, bps: u32) -> Money {
        let scaled = i128::from(self.0) * i128::from(bps) / 10_000;
        Money(scaled as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Jpy,
    Usd,
    Aud,
    Cad,
    Gbp,
    Nzd,
    Eur,
}

impl CurrencyCode {
    /// Number of decimal places between the major and minor unit.
    pub const fn exponent(self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Jpy => "¥",
            Self::Usd => "$",
            Self::Aud => "A$",
            Self::Cad => "C$",
            Self::Gbp => "£",
            Self::Nzd => "NZ$",
            Self::Eur => "€",
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Jpy => "JPY",
            Self::Usd => "USD",
            Self::Aud => "AUD",
            Self::Cad => "CAD",
            Self::Gbp => "GBP",
            Self::Nzd => "NZD",
            Self::Eur => "EUR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "JPY" => Some(Self::Jpy),
            "USD" => Some(Self::Usd),
            "AUD" => Some(Self::Aud),
            "CAD" => Some(Self::Cad),
            "GBP" => Some(Self::Gbp),
            "NZD" => Some(Self::Nzd),
            "EUR" => Some(Self::Eur),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccommodationType {
    Homestay,
    Dormitory,
    Apartment,
    None,
}

impl AccommodationType {
    pub const fn ordered() -> [Self; 4] {
        [Self::Homestay, Self::Dormitory, Self::Apartment, Self::None]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Homestay => "Homestay",
            Self::Dormitory => "Dormitory",
            Self::Apartment => "Apartment",
            Self::None => "No accommodation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "homestay" => Some(Self::Homestay),
            "dormitory" | "dorm" => Some(Self::Dormitory),
            "apartment" => Some(Self::Apartment),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionKey(pub String);

impl OptionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolId(pub String);

impl SchoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier handed back by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub String);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Choices accumulated by the wizard (or supplied in one shot by the estimator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub weeks: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub accommodation_type: Option<AccommodationType>,
    #[serde(default)]
    pub options: BTreeSet<OptionKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Weeks and accommodation are the only fields calculation cannot run without.
    pub fn priced_fields(&self) -> Result<(u32, AccommodationType), SelectionIssue> {
        let weeks = self.weeks.ok_or(SelectionIssue::MissingWeeks)?;
        let weeks = validate_weeks(weeks)?;
        let accommodation = self
            .accommodation_type
            .ok_or(SelectionIssue::MissingAccommodation)?;
        Ok((weeks, accommodation))
    }
}

pub fn validate_weeks(weeks: u32) -> Result<u32, SelectionIssue> {
    if (MIN_WEEKS..=MAX_WEEKS).contains(&weeks) {
        Ok(weeks)
    } else {
        Err(SelectionIssue::WeeksOutOfRange(weeks))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionIssue {
    #[error("program length is required")]
    MissingWeeks,
    #[error("program length must be between 1 and 52 weeks (got {0})")]
    WeeksOutOfRange(u32),
    #[error("start date is required")]
    MissingStartDate,
    #[error("start date must be on or after {earliest}")]
    StartDateTooEarly { earliest: NaiveDate },
    #[error("start date must be on or before {latest}")]
    StartDateTooLate { latest: NaiveDate },
    #[error("accommodation type is required")]
    MissingAccommodation,
    #[error("option '{0}' is not offered by this program")]
    UnknownOption(OptionKey),
    #[error("contact e-mail is required")]
    MissingEmail,
    #[error("'{0}' is not a valid e-mail address")]
    MalformedEmail(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogIssue {
    #[error("{field} must not be negative")]
    NegativeRate { field: String },
    #[error("exchange rate must be greater than zero")]
    NonPositiveExchangeRate,
    #[error("option '{0}' is defined more than once")]
    DuplicateOption(OptionKey),
    #[error("rates are too large to price a 52-week program")]
    AmountOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] SelectionIssue),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(#[from] CatalogIssue),
}
