use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::{BreakdownCategory, CalculationResult};
use super::domain::{
    AccommodationType, Contact, CurrencyCode, Money, OptionKey, QuoteId, SchoolId, Selection,
};

/// Body of `POST /quotes` on the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuoteRequest {
    pub school_id: SchoolId,
    pub weeks: u32,
    pub start_date: Option<NaiveDate>,
    pub accommodation_type: AccommodationType,
    pub options: Vec<OptionKey>,
    pub total_amount: Money,
    pub currency: CurrencyCode,
    pub exchange_rate: Decimal,
    pub breakdown: Vec<BreakdownCategory>,
    pub valid_until: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

impl SaveQuoteRequest {
    /// `valid_until` is stamped at save time and is not part of the result itself.
    pub fn new(
        result: &CalculationResult,
        selection: &Selection,
        today: NaiveDate,
        validity_days: u32,
    ) -> Self {
        let valid_until = today
            .checked_add_days(Days::new(u64::from(validity_days)))
            .unwrap_or(NaiveDate::MAX);
        Self {
            school_id: result.school_id().clone(),
            weeks: result.weeks(),
            start_date: selection.start_date,
            accommodation_type: result.accommodation_type(),
            options: selection.options.iter().cloned().collect(),
            total_amount: result.total(),
            currency: result.currency(),
            exchange_rate: result.exchange_rate(),
            breakdown: result.breakdown().to_vec(),
            valid_until,
            contact: selection.contact.clone(),
        }
    }
}

/// Outbound persistence boundary. Implementations perform I/O; the pricing
/// core never does.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn save(&self, request: &SaveQuoteRequest) -> Result<QuoteId, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("quote store did not respond in time")]
    Timeout,
    #[error("quote store unreachable: {0}")]
    Transport(String),
    #[error("quote store failed with status {status}")]
    Server { status: u16 },
    #[error("quote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::Rejected { .. })
    }
}
