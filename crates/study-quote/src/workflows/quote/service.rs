use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::calculator::{CalculationResult, PricingCalculator};
use super::catalog::{CatalogDirectory, PricingCatalog};
use super::discount::{DiscountConfig, DiscountPolicy};
use super::domain::{
    AccommodationType, OptionKey, QuoteError, QuoteId, SchoolId, Selection,
};
use super::presenter::{
    DisplayConfig, DisplayModel, QuoteSubmission, ResultPresenter, SaveOutcome,
};
use super::repository::{QuoteStore, StoreError};
use super::wizard::{validate_contact, validate_start_date, WizardEnv};

/// One-shot estimator input: no step machine, same pricing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub school_id: SchoolId,
    pub weeks: u32,
    pub accommodation_type: AccommodationType,
    #[serde(default)]
    pub options: BTreeSet<OptionKey>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

impl EstimateRequest {
    pub fn selection(&self) -> Selection {
        Selection {
            weeks: Some(self.weeks),
            start_date: self.start_date,
            accommodation_type: Some(self.accommodation_type),
            options: self.options.clone(),
            contact: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    pub result: CalculationResult,
    pub display: DisplayModel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuote {
    pub quote_id: QuoteId,
    pub valid_until: NaiveDate,
    pub display: DisplayModel,
}

/// Source of "today" for date-relative rules.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Offset of the agency's business day from UTC (JST).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 9 * 60;

/// Calendar date at a fixed UTC offset. The HTTP service and the CLI both
/// read "today" through this so early-booking lead times agree.
pub fn business_clock(offset: FixedOffset) -> Clock {
    Arc::new(move || Utc::now().with_timezone(&offset).date_naive())
}

pub fn default_business_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix())
}

/// Service composing the catalog directory, calculator, and presenter.
pub struct QuoteService<S> {
    catalogs: Arc<CatalogDirectory>,
    calculator: Arc<PricingCalculator>,
    presenter: Arc<ResultPresenter<S>>,
    clock: Clock,
}

impl<S> QuoteService<S>
where
    S: QuoteStore + 'static,
{
    pub fn new(
        catalogs: CatalogDirectory,
        discounts: DiscountConfig,
        store: Arc<S>,
        display: DisplayConfig,
    ) -> Self {
        Self {
            catalogs: Arc::new(catalogs),
            calculator: Arc::new(PricingCalculator::new(DiscountPolicy::new(discounts))),
            presenter: Arc::new(ResultPresenter::new(store, display)),
            clock: business_clock(default_business_offset()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Programs offered, ordered by school id.
    pub fn schools(&self) -> Vec<&PricingCatalog> {
        self.catalogs.catalogs().collect()
    }

    pub fn catalogs(&self) -> &CatalogDirectory {
        &self.catalogs
    }

    pub fn calculator(&self) -> &PricingCalculator {
        &self.calculator
    }

    pub fn presenter(&self) -> &ResultPresenter<S> {
        &self.presenter
    }

    pub fn catalog(&self, school_id: &SchoolId) -> Result<&PricingCatalog, QuoteServiceError> {
        self.catalogs
            .get(school_id)
            .ok_or_else(|| QuoteServiceError::UnknownSchool(school_id.clone()))
    }

    pub fn wizard_env(
        &self,
        school_id: &SchoolId,
        today: NaiveDate,
    ) -> Result<WizardEnv<'_>, QuoteServiceError> {
        Ok(WizardEnv {
            catalog: self.catalog(school_id)?,
            calculator: &self.calculator,
            today,
        })
    }

    pub fn calculate(
        &self,
        school_id: &SchoolId,
        selection: &Selection,
        today: NaiveDate,
    ) -> Result<CalculationResult, QuoteServiceError> {
        let catalog = self.catalog(school_id)?;
        let result = self.calculator.calculate(catalog, selection, today)?;
        debug!(
            %school_id,
            weeks = result.weeks(),
            subtotal = result.subtotal().minor_units(),
            discounts = result.discounts().minor_units(),
            total = result.total().minor_units(),
            "quote calculated"
        );
        Ok(result)
    }

    pub fn estimate(
        &self,
        request: &EstimateRequest,
        today: NaiveDate,
    ) -> Result<Estimate, QuoteServiceError> {
        let selection = request.selection();
        screen_optional_fields(&selection, today)?;
        let result = self.calculate(&request.school_id, &selection, today)?;
        let display = self.presenter.present(&result, &selection);
        Ok(Estimate { result, display })
    }

    pub fn present(&self, result: &CalculationResult, selection: &Selection) -> DisplayModel {
        self.presenter.present(result, selection)
    }

    pub async fn save(
        &self,
        submission: &mut QuoteSubmission,
        result: &CalculationResult,
        selection: &Selection,
        today: NaiveDate,
    ) -> SaveOutcome {
        self.presenter
            .save(submission, result, selection, today)
            .await
    }

    /// Calculate and persist in one call, for callers without a wizard session.
    pub async fn save_selection(
        &self,
        school_id: &SchoolId,
        selection: &Selection,
        today: NaiveDate,
    ) -> Result<SavedQuote, QuoteServiceError> {
        screen_optional_fields(selection, today)?;
        let result = self.calculate(school_id, selection, today)?;
        let (quote_id, valid_until) = self
            .presenter
            .persist(&result, selection, today)
            .await
            .map_err(QuoteServiceError::Persistence)?;

        Ok(SavedQuote {
            quote_id,
            valid_until,
            display: self.present(&result, selection),
        })
    }
}

/// The calculator ignores the start-date window and the contact, so one-shot
/// callers check them here the way the wizard does step by step.
fn screen_optional_fields(selection: &Selection, today: NaiveDate) -> Result<(), QuoteError> {
    if let Some(start_date) = selection.start_date {
        validate_start_date(start_date, today)?;
    }
    if let Some(contact) = &selection.contact {
        validate_contact(contact)?;
    }
    Ok(())
}

/// Error raised by the quote service.
#[derive(Debug, thiserror::Error)]
pub enum QuoteServiceError {
    #[error("unknown school '{0}'")]
    UnknownSchool(SchoolId),
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error("failed to persist quote: {0}")]
    Persistence(StoreError),
}
