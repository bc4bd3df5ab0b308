//! Study-abroad quote engine: catalogs, pricing, discounts, the step-by-step
//! wizard, result presentation, and the persistence boundary.

pub mod calculator;
pub mod catalog;
pub mod discount;
pub mod domain;
pub mod presenter;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use calculator::{
    BreakdownCategory, BreakdownItem, CalculationResult, CostCategory, ItemUnit, PricingCalculator,
};
pub use catalog::{
    AccommodationRates, CatalogDirectory, CatalogImportError, FixedFees, OptionDefinition,
    OptionPricing, PricingCatalog, HARBOUR_ID, MAPLE_LEAF_ID,
};
pub use discount::{
    AppliedDiscount, DiscountConfig, DiscountKind, DiscountOutcome, DiscountPolicy, DiscountRule,
    EarlyBookingRule,
};
pub use domain::{
    AccommodationType, CatalogIssue, Contact, CurrencyCode, Money, OptionKey, QuoteError, QuoteId,
    SchoolId, Selection, SelectionIssue, MAX_WEEKS, MIN_WEEKS,
};
pub use presenter::{
    format_money, DisplayConfig, DisplayModel, Locale, QuoteSubmission, ResultPresenter,
    SaveOutcome, SubmissionState,
};
pub use repository::{QuoteStore, SaveQuoteRequest, StoreError};
pub use router::quote_router;
pub use service::{
    business_clock, default_business_offset, Clock, Estimate, EstimateRequest, QuoteService,
    QuoteServiceError, SavedQuote, DEFAULT_UTC_OFFSET_MINUTES,
};
pub use store::{HttpQuoteStore, RetryPolicy, RetryingStore};
pub use wizard::{
    DurationPreset, QuoteWizard, StartDatePreset, StepInput, StepRejection, WizardEnv, WizardStep,
};
