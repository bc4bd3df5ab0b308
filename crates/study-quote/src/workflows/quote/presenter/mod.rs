mod display;

pub use display::{
    convert_for_display, format_money, DisplayCategory, DisplayLine, DisplayModel, Locale,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::calculator::CalculationResult;
use super::domain::{CurrencyCode, QuoteId, Selection};
use super::repository::{QuoteStore, SaveQuoteRequest, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub locale: Locale,
    pub home_currency: CurrencyCode,
    pub quote_validity_days: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            locale: Locale::Ja,
            home_currency: CurrencyCode::Jpy,
            quote_validity_days: 30,
        }
    }
}

/// Save progress for one wizard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    InFlight,
    Saved {
        quote_id: QuoteId,
        valid_until: NaiveDate,
    },
    Failed {
        notice: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSubmission {
    state: SubmissionState,
}

impl Default for QuoteSubmission {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteSubmission {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// The submit control stays disabled while this is true.
    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SubmissionState::InFlight)
    }

    pub fn quote_id(&self) -> Option<&QuoteId> {
        match &self.state {
            SubmissionState::Saved { quote_id, .. } => Some(quote_id),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Failed { notice } => Some(notice),
            _ => None,
        }
    }

    pub fn dismiss_notice(&mut self) {
        if matches!(self.state, SubmissionState::Failed { .. }) {
            self.state = SubmissionState::Idle;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved {
        quote_id: QuoteId,
        valid_until: NaiveDate,
    },
    AlreadySaved {
        quote_id: QuoteId,
    },
    InFlight,
    Failed {
        error: StoreError,
        notice: String,
    },
}

/// Formats results for display and forwards save requests to the store.
pub struct ResultPresenter<S> {
    store: Arc<S>,
    config: DisplayConfig,
}

impl<S> ResultPresenter<S>
where
    S: QuoteStore + 'static,
{
    pub fn new(store: Arc<S>, config: DisplayConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn present(&self, result: &CalculationResult, selection: &Selection) -> DisplayModel {
        display::render(result, selection, &self.config)
    }

    /// Persist a result once. Later calls after a success are answered locally,
    /// and a failure leaves the result untouched for a manual retry. If the
    /// returned future is dropped before the store answers, the submission goes
    /// back to idle.
    pub async fn save(
        &self,
        submission: &mut QuoteSubmission,
        result: &CalculationResult,
        selection: &Selection,
        today: NaiveDate,
    ) -> SaveOutcome {
        match &submission.state {
            SubmissionState::Saved { quote_id, .. } => {
                return SaveOutcome::AlreadySaved {
                    quote_id: quote_id.clone(),
                }
            }
            SubmissionState::InFlight => return SaveOutcome::InFlight,
            SubmissionState::Idle | SubmissionState::Failed { .. } => {}
        }

        let in_flight = InFlight::begin(submission);
        match self.persist(result, selection, today).await {
            Ok((quote_id, valid_until)) => {
                in_flight.finish(SubmissionState::Saved {
                    quote_id: quote_id.clone(),
                    valid_until,
                });
                SaveOutcome::Saved {
                    quote_id,
                    valid_until,
                }
            }
            Err(error) => {
                let notice = self.config.locale.save_failed_notice().to_string();
                in_flight.finish(SubmissionState::Failed {
                    notice: notice.clone(),
                });
                SaveOutcome::Failed { error, notice }
            }
        }
    }

    /// Send one save request without session bookkeeping. Returns the stored
    /// quote id and the stamped expiry date.
    pub async fn persist(
        &self,
        result: &CalculationResult,
        selection: &Selection,
        today: NaiveDate,
    ) -> Result<(QuoteId, NaiveDate), StoreError> {
        let request =
            SaveQuoteRequest::new(result, selection, today, self.config.quote_validity_days);

        match self.store.save(&request).await {
            Ok(quote_id) => {
                info!(
                    %quote_id,
                    school_id = %request.school_id,
                    total = request.total_amount.minor_units(),
                    "quote saved"
                );
                Ok((quote_id, request.valid_until))
            }
            Err(error) => {
                warn!(school_id = %request.school_id, %error, "quote save failed");
                Err(error)
            }
        }
    }
}

/// Holds a submission in `InFlight` for the length of one store call.
struct InFlight<'a> {
    submission: &'a mut QuoteSubmission,
}

impl<'a> InFlight<'a> {
    fn begin(submission: &'a mut QuoteSubmission) -> Self {
        submission.state = SubmissionState::InFlight;
        Self { submission }
    }

    fn finish(self, state: SubmissionState) {
        self.submission.state = state;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if matches!(self.submission.state, SubmissionState::InFlight) {
            self.submission.state = SubmissionState::Idle;
        }
    }
}
