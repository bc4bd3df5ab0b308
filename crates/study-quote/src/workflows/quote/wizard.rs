use super::calculator::{CalculationResult, PricingCalculator};
use super::catalog::PricingCatalog;
use super::domain::{
    validate_weeks, AccommodationType, Contact, OptionKey, QuoteError, Selection, SelectionIssue,
};
use chrono::{Duration, Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Duration,
    StartDate,
    Accommodation,
    Contact,
    Result,
}

impl WizardStep {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Duration,
            Self::StartDate,
            Self::Accommodation,
            Self::Contact,
            Self::Result,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Duration => "Program length",
            Self::StartDate => "Start date",
            Self::Accommodation => "Accommodation & options",
            Self::Contact => "Contact details",
            Self::Result => "Your estimate",
        }
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Duration => 1,
            Self::StartDate => 2,
            Self::Accommodation => 3,
            Self::Contact => 4,
            Self::Result => 5,
        }
    }

    const fn following(self) -> Self {
        match self {
            Self::Duration => Self::StartDate,
            Self::StartDate => Self::Accommodation,
            Self::Accommodation => Self::Contact,
            Self::Contact | Self::Result => Self::Result,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Duration => None,
            Self::StartDate => Some(Self::Duration),
            Self::Accommodation => Some(Self::StartDate),
            Self::Contact => Some(Self::Accommodation),
            Self::Result => Some(Self::Contact),
        }
    }
}

/// Data a single step contributes to the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepInput {
    Duration {
        weeks: u32,
    },
    StartDate {
        start_date: NaiveDate,
    },
    Accommodation {
        accommodation_type: AccommodationType,
        #[serde(default)]
        options: BTreeSet<OptionKey>,
    },
    Contact(Contact),
}

impl StepInput {
    pub const fn step(&self) -> WizardStep {
        match self {
            Self::Duration { .. } => WizardStep::Duration,
            Self::StartDate { .. } => WizardStep::StartDate,
            Self::Accommodation { .. } => WizardStep::Accommodation,
            Self::Contact(_) => WizardStep::Contact,
        }
    }
}

/// Quick-pick program lengths shown next to the weeks slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPreset {
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
}

impl DurationPreset {
    pub const fn all() -> [Self; 4] {
        [
            Self::OneMonth,
            Self::ThreeMonths,
            Self::SixMonths,
            Self::TwelveMonths,
        ]
    }

    pub const fn months(self) -> u32 {
        match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::TwelveMonths => 12,
        }
    }

    /// `months * 52 / 12`, rounded to the nearest week.
    pub const fn weeks(self) -> u32 {
        (self.months() * 52 + 6) / 12
    }
}

/// Quick-pick start dates relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartDatePreset {
    InOneMonth,
    InTwoMonths,
    InThreeMonths,
    InSixMonths,
}

impl StartDatePreset {
    pub const fn all() -> [Self; 4] {
        [
            Self::InOneMonth,
            Self::InTwoMonths,
            Self::InThreeMonths,
            Self::InSixMonths,
        ]
    }

    pub const fn months(self) -> u32 {
        match self {
            Self::InOneMonth => 1,
            Self::InTwoMonths => 2,
            Self::InThreeMonths => 3,
            Self::InSixMonths => 6,
        }
    }

    pub fn resolve(self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_months(Months::new(self.months()))
    }
}

/// Earliest (tomorrow) and latest (twelve months out) acceptable start dates.
pub fn start_date_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let earliest = today + Duration::days(1);
    let latest = today
        .checked_add_months(Months::new(12))
        .unwrap_or(NaiveDate::MAX);
    (earliest, latest)
}

pub fn validate_start_date(
    start_date: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, SelectionIssue> {
    let (earliest, latest) = start_date_window(today);
    if start_date < earliest {
        return Err(SelectionIssue::StartDateTooEarly { earliest });
    }
    if start_date > latest {
        return Err(SelectionIssue::StartDateTooLate { latest });
    }
    Ok(start_date)
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
    })
}

pub fn validate_contact(contact: &Contact) -> Result<(), SelectionIssue> {
    let email = contact.email.trim();
    if email.is_empty() {
        return Err(SelectionIssue::MissingEmail);
    }
    if !email_pattern().is_match(email) {
        return Err(SelectionIssue::MalformedEmail(email.to_string()));
    }
    Ok(())
}

/// Read-only collaborators a wizard transition may consult.
#[derive(Debug, Clone, Copy)]
pub struct WizardEnv<'a> {
    pub catalog: &'a PricingCatalog,
    pub calculator: &'a PricingCalculator,
    pub today: NaiveDate,
}

/// Why a transition was refused. The UI is expected to have disabled the
/// control already, so these never escalate past the wizard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepRejection {
    #[error("{received:?} input does not belong to the {current:?} step")]
    WrongStep {
        current: WizardStep,
        received: WizardStep,
    },
    #[error(transparent)]
    Invalid(#[from] SelectionIssue),
    #[error("already at the first step")]
    AtFirstStep,
    #[error("the {0:?} step cannot be skipped")]
    SkipNotAllowed(WizardStep),
    #[error("the estimate is complete; start over to change it")]
    Finished,
    #[error(transparent)]
    Calculation(QuoteError),
}

/// Multi-step quote flow. Every transition returns a new wizard and leaves the
/// receiver untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteWizard {
    step: WizardStep,
    selection: Selection,
    result: Option<CalculationResult>,
}

impl Default for QuoteWizard {
    fn default() -> Self {
        Self::start()
    }
}

impl QuoteWizard {
    pub fn start() -> Self {
        Self {
            step: WizardStep::Duration,
            selection: Selection::empty(),
            result: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        self.result.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.step == WizardStep::Result
    }

    /// Previously entered data for the current step, used to prefill the form.
    pub fn draft(&self) -> Option<StepInput> {
        let selection = &self.selection;
        match self.step {
            WizardStep::Duration => selection.weeks.map(|weeks| StepInput::Duration { weeks }),
            WizardStep::StartDate => selection
                .start_date
                .map(|start_date| StepInput::StartDate { start_date }),
            WizardStep::Accommodation => {
                selection
                    .accommodation_type
                    .map(|accommodation_type| StepInput::Accommodation {
                        accommodation_type,
                        options: selection.options.clone(),
                    })
            }
            WizardStep::Contact => selection.contact.clone().map(StepInput::Contact),
            WizardStep::Result => None,
        }
    }

    /// Checks only the fields owned by the current step.
    pub fn validate(&self, input: &StepInput, env: &WizardEnv<'_>) -> Result<(), StepRejection> {
        if self.step == WizardStep::Result {
            return Err(StepRejection::Finished);
        }
        if input.step() != self.step {
            return Err(StepRejection::WrongStep {
                current: self.step,
                received: input.step(),
            });
        }

        match input {
            StepInput::Duration { weeks } => {
                validate_weeks(*weeks)?;
            }
            StepInput::StartDate { start_date } => {
                validate_start_date(*start_date, env.today)?;
            }
            StepInput::Accommodation { options, .. } => {
                if let Some(unknown) = options.iter().find(|key| env.catalog.option(key).is_none())
                {
                    return Err(SelectionIssue::UnknownOption(unknown.clone()).into());
                }
            }
            StepInput::Contact(contact) => validate_contact(contact)?,
        }

        Ok(())
    }

    pub fn can_advance(&self, input: &StepInput, env: &WizardEnv<'_>) -> bool {
        self.validate(input, env).is_ok()
    }

    pub fn can_skip(&self) -> bool {
        self.step == WizardStep::Contact
    }

    pub fn next(&self, input: StepInput, env: &WizardEnv<'_>) -> Result<Self, StepRejection> {
        self.validate(&input, env)?;

        let mut next = self.clone();
        match input {
            StepInput::Duration { weeks } => next.selection.weeks = Some(weeks),
            StepInput::StartDate { start_date } => next.selection.start_date = Some(start_date),
            StepInput::Accommodation {
                accommodation_type,
                options,
            } => {
                next.selection.accommodation_type = Some(accommodation_type);
                next.selection.options = options;
            }
            StepInput::Contact(contact) => next.selection.contact = Some(contact),
        }

        if next.step == WizardStep::Contact {
            next.finish(env)
        } else {
            next.step = next.step.following();
            Ok(next)
        }
    }

    /// Contact capture is optional; skipping clears any contact entered earlier.
    pub fn skip(&self, env: &WizardEnv<'_>) -> Result<Self, StepRejection> {
        if !self.can_skip() {
            return Err(StepRejection::SkipNotAllowed(self.step));
        }
        let mut next = self.clone();
        next.selection.contact = None;
        next.finish(env)
    }

    pub fn back(&self) -> Result<Self, StepRejection> {
        let previous = self.step.previous().ok_or(StepRejection::AtFirstStep)?;
        let mut next = self.clone();
        next.step = previous;
        next.result = None;
        Ok(next)
    }

    pub fn start_over(&self) -> Self {
        Self::start()
    }

    fn finish(mut self, env: &WizardEnv<'_>) -> Result<Self, StepRejection> {
        let result = env
            .calculator
            .calculate(env.catalog, &self.selection, env.today)
            .map_err(StepRejection::Calculation)?;
        self.step = WizardStep::Result;
        self.result = Some(result);
        Ok(self)
    }
}
