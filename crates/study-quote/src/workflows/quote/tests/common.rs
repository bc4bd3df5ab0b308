use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::quote::catalog::{CatalogDirectory, PricingCatalog, HARBOUR_ID, MAPLE_LEAF_ID};
use crate::workflows::quote::discount::DiscountConfig;
use crate::workflows::quote::domain::{
    AccommodationType, Contact, OptionKey, QuoteId, SchoolId, Selection,
};
use crate::workflows::quote::presenter::{DisplayConfig, Locale};
use crate::workflows::quote::repository::{QuoteStore, SaveQuoteRequest, StoreError};
use crate::workflows::quote::service::QuoteService;
use crate::workflows::quote::CurrencyCode;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2027, 1, 10)
}

/// Exactly ninety days after [`today`].
pub(super) fn early_start() -> NaiveDate {
    date(2027, 4, 10)
}

/// Eighty-nine days after [`today`].
pub(super) fn late_start() -> NaiveDate {
    date(2027, 4, 9)
}

pub(super) fn maple_leaf() -> PricingCatalog {
    CatalogDirectory::standard()
        .get(&SchoolId::new(MAPLE_LEAF_ID))
        .cloned()
        .expect("maple leaf catalog")
}

pub(super) fn harbour() -> PricingCatalog {
    CatalogDirectory::standard()
        .get(&SchoolId::new(HARBOUR_ID))
        .cloned()
        .expect("harbour catalog")
}

pub(super) fn options(keys: &[&str]) -> BTreeSet<OptionKey> {
    keys.iter().map(|key| OptionKey::new(*key)).collect()
}

pub(super) fn selection(
    weeks: u32,
    accommodation: AccommodationType,
    start_date: Option<NaiveDate>,
    option_keys: &[&str],
) -> Selection {
    Selection {
        weeks: Some(weeks),
        start_date,
        accommodation_type: Some(accommodation),
        options: options(option_keys),
        contact: None,
    }
}

pub(super) fn contact() -> Contact {
    Contact {
        email: "hana.sato@example.jp".to_string(),
        name: Some("Hana Sato".to_string()),
        phone: None,
    }
}

pub(super) fn display_config() -> DisplayConfig {
    DisplayConfig {
        locale: Locale::En,
        home_currency: CurrencyCode::Jpy,
        quote_validity_days: 30,
    }
}

pub(super) fn build_service<S>(store: Arc<S>) -> QuoteService<S>
where
    S: QuoteStore + 'static,
{
    QuoteService::new(
        CatalogDirectory::standard(),
        DiscountConfig::default(),
        store,
        display_config(),
    )
    .with_clock(Arc::new(today))
}

#[derive(Default)]
pub(super) struct MemoryStore {
    saved: Mutex<Vec<SaveQuoteRequest>>,
}

impl MemoryStore {
    pub(super) fn saved(&self) -> Vec<SaveQuoteRequest> {
        self.saved.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl QuoteStore for MemoryStore {
    async fn save(&self, request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        let mut guard = self.saved.lock().expect("store mutex poisoned");
        guard.push(request.clone());
        Ok(QuoteId(format!("Q-{:04}", guard.len())))
    }
}

/// Fails with the given error every time and counts the calls.
pub(super) struct FailingStore {
    error: StoreError,
    calls: AtomicUsize,
}

impl FailingStore {
    pub(super) fn new(error: StoreError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteStore for FailingStore {
    async fn save(&self, _request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Replays scripted outcomes in order, then succeeds.
#[derive(Default)]
pub(super) struct ScriptedStore {
    script: Mutex<Vec<Result<QuoteId, StoreError>>>,
    calls: AtomicUsize,
}

impl ScriptedStore {
    pub(super) fn new(mut script: Vec<Result<QuoteId, StoreError>>) -> Self {
        script.reverse();
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteStore for ScriptedStore {
    async fn save(&self, _request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.script
            .lock()
            .expect("script mutex poisoned")
            .pop()
            .unwrap_or_else(|| Ok(QuoteId(format!("Q-scripted-{call}"))))
    }
}

/// Never answers before `delay` elapses.
pub(super) struct SlowStore {
    pub(super) delay: Duration,
}

#[async_trait]
impl QuoteStore for SlowStore {
    async fn save(&self, _request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(QuoteId("Q-late".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
