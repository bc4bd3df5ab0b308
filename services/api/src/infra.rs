use async_trait::async_trait;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use study_quote::config::{QuoteConfig, StoreConfig};
use study_quote::error::AppError;
use study_quote::workflows::quote::{
    AccommodationType, CatalogDirectory, HttpQuoteStore, OptionKey, QuoteId, QuoteStore,
    RetryingStore, SaveQuoteRequest, StoreError,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps saved quotes in process memory, issuing sequential ids.
#[derive(Default, Clone)]
pub(crate) struct InMemoryQuoteStore {
    quotes: Arc<Mutex<HashMap<QuoteId, SaveQuoteRequest>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryQuoteStore {
    pub(crate) fn get(&self, id: &QuoteId) -> Option<SaveQuoteRequest> {
        self.quotes
            .lock()
            .expect("quote store mutex poisoned")
            .get(id)
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.quotes.lock().expect("quote store mutex poisoned").len()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn save(&self, request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        let number = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let id = QuoteId(format!("Q-{number:06}"));
        let mut guard = self.quotes.lock().expect("quote store mutex poisoned");
        guard.insert(id.clone(), request.clone());
        Ok(id)
    }
}

/// Store chosen at startup from `QUOTE_STORE_URL`.
pub(crate) enum ConfiguredStore {
    Memory(InMemoryQuoteStore),
    Remote(RetryingStore<HttpQuoteStore>),
}

impl ConfiguredStore {
    pub(crate) fn from_config(config: &StoreConfig) -> Self {
        match &config.url {
            Some(url) => {
                info!(endpoint = %url, attempts = config.max_attempts, "using remote quote store");
                Self::Remote(RetryingStore::new(
                    HttpQuoteStore::new(url.clone()),
                    config.retry_policy(),
                ))
            }
            None => {
                info!("QUOTE_STORE_URL not set; quotes are kept in memory");
                Self::Memory(InMemoryQuoteStore::default())
            }
        }
    }
}

#[async_trait]
impl QuoteStore for ConfiguredStore {
    async fn save(&self, request: &SaveQuoteRequest) -> Result<QuoteId, StoreError> {
        match self {
            Self::Memory(store) => store.save(request).await,
            Self::Remote(store) => store.save(request).await,
        }
    }
}

/// Built-in programs unless `QUOTE_CATALOG_CSV` points at an export.
pub(crate) fn load_catalogs(config: &QuoteConfig) -> Result<CatalogDirectory, AppError> {
    match &config.catalog_csv {
        Some(path) => {
            let directory = CatalogDirectory::from_csv_reader(File::open(path)?)?;
            info!(path = %path.display(), schools = directory.len(), "catalogs imported");
            Ok(directory)
        }
        None => Ok(CatalogDirectory::standard()),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_accommodation(raw: &str) -> Result<AccommodationType, String> {
    AccommodationType::parse(raw).ok_or_else(|| {
        format!("unknown accommodation '{raw}' (homestay, dormitory, apartment, none)")
    })
}

pub(crate) fn option_set(keys: &[String]) -> BTreeSet<OptionKey> {
    keys.iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .map(OptionKey::new)
        .collect()
}
