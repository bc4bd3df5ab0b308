use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;

use crate::workflows::quote::{
    business_clock, Clock, CurrencyCode, DiscountConfig, DisplayConfig, Locale, RetryPolicy,
    DEFAULT_UTC_OFFSET_MINUTES,
};

/// Longest quote validity accepted from `QUOTE_VALIDITY_DAYS`.
pub const MAX_VALIDITY_DAYS: u32 = 365;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub quote: QuoteConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            quote: QuoteConfig::from_env()?,
            store: StoreConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Pricing and presentation settings.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub home_currency: CurrencyCode,
    pub locale: Locale,
    pub discount: DiscountConfig,
    pub validity_days: u32,
    pub catalog_csv: Option<PathBuf>,
    /// Offset used to decide which calendar day "today" is.
    pub utc_offset: FixedOffset,
}

impl QuoteConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let currency = env::var("QUOTE_HOME_CURRENCY").unwrap_or_else(|_| "JPY".to_string());
        let home_currency = CurrencyCode::parse(&currency)
            .ok_or(ConfigError::InvalidCurrency { value: currency })?;

        let locale = env::var("QUOTE_LOCALE").unwrap_or_else(|_| "ja".to_string());
        let locale = Locale::parse(&locale).ok_or(ConfigError::InvalidLocale { value: locale })?;

        let defaults = DiscountConfig::default();
        let discount = DiscountConfig {
            early_booking_min_days: parse_var(
                "QUOTE_EARLY_BOOKING_DAYS",
                defaults.early_booking_min_days,
            )?,
            early_booking_bps: parse_var("QUOTE_EARLY_BOOKING_BPS", defaults.early_booking_bps)?,
        };
        if discount.early_booking_bps > 10_000 {
            return Err(ConfigError::InvalidNumber {
                key: "QUOTE_EARLY_BOOKING_BPS",
                value: discount.early_booking_bps.to_string(),
            });
        }

        let validity_days: u32 = parse_var("QUOTE_VALIDITY_DAYS", 30)?;
        if !(1..=MAX_VALIDITY_DAYS).contains(&validity_days) {
            return Err(ConfigError::InvalidNumber {
                key: "QUOTE_VALIDITY_DAYS",
                value: validity_days.to_string(),
            });
        }

        let offset_minutes: i32 =
            parse_var("QUOTE_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES)?;
        let utc_offset = (-12 * 60..=14 * 60)
            .contains(&offset_minutes)
            .then(|| FixedOffset::east_opt(offset_minutes * 60))
            .flatten()
            .ok_or(ConfigError::InvalidNumber {
                key: "QUOTE_UTC_OFFSET_MINUTES",
                value: offset_minutes.to_string(),
            })?;

        Ok(Self {
            home_currency,
            locale,
            discount,
            validity_days,
            utc_offset,
            catalog_csv: env::var("QUOTE_CATALOG_CSV")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn clock(&self) -> Clock {
        business_clock(self.utc_offset)
    }

    pub fn display(&self) -> DisplayConfig {
        DisplayConfig {
            locale: self.locale,
            home_currency: self.home_currency,
            quote_validity_days: self.validity_days,
        }
    }
}

/// External quote store. Without a URL quotes are kept in memory.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_attempts = parse_var("QUOTE_STORE_MAX_ATTEMPTS", 3u32)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "QUOTE_STORE_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            url: env::var("QUOTE_STORE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            timeout_ms: parse_var("QUOTE_STORE_TIMEOUT_MS", 5_000)?,
            max_attempts,
            backoff_ms: parse_var("QUOTE_STORE_BACKOFF_MS", 200)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let initial_backoff = Duration::from_millis(self.backoff_ms);
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff,
            max_backoff: initial_backoff * 10,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        _ => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidCurrency { value: String },
    InvalidLocale { value: String },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCurrency { value } => {
                write!(f, "QUOTE_HOME_CURRENCY '{value}' is not a supported currency")
            }
            ConfigError::InvalidLocale { value } => {
                write!(f, "QUOTE_LOCALE '{value}' must be 'en' or 'ja'")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an out-of-range or non-numeric value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "QUOTE_HOME_CURRENCY",
            "QUOTE_LOCALE",
            "QUOTE_EARLY_BOOKING_DAYS",
            "QUOTE_EARLY_BOOKING_BPS",
            "QUOTE_VALIDITY_DAYS",
            "QUOTE_CATALOG_CSV",
            "QUOTE_UTC_OFFSET_MINUTES",
            "QUOTE_STORE_URL",
            "QUOTE_STORE_TIMEOUT_MS",
            "QUOTE_STORE_MAX_ATTEMPTS",
            "QUOTE_STORE_BACKOFF_MS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.quote.home_currency, CurrencyCode::Jpy);
        assert_eq!(config.quote.locale, Locale::Ja);
        assert_eq!(config.quote.discount, DiscountConfig::default());
        assert_eq!(config.quote.validity_days, 30);
        assert_eq!(config.quote.utc_offset.local_minus_utc(), 9 * 3600);
        assert!(config.quote.catalog_csv.is_none());
        assert!(config.store.url.is_none());
        assert_eq!(config.store.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_quote_and_store_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("QUOTE_HOME_CURRENCY", "usd");
        env::set_var("QUOTE_LOCALE", "en");
        env::set_var("QUOTE_EARLY_BOOKING_DAYS", "60");
        env::set_var("QUOTE_EARLY_BOOKING_BPS", "750");
        env::set_var("QUOTE_STORE_URL", "http://quotes.internal:8080");
        env::set_var("QUOTE_STORE_MAX_ATTEMPTS", "5");
        env::set_var("QUOTE_STORE_TIMEOUT_MS", "1500");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.quote.home_currency, CurrencyCode::Usd);
        assert_eq!(config.quote.display().locale, Locale::En);
        assert_eq!(config.quote.discount.early_booking_min_days, 60);
        assert_eq!(config.quote.discount.early_booking_bps, 750);
        assert_eq!(
            config.store.url.as_deref(),
            Some("http://quotes.internal:8080")
        );
        let policy = config.store.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn rejects_unknown_currency_and_bad_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("QUOTE_HOME_CURRENCY", "XYZ");
        match AppConfig::load() {
            Err(ConfigError::InvalidCurrency { value }) => assert_eq!(value, "XYZ"),
            other => panic!("expected invalid currency, got {other:?}"),
        }

        reset_env();
        env::set_var("QUOTE_VALIDITY_DAYS", "thirty");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { key, .. }) => assert_eq!(key, "QUOTE_VALIDITY_DAYS"),
            other => panic!("expected invalid number, got {other:?}"),
        }

        reset_env();
        env::set_var("QUOTE_STORE_MAX_ATTEMPTS", "0");
        let result = AppConfig::load();
        reset_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                key: "QUOTE_STORE_MAX_ATTEMPTS",
                ..
            })
        ));
    }

    #[test]
    fn rejects_validity_days_outside_one_year() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        for raw in ["-5", "0", "366", "1000000000"] {
            reset_env();
            env::set_var("QUOTE_VALIDITY_DAYS", raw);
            let result = AppConfig::load();
            reset_env();
            match result {
                Err(ConfigError::InvalidNumber { key, .. }) => {
                    assert_eq!(key, "QUOTE_VALIDITY_DAYS", "{raw}")
                }
                other => panic!("expected {raw} to be rejected, got {other:?}"),
            }
        }

        env::set_var("QUOTE_VALIDITY_DAYS", "365");
        let config = AppConfig::load().expect("config loads");
        reset_env();
        assert_eq!(config.quote.validity_days, MAX_VALIDITY_DAYS);
    }

    #[test]
    fn reads_business_day_offset() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("QUOTE_UTC_OFFSET_MINUTES", "-300");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.quote.utc_offset.local_minus_utc(), -300 * 60);

        for raw in ["900", "-800", "nine"] {
            env::set_var("QUOTE_UTC_OFFSET_MINUTES", raw);
            let result = AppConfig::load();
            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidNumber {
                        key: "QUOTE_UTC_OFFSET_MINUTES",
                        ..
                    })
                ),
                "{raw}: {result:?}"
            );
        }
        reset_env();
    }
}
