use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::Config;
use crate::endpoint;
use crate::http::{FetchError, HttpClient, DEFAULT_TIMEOUT};
use crate::models::{normalize_code, DailyRates, SymbolInfo};

/// Source of rate and symbol data. The controller is written against this
/// trait so tests can drive it with a scripted fake.
#[async_trait]
pub trait RatesSource: Send + Sync {
    async fn daily_rates(&self, base: &str) -> Result<DailyRates, FetchError>;
    async fn symbols(&self) -> Result<HashMap<String, SymbolInfo>, FetchError>;
}

#[async_trait]
impl<S: RatesSource + ?Sized> RatesSource for std::sync::Arc<S> {
    async fn daily_rates(&self, base: &str) -> Result<DailyRates, FetchError> {
        (**self).daily_rates(base).await
    }

    async fn symbols(&self) -> Result<HashMap<String, SymbolInfo>, FetchError> {
        (**self).symbols().await
    }
}

#[derive(Clone)]
pub struct RatesClient {
    http: HttpClient,
    base_url: String,
    deadline: Duration,
}

impl RatesClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: endpoint::resolve(config),
            deadline: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RatesSource for RatesClient {
    /// Fetch the latest rates for `base`. Only transport failures propagate;
    /// an unrecognized response shape degrades to an empty rates table.
    async fn daily_rates(&self, base: &str) -> Result<DailyRates, FetchError> {
        let base = normalize_code(base);
        let url = format!("{}/latest", self.base_url);
        let body = self
            .http
            .get(&url, &[("base", Some(base.as_str()))], self.deadline)
            .await?;
        Ok(normalize_daily_rates(&body, &base))
    }

    /// Fetch symbol metadata. Shape mismatches degrade to an empty map.
    async fn symbols(&self) -> Result<HashMap<String, SymbolInfo>, FetchError> {
        let url = format!("{}/symbols", self.base_url);
        let body = self.http.get(&url, &[], self.deadline).await?;
        Ok(normalize_symbols(&body))
    }
}

/// Accepts a direct `{base, rates}` document or the same nested under
/// `data`; anything else yields an empty table for the requested base.
fn normalize_daily_rates(body: &Value, requested_base: &str) -> DailyRates {
    let doc = if body.get("rates").map_or(false, Value::is_object) {
        body
    } else if let Some(data) = body.get("data").filter(|d| {
        d.get("rates").map_or(false, Value::is_object)
    }) {
        data
    } else {
        return DailyRates {
            base: requested_base.to_string(),
            date: None,
            rates: HashMap::new(),
        };
    };

    let base = doc
        .get("base")
        .and_then(Value::as_str)
        .map(normalize_code)
        .unwrap_or_else(|| requested_base.to_string());

    let date = doc
        .get("date")
        .and_then(Value::as_str)
        .map(String::from);

    let mut rates = HashMap::new();
    if let Some(entries) = doc.get("rates").and_then(Value::as_object) {
        for (code, rate) in entries {
            if let Some(rate) = rate.as_f64() {
                if rate.is_finite() && rate > 0.0 {
                    rates.insert(normalize_code(code), rate);
                }
            }
        }
    }

    DailyRates { base, date, rates }
}

/// Accepts `{symbols: {...}}` or `{data: {symbols: {...}}}`. Entries may be
/// `{code, description}` objects or bare description strings.
fn normalize_symbols(body: &Value) -> HashMap<String, SymbolInfo> {
    let entries = body
        .get("symbols")
        .or_else(|| body.get("data").and_then(|d| d.get("symbols")))
        .and_then(Value::as_object);

    let mut symbols = HashMap::new();
    if let Some(entries) = entries {
        for (code, entry) in entries {
            let code = normalize_code(code);
            let description = match entry {
                Value::String(s) => s.clone(),
                Value::Object(obj) => obj
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or(&code)
                    .to_string(),
                _ => continue,
            };
            symbols.insert(
                code.clone(),
                SymbolInfo { code, description },
            );
        }
    }
    symbols
}
