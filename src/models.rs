use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A currency symbol as reported by the backend's symbols endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub code: String,
    pub description: String,
}

/// One merged fetch result: latest rates plus symbol metadata for a base
/// currency. Superseded by the next successful refresh, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesPayload {
    pub base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub rates: HashMap<String, f64>,
    #[serde(default)]
    pub symbols: HashMap<String, SymbolInfo>,
    /// Epoch milliseconds of the fetch that produced this payload.
    pub last_updated: i64,
}

/// The rates half of a payload, as returned by the latest-rates endpoint
/// before symbols are merged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRates {
    pub base: String,
    #[serde(default)]
    pub date: Option<String>,
    pub rates: HashMap<String, f64>,
}

/// Normalize a currency code to the uppercase ISO-4217-like form used as a
/// map key everywhere else.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("usd"), "USD");
        assert_eq!(normalize_code(" eur "), "EUR");
        assert_eq!(normalize_code("GBP"), "GBP");
    }

    #[test]
    fn test_payload_roundtrip_keeps_optional_date() {
        let payload = RatesPayload {
            base: "USD".to_string(),
            date: None,
            rates: HashMap::from([("EUR".to_string(), 0.9)]),
            symbols: HashMap::new(),
            last_updated: 1_700_000_000_000,
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("date"));
        let back: RatesPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.base, "USD");
        assert_eq!(back.rates["EUR"], 0.9);
    }
}
