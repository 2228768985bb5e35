//! open.er-api.com reference-rate provider
//!
//! Free endpoint publishing a USD-denominated rate table. The payload
//! carries its own `result` field; anything but "success" counts as a
//! provider failure even on HTTP 200.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::{ensure_success, MidPrices, ProviderError, RateProvider, UsdRates};

const OPEN_ER_API_URL: &str = "https://open.er-api.com/v6/latest/USD";

#[derive(Debug, Deserialize)]
struct OpenErApiResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

pub struct OpenErApiProvider {
    client: reqwest::Client,
    url: String,
}

impl OpenErApiProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: OPEN_ER_API_URL.to_string(),
        }
    }

    fn parse_payload(body: &str) -> Result<MidPrices, ProviderError> {
        let payload: OpenErApiResponse = serde_json::from_str(body)?;
        if payload.result != "success" {
            return Err(ProviderError::Rejected(payload.result));
        }
        let rates = UsdRates::from_lookup(|code| payload.rates.get(code).copied())?;
        Ok(rates.to_mids())
    }
}

#[async_trait]
impl RateProvider for OpenErApiProvider {
    fn name(&self) -> &'static str {
        "open-er-api"
    }

    async fn fetch_mid_prices(&self) -> Result<MidPrices, ProviderError> {
        let resp = self.client.get(&self.url).send().await?;
        ensure_success(&resp)?;
        let body = resp.text().await?;
        Self::parse_payload(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pair;

    #[test]
    fn test_parse_success_payload() {
        let body = r#"{
            "result": "success",
            "base_code": "USD",
            "rates": { "USD": 1, "EUR": 0.92, "GBP": 0.79, "ILS": 3.72, "JPY": 149.85 }
        }"#;

        let mids = OpenErApiProvider::parse_payload(body).unwrap();
        assert_eq!(mids[&Pair::UsdIls], 3.72);
        assert_eq!(mids[&Pair::EurIls], 4.04348);
    }

    #[test]
    fn test_rejects_error_result() {
        let body = r#"{ "result": "error", "error-type": "invalid-key" }"#;
        let result = OpenErApiProvider::parse_payload(body);
        assert!(matches!(result, Err(ProviderError::Rejected(_))));
    }

    #[test]
    fn test_rejects_missing_currency() {
        let body = r#"{ "result": "success", "rates": { "EUR": 0.92, "GBP": 0.79 } }"#;
        let result = OpenErApiProvider::parse_payload(body);
        assert!(matches!(result, Err(ProviderError::MissingRate(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = OpenErApiProvider::parse_payload("not json at all");
        assert!(matches!(result, Err(ProviderError::Payload(_))));
    }
}
