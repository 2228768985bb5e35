//! fawazahmed0 currency-api provider (served from jsDelivr)
//!
//! Static daily JSON with lowercase currency codes nested under the base
//! currency key.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::{ensure_success, MidPrices, ProviderError, RateProvider, UsdRates};

const CURRENCY_API_URL: &str =
    "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/usd.json";

#[derive(Debug, Deserialize)]
struct CurrencyApiResponse {
    #[serde(default)]
    usd: HashMap<String, f64>,
}

pub struct CurrencyApiProvider {
    client: reqwest::Client,
    url: String,
}

impl CurrencyApiProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: CURRENCY_API_URL.to_string(),
        }
    }

    fn parse_payload(body: &str) -> Result<MidPrices, ProviderError> {
        let payload: CurrencyApiResponse = serde_json::from_str(body)?;
        let rates = UsdRates::from_lookup(|code| {
            payload.usd.get(code.to_lowercase().as_str()).copied()
        })?;
        Ok(rates.to_mids())
    }
}

#[async_trait]
impl RateProvider for CurrencyApiProvider {
    fn name(&self) -> &'static str {
        "currency-api"
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
    fn test_parse_lowercase_payload() {
        let body = r#"{
            "date": "2024-01-02",
            "usd": { "eur": 0.92, "gbp": 0.79, "ils": 3.72, "jpy": 149.85, "aud": 1.47 }
        }"#;

        let mids = CurrencyApiProvider::parse_payload(body).unwrap();
        assert_eq!(mids[&Pair::EurUsd], 1.08696);
        assert_eq!(mids[&Pair::EurIls], 4.04348);
    }

    #[test]
    fn test_rejects_missing_base_key() {
        let body = r#"{ "date": "2024-01-02", "eur": { "usd": 1.08 } }"#;
        let result = CurrencyApiProvider::parse_payload(body);
        assert!(matches!(result, Err(ProviderError::MissingRate(_))));
    }
}
