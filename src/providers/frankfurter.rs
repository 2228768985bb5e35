//! api.frankfurter.app reference-rate provider
//!
//! Serves ECB reference rates. Queried with `from=USD` so the response is a
//! USD-denominated table restricted to the currencies we need.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::{ensure_success, MidPrices, ProviderError, RateProvider, UsdRates};

const FRANKFURTER_URL: &str = "https://api.frankfurter.app/latest?from=USD&to=EUR,GBP,ILS,JPY";

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    rates: HashMap<String, f64>,
}

pub struct FrankfurterProvider {
    client: reqwest::Client,
    url: String,
}

impl FrankfurterProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: FRANKFURTER_URL.to_string(),
        }
    }

    fn parse_payload(body: &str) -> Result<MidPrices, ProviderError> {
        let payload: FrankfurterResponse = serde_json::from_str(body)?;
        let rates = UsdRates::from_lookup(|code| payload.rates.get(code).copied())?;
        Ok(rates.to_mids())
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &'static str {
        "frankfurter"
    }

    async fn fetch_mid_prices(&self) -> Result<MidPrices, ProviderError> {
        let resp = self.client.get(&self.url).send().await?;
        ensure_success(&resp)?;
        let body = resp.text().await?;
        Self::parse_payload(&body)
    }
}
