//! Reference-rate providers
//!
//! Each provider fetches a public FX endpoint and normalizes its response
//! into one mid price per catalog pair. Providers are tried in configured
//! priority order until the first success; adding or removing a provider is
//! a data change, not a control-flow change.

mod currency_api;
mod frankfurter;
mod open_er_api;

pub use currency_api::CurrencyApiProvider;
pub use frankfurter::FrankfurterProvider;
pub use open_er_api::OpenErApiProvider;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::ProvidersConfig;
use crate::synth::round5;
use crate::types::Pair;

/// One normalized mid price per catalog pair
pub type MidPrices = HashMap<Pair, f64>;

/// Failure of a single provider fetch
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("provider reported failure: {0}")]
    Rejected(String),

    #[error("missing rate for {0}")]
    MissingRate(&'static str),

    #[error("non-positive rate for {0}")]
    BadRate(&'static str),
}

/// Trait for reference-rate providers
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short provider name, used for logging and config lookup
    fn name(&self) -> &'static str;

    /// Fetch and normalize mid prices for every catalog pair
    async fn fetch_mid_prices(&self) -> Result<MidPrices, ProviderError>;
}

/// USD-relative rate table extracted from a provider payload
///
/// Each field is units of that currency per 1 USD. Extraction from the raw
/// payload is provider-specific; the derivation of catalog mids from the
/// table is shared because every configured endpoint quotes against USD.
#[derive(Debug, Clone, Copy)]
pub struct UsdRates {
    pub eur: f64,
    pub gbp: f64,
    pub ils: f64,
    pub jpy: f64,
}

impl UsdRates {
    pub fn from_lookup<F>(get: F) -> Result<Self, ProviderError>
    where
        F: Fn(&'static str) -> Option<f64>,
    {
        let mut rate = |code: &'static str| -> Result<f64, ProviderError> {
            let value = get(code).ok_or(ProviderError::MissingRate(code))?;
            if !value.is_finite() || value <= 0.0 {
                return Err(ProviderError::BadRate(code));
            }
            Ok(value)
        };
        Ok(Self {
            eur: rate("EUR")?,
            gbp: rate("GBP")?,
            ils: rate("ILS")?,
            jpy: rate("JPY")?,
        })
    }

    /// Derive the six catalog mids, including the ILS cross rates
    pub fn to_mids(self) -> MidPrices {
        let mut mids = MidPrices::with_capacity(Pair::ALL.len());
        mids.insert(Pair::UsdIls, round5(self.ils));
        mids.insert(Pair::EurUsd, round5(1.0 / self.eur));
        mids.insert(Pair::GbpUsd, round5(1.0 / self.gbp));
        mids.insert(Pair::EurIls, round5(self.ils / self.eur));
        mids.insert(Pair::UsdJpy, round5(self.jpy));
        mids.insert(Pair::GbpIls, round5(self.ils / self.gbp));
        mids
    }
}

/// Build the provider chain from the configured priority order
pub fn build_chain(config: &ProvidersConfig) -> anyhow::Result<Vec<Arc<dyn RateProvider>>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build http client: {e}"))?;

    let mut chain: Vec<Arc<dyn RateProvider>> = Vec::with_capacity(config.order.len());
    for name in &config.order {
        let provider: Arc<dyn RateProvider> = match name.as_str() {
            "open-er-api" => Arc::new(OpenErApiProvider::new(client.clone())),
            "frankfurter" => Arc::new(FrankfurterProvider::new(client.clone())),
            "currency-api" => Arc::new(CurrencyApiProvider::new(client.clone())),
            other => anyhow::bail!("unknown provider in providers.order: {other}"),
        };
        chain.push(provider);
    }
    Ok(chain)
}

/// Query providers in priority order until the first success
///
/// Returns the normalized mids plus the serving provider's name. Fails only
/// when every provider failed, with the last provider's error.
pub async fn fetch_with_fallback(
    providers: &[Arc<dyn RateProvider>],
) -> Result<(MidPrices, &'static str), ProviderError> {
    debug_assert!(!providers.is_empty());
    let mut last_err = ProviderError::Rejected("no providers configured".to_string());

    for provider in providers {
        match provider.fetch_mid_prices().await {
            Ok(mids) => {
                debug_assert_eq!(mids.len(), Pair::ALL.len());
                return Ok((mids, provider.name()));
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "Provider fetch failed");
                last_err = e;
            }
        }
    }

    Err(last_err)
}

/// Check a response status before parsing; non-2xx is a provider failure
pub(crate) fn ensure_success(resp: &reqwest::Response) -> Result<(), ProviderError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_table_derives_cross_rates() {
        let rates = UsdRates {
            eur: 0.92,
            gbp: 0.79,
            ils: 3.72,
            jpy: 149.85,
        };
        let mids = rates.to_mids();

        assert_eq!(mids.len(), Pair::ALL.len());
        assert_eq!(mids[&Pair::UsdIls], 3.72);
        assert_eq!(mids[&Pair::UsdJpy], 149.85);
        assert_eq!(mids[&Pair::EurIls], 4.04348);
        assert_eq!(mids[&Pair::GbpIls], 4.70886);
        assert_eq!(mids[&Pair::EurUsd], 1.08696);
        assert_eq!(mids[&Pair::GbpUsd], 1.26582);
    }

    #[test]
    fn test_missing_rate_fails_provider() {
        let result = UsdRates::from_lookup(|code| match code {
            "EUR" => Some(0.92),
            "GBP" => Some(0.79),
            "ILS" => Some(3.72),
            _ => None,
        });
        assert!(matches!(result, Err(ProviderError::MissingRate("JPY"))));
    }

    #[test]
    fn test_non_positive_rate_fails_provider() {
        let result = UsdRates::from_lookup(|code| match code {
            "EUR" => Some(0.0),
            _ => Some(1.0),
        });
        assert!(matches!(result, Err(ProviderError::BadRate("EUR"))));
    }
}
