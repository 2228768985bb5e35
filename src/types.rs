//! Core types used throughout fxfeed
//!
//! Defines the currency pair catalog and the quote/snapshot structures
//! published to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currency pairs
///
/// Declaration order is the catalog order: it defines both display order
/// and the iteration order used when building snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pair {
    UsdIls,
    EurUsd,
    GbpUsd,
    EurIls,
    UsdJpy,
    GbpIls,
}

impl Pair {
    /// All catalog pairs, in display order
    pub const ALL: [Pair; 6] = [
        Pair::UsdIls,
        Pair::EurUsd,
        Pair::GbpUsd,
        Pair::EurIls,
        Pair::UsdJpy,
        Pair::GbpIls,
    ];

    /// Pair identifier, e.g. "EUR/USD"
    pub fn id(&self) -> &'static str {
        match self {
            Pair::UsdIls => "USD/ILS",
            Pair::EurUsd => "EUR/USD",
            Pair::GbpUsd => "GBP/USD",
            Pair::EurIls => "EUR/ILS",
            Pair::UsdJpy => "USD/JPY",
            Pair::GbpIls => "GBP/ILS",
        }
    }

    /// Base currency code
    pub fn base(&self) -> &'static str {
        match self {
            Pair::UsdIls => "USD",
            Pair::EurUsd => "EUR",
            Pair::GbpUsd => "GBP",
            Pair::EurIls => "EUR",
            Pair::UsdJpy => "USD",
            Pair::GbpIls => "GBP",
        }
    }

    /// Quote currency code
    pub fn quote(&self) -> &'static str {
        match self {
            Pair::UsdIls => "ILS",
            Pair::EurUsd => "USD",
            Pair::GbpUsd => "USD",
            Pair::EurIls => "ILS",
            Pair::UsdJpy => "JPY",
            Pair::GbpIls => "ILS",
        }
    }

    /// Fixed absolute spread applied symmetrically around the mid
    pub fn spread(&self) -> f64 {
        match self {
            Pair::UsdIls => 0.005,
            Pair::EurUsd => 0.0003,
            Pair::GbpUsd => 0.0004,
            Pair::EurIls => 0.006,
            Pair::UsdJpy => 0.03,
            Pair::GbpIls => 0.008,
        }
    }

    /// Seed mid price used before the first provider response arrives
    pub fn fallback_mid(&self) -> f64 {
        match self {
            Pair::UsdIls => 3.72,
            Pair::EurUsd => 1.0845,
            Pair::GbpUsd => 1.2720,
            Pair::EurIls => 4.035,
            Pair::UsdJpy => 149.85,
            Pair::GbpIls => 4.731,
        }
    }

    /// Parse from a pair identifier
    pub fn from_id(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "USD/ILS" => Some(Pair::UsdIls),
            "EUR/USD" => Some(Pair::EurUsd),
            "GBP/USD" => Some(Pair::GbpUsd),
            "EUR/ILS" => Some(Pair::EurIls),
            "USD/JPY" => Some(Pair::UsdJpy),
            "GBP/ILS" => Some(Pair::GbpIls),
            _ => None,
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A fully derived quote for one pair
///
/// Recomputed on every tick from the current mid prices; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub pair: Pair,
    pub base: &'static str,
    pub quote: &'static str,
    pub bid: f64,
    pub ask: f64,
    pub spread: f64,
    pub change_24h: f64,
    pub change_percent: f64,
}

/// Engine lifecycle state, driven by provider refresh outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    /// Startup, before the first refresh resolves
    Initializing,
    /// Last refresh succeeded
    Live,
    /// Last refresh exhausted the provider chain; serving cached mids
    Degraded,
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedStatus::Initializing => write!(f, "INITIALIZING"),
            FeedStatus::Live => write!(f, "LIVE"),
            FeedStatus::Degraded => write!(f, "DEGRADED"),
        }
    }
}

/// The externally visible feed state
///
/// Fully replaced on every publication; `quotes` always holds one entry per
/// catalog pair, in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub quotes: Vec<Quote>,
    pub loading: bool,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_is_stable() {
        let ids: Vec<&str> = Pair::ALL.iter().map(|p| p.id()).collect();
        assert_eq!(
            ids,
            vec!["USD/ILS", "EUR/USD", "GBP/USD", "EUR/ILS", "USD/JPY", "GBP/ILS"]
        );
    }

    #[test]
    fn test_pair_roundtrip_from_id() {
        for pair in Pair::ALL {
            assert_eq!(Pair::from_id(pair.id()), Some(pair));
        }
        assert_eq!(Pair::from_id("usd/ils"), Some(Pair::UsdIls));
        assert_eq!(Pair::from_id("AUD/USD"), None);
    }

    #[test]
    fn test_constants_are_positive() {
        for pair in Pair::ALL {
            assert!(pair.spread() > 0.0);
            assert!(pair.fallback_mid() > 0.0);
        }
    }
}
