//! Quote synthesizer
//!
//! Pure derivation of bid/ask quotes from the current mid prices. The 24h
//! change fields are cosmetic and freshly randomized on every call; bid and
//! ask depend only on the mids and the spread table.

use rand::Rng;

use crate::providers::MidPrices;
use crate::types::{Pair, Quote};

/// Round to 5 fractional digits, the price precision used everywhere
pub fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}

/// Build one quote per catalog pair, in catalog order
///
/// Every mid must be present and positive; the feed engine guarantees this
/// by seeding the map from the fallback table at construction.
pub fn synthesize<R: Rng>(mids: &MidPrices, rng: &mut R) -> Vec<Quote> {
    Pair::ALL
        .iter()
        .map(|&pair| {
            let mid = mids[&pair];
            debug_assert!(mid > 0.0, "non-positive mid for {pair}");

            let half = pair.spread() / 2.0;
            let change_24h = round5(mid * rng.gen_range(-0.01..=0.01));

            Quote {
                pair,
                base: pair.base(),
                quote: pair.quote(),
                bid: round5(mid - half),
                ask: round5(mid + half),
                spread: pair.spread(),
                change_24h,
                change_percent: round3(change_24h / mid * 100.0),
            }
        })
        .collect()
}

/// Mid prices seeded from the hardcoded fallback table
pub fn fallback_mids() -> MidPrices {
    Pair::ALL.iter().map(|&p| (p, p.fallback_mid())).collect()
}
