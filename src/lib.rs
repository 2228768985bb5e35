//! fxfeed library
//!
//! Simulated FX quote feed: provider chain with fallback, quote synthesis,
//! and a two-timer feed engine publishing snapshots to consumers.

pub mod config;
pub mod feed;
pub mod providers;
pub mod synth;
pub mod types;
