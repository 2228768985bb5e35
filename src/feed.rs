//! Feed engine
//!
//! Single owner of the authoritative mid-price state. Two independent
//! cadences mutate it: the slow provider refresh (which runs the fallback
//! chain in a spawned task so a slow response never blocks the fast path)
//! and the fast jitter tick. All state access happens on one task, so a
//! refresh can never interleave with a jitter tick mid-update.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::FeedConfig;
use crate::providers::{fetch_with_fallback, MidPrices, ProviderError, RateProvider};
use crate::synth::{fallback_mids, round5, synthesize};
use crate::types::{FeedSnapshot, FeedStatus};

/// Error string surfaced to consumers while serving cached mids
pub const STALE_RATES_MSG: &str = "live rates unavailable, showing cached rates";

type FetchOutcome = Result<(MidPrices, &'static str), ProviderError>;

/// Mid-price state plus the flags derived from refresh outcomes
///
/// Kept separate from the timer loop so the transitions are testable
/// without timers.
pub(crate) struct EngineState {
    mids: MidPrices,
    status: FeedStatus,
    loading: bool,
    error: Option<String>,
    jitter_max_pct: f64,
}

impl EngineState {
    pub(crate) fn new(jitter_max_pct: f64) -> Self {
        Self {
            mids: fallback_mids(),
            status: FeedStatus::Initializing,
            loading: true,
            error: None,
            jitter_max_pct,
        }
    }

    pub(crate) fn status(&self) -> FeedStatus {
        self.status
    }

    pub(crate) fn mids(&self) -> &MidPrices {
        &self.mids
    }

    /// Perturb every mid by a uniform draw within the jitter bound
    pub(crate) fn apply_jitter<R: Rng>(&mut self, rng: &mut R) {
        let max = self.jitter_max_pct;
        for mid in self.mids.values_mut() {
            *mid = round5(*mid * (1.0 + rng.gen_range(-max..=max)));
        }
    }

    /// Fold a refresh cycle's outcome into the state
    ///
    /// On success every mid is overwritten; on chain exhaustion the mids are
    /// left untouched and only the error flag changes. Loading clears either
    /// way and never comes back.
    pub(crate) fn apply_refresh_outcome(&mut self, outcome: FetchOutcome) {
        let previous = self.status;
        match outcome {
            Ok((mids, provider)) => {
                self.mids = mids;
                self.error = None;
                self.status = FeedStatus::Live;
                if previous != FeedStatus::Live {
                    info!(provider, from = %previous, "Feed is live");
                } else {
                    debug!(provider, "Rates refreshed");
                }
            }
            Err(e) => {
                self.error = Some(STALE_RATES_MSG.to_string());
                self.status = FeedStatus::Degraded;
                error!(error = %e, from = %previous, "All rate providers failed, serving cached mids");
            }
        }
        self.loading = false;
    }

    pub(crate) fn snapshot<R: Rng>(&self, rng: &mut R) -> FeedSnapshot {
        FeedSnapshot {
            quotes: synthesize(&self.mids, rng),
            loading: self.loading,
            error: self.error.clone(),
            updated_at: chrono::Utc::now(),
        }
    }
}

/// Read-only consumer boundary
///
/// Clones of the watch receiver double as the change-notification
/// mechanism: every jitter tick and refresh publishes a new snapshot.
#[derive(Clone)]
pub struct FeedHandle {
    snapshot_rx: watch::Receiver<FeedSnapshot>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl FeedHandle {
    /// Current snapshot
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop both timers; no further snapshots are published
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// The rate feed engine
pub struct FeedEngine {
    config: FeedConfig,
    providers: Arc<Vec<Arc<dyn RateProvider>>>,
}

impl FeedEngine {
    pub fn new(config: FeedConfig, providers: Vec<Arc<dyn RateProvider>>) -> Self {
        Self {
            config,
            providers: Arc::new(providers),
        }
    }

    /// Start the owner task and hand back the consumer boundary
    ///
    /// The initial snapshot derives from the fallback mids, so consumers
    /// have a full quote set before any network call completes.
    pub fn spawn(self) -> FeedHandle {
        let mut rng = StdRng::from_entropy();
        let state = EngineState::new(self.config.jitter_max_pct);

        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot(&mut rng));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(run_loop(
            state,
            rng,
            self.config,
            self.providers,
            snapshot_tx,
            shutdown_rx,
        ));

        FeedHandle {
            snapshot_rx,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }
}

async fn run_loop(
    mut state: EngineState,
    mut rng: StdRng,
    config: FeedConfig,
    providers: Arc<Vec<Arc<dyn RateProvider>>>,
    snapshot_tx: watch::Sender<FeedSnapshot>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // First refresh fires immediately; the first jitter tick waits a full
    // period so the startup snapshot is the untouched fallback table.
    let mut refresh = interval(Duration::from_secs(config.refresh_secs));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let jitter_period = Duration::from_millis(config.jitter_ms);
    let mut jitter = interval_at(Instant::now() + jitter_period, jitter_period);
    jitter.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let (outcome_tx, mut outcome_rx) = mpsc::channel::<FetchOutcome>(1);
    let mut refresh_in_flight = false;

    info!(
        refresh_secs = config.refresh_secs,
        jitter_ms = config.jitter_ms,
        providers = providers.len(),
        pairs = state.mids().len(),
        "Feed engine started"
    );

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                if refresh_in_flight {
                    debug!("Refresh still in flight, skipping this cycle");
                    continue;
                }
                refresh_in_flight = true;
                let providers = Arc::clone(&providers);
                let outcome_tx = outcome_tx.clone();
                tokio::spawn(async move {
                    let outcome = fetch_with_fallback(&providers).await;
                    let _ = outcome_tx.send(outcome).await;
                });
            }
            Some(outcome) = outcome_rx.recv() => {
                refresh_in_flight = false;
                state.apply_refresh_outcome(outcome);
                let _ = snapshot_tx.send(state.snapshot(&mut rng));
            }
            _ = jitter.tick() => {
                state.apply_jitter(&mut rng);
                let _ = snapshot_tx.send(state.snapshot(&mut rng));
            }
            // Fires on explicit shutdown and when the last handle is dropped
            _ = shutdown_rx.changed() => {
                info!(status = %state.status(), "Feed engine stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mids_of(value: f64) -> MidPrices {
        Pair::ALL.iter().map(|&p| (p, value)).collect()
    }

    #[test]
    fn test_initial_state_serves_fallback_mids() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = EngineState::new(0.0015);
        let snapshot = state.snapshot(&mut rng);

        assert!(snapshot.loading);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.quotes.len(), Pair::ALL.len());
        assert_eq!(state.status(), FeedStatus::Initializing);
    }

    #[test]
    fn test_refresh_success_overwrites_all_mids() {
        let mut state = EngineState::new(0.0015);
        state.apply_refresh_outcome(Ok((mids_of(2.0), "frankfurter")));

        assert_eq!(state.status(), FeedStatus::Live);
        for pair in Pair::ALL {
            assert_eq!(state.mids()[&pair], 2.0);
        }

        let mut rng = StdRng::seed_from_u64(1);
        let snapshot = state.snapshot(&mut rng);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_chain_exhaustion_keeps_mids_and_sets_error() {
        let mut state = EngineState::new(0.0015);
        let before = state.mids().clone();

        state.apply_refresh_outcome(Err(ProviderError::MissingRate("ILS")));

        assert_eq!(state.status(), FeedStatus::Degraded);
        assert_eq!(state.mids(), &before);

        let mut rng = StdRng::seed_from_u64(1);
        let snapshot = state.snapshot(&mut rng);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some(STALE_RATES_MSG));
    }

    #[test]
    fn test_degraded_recovers_to_live() {
        let mut state = EngineState::new(0.0015);
        state.apply_refresh_outcome(Err(ProviderError::MissingRate("ILS")));
        assert_eq!(state.status(), FeedStatus::Degraded);

        state.apply_refresh_outcome(Ok((mids_of(3.0), "open-er-api")));
        assert_eq!(state.status(), FeedStatus::Live);

        let mut rng = StdRng::seed_from_u64(1);
        assert!(state.snapshot(&mut rng).error.is_none());
    }

    #[test]
    fn test_jitter_stays_within_bound() {
        let max_pct = 0.0015;
        let mut state = EngineState::new(max_pct);
        let before = state.mids().clone();

        let mut rng = StdRng::seed_from_u64(1234);
        state.apply_jitter(&mut rng);

        for pair in Pair::ALL {
            let old = before[&pair];
            let new = state.mids()[&pair];
            // round5 can add at most half a unit in the 5th decimal
            assert!(
                (new - old).abs() <= old * max_pct + 1e-5,
                "{pair}: {old} -> {new} exceeds jitter bound"
            );
        }
    }

    #[test]
    fn test_jitter_does_not_touch_flags() {
        let mut state = EngineState::new(0.0015);
        state.apply_refresh_outcome(Err(ProviderError::MissingRate("JPY")));

        let mut rng = StdRng::seed_from_u64(5);
        state.apply_jitter(&mut rng);

        let snapshot = state.snapshot(&mut rng);
        assert_eq!(snapshot.error.as_deref(), Some(STALE_RATES_MSG));
        assert_eq!(state.status(), FeedStatus::Degraded);
    }
}
