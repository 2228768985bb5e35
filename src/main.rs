//! fxfeed console front end
//!
//! Spawns the feed engine and renders each published snapshot as a quote
//! table until Ctrl-C.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fxfeed::config::AppConfig;
use fxfeed::feed::FeedEngine;
use fxfeed::providers::build_chain;
use fxfeed::types::FeedSnapshot;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    info!(config = %config.digest(), "Starting fxfeed");

    let providers = build_chain(&config.providers)?;
    let handle = FeedEngine::new(config.feed, providers).spawn();
    let mut updates = handle.subscribe();

    render(&updates.borrow());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&updates.borrow());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                handle.shutdown();
                break;
            }
        }
    }

    Ok(())
}

fn render(snapshot: &FeedSnapshot) {
    println!();
    println!(
        "{:<9} {:>12} {:>12} {:>10} {:>8}",
        "PAIR", "BID", "ASK", "24H", "24H%"
    );
    for q in &snapshot.quotes {
        println!(
            "{:<9} {:>12.5} {:>12.5} {:>+10.5} {:>+7.3}%",
            q.pair, q.bid, q.ask, q.change_24h, q.change_percent
        );
    }
    if snapshot.loading {
        println!("(loading live rates...)");
    }
    if let Some(err) = &snapshot.error {
        println!("(!) {err}");
    }
}
