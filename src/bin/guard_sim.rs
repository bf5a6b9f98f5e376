//! Stale-response soak against the simulated classifier.
//!
//! Fires bursts of overlapping dispatches with random inputs and random
//! response latency, then checks that the view ends on the last dispatch of
//! every burst.
//! Run with: SIM_LATENCY_MS=5,300 cargo run --bin guard_sim

use anyhow::{anyhow, Result};
use irisfx::config::Config;
use irisfx::dispatch::{DispatchOutcome, Dispatcher};
use irisfx::logging::{log, obj, Domain, Level};
use irisfx::measurements::{Feature, Sliders};
use irisfx::render::ViewState;
use irisfx::service::SimulatedService;
use rand::Rng;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env()?;
    let bursts: usize = std::env::var("BURSTS").ok().and_then(|v| v.parse().ok()).unwrap_or(20);
    let burst_size: usize = std::env::var("BURST_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(8);
    if burst_size == 0 {
        return Err(anyhow!("BURST_SIZE must be at least 1"));
    }

    let view = Arc::new(Mutex::new(ViewState::default()));
    let dispatcher = Dispatcher::new(Arc::new(SimulatedService::new(cfg.sim_latency_ms)), view.clone())
        .cancel_superseded(cfg.cancel_superseded);
    let mut rng = rand::thread_rng();
    let mut sliders = Sliders::default();

    let (mut applied, mut superseded, mut failed) = (0usize, 0usize, 0usize);
    for burst in 0..bursts {
        let mut handles = Vec::with_capacity(burst_size);
        let mut last_input = sliders.snapshot();
        for _ in 0..burst_size {
            for feature in Feature::ALL {
                let (lo, hi) = feature.range();
                sliders.set(feature, rng.gen_range(lo..=hi))?;
            }
            last_input = sliders.snapshot();
            handles.push(dispatcher.dispatch(last_input));
            sleep(Duration::from_millis(rng.gen_range(0..10))).await;
        }

        for handle in handles {
            match handle.outcome().await {
                DispatchOutcome::Applied(_) => applied += 1,
                DispatchOutcome::Superseded(_) => superseded += 1,
                DispatchOutcome::Failed(..) => failed += 1,
            }
        }

        let shown = view
            .lock()
            .map_err(|_| anyhow!("view lock poisoned"))?
            .current()
            .map(|v| v.input);
        if shown != Some(last_input) {
            return Err(anyhow!(
                "burst {}: view shows {:?}, last dispatch was {:?}",
                burst,
                shown,
                last_input
            ));
        }
    }

    log(
        Level::Info,
        Domain::Guard,
        "soak_summary",
        obj(&[
            ("bursts", json!(bursts)),
            ("dispatched", json!(bursts * burst_size)),
            ("applied", json!(applied)),
            ("superseded", json!(superseded)),
            ("failed", json!(failed)),
        ]),
    );
    println!(
        "{} dispatches: {} applied, {} superseded, {} failed; view always ended on the last dispatch",
        bursts * burst_size,
        applied,
        superseded,
        failed
    );
    Ok(())
}
