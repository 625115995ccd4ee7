//! econ-runner: headless operations runner for the Iron Grind economy.
//!
//! Usage:
//!   econ-runner --db econ.db --stats
//!   econ-runner --db econ.db --collect
//!   econ-runner --db econ.db --interval-secs 3600
//!   econ-runner --db econ.db --bootstrap-owner 1234 "Head Coach"

use anyhow::Result;
use irongrind_core::{config::EconConfig, engine::EconEngine, store::EconStore};
use std::env;
use std::thread;
use std::time::Duration;

#[derive(serde::Serialize)]
struct CollectSummary {
    at: String,
    groups_credited: usize,
    accounts_scanned: usize,
    total_credited: i64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or("econ.db");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());
    let interval_secs: Option<u64> = args
        .windows(2)
        .find(|w| w[0] == "--interval-secs")
        .and_then(|w| w[1].parse().ok());
    let show_stats = args.iter().any(|a| a == "--stats");
    let collect_once = args.iter().any(|a| a == "--collect");

    let config = match config_path {
        Some(path) => EconConfig::load(path)?,
        None => EconConfig::default(),
    };

    let store = EconStore::open(db)?;
    store.migrate()?;
    let engine = EconEngine::with_system_clock(store, config);

    if let Some(pos) = args.iter().position(|a| a == "--bootstrap-owner") {
        bootstrap_owner(&engine, &args[pos + 1..])?;
    }

    if show_stats {
        let stats = engine.stats()?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    if collect_once {
        run_collection(&engine)?;
    }

    if let Some(secs) = interval_secs {
        log::info!("collecting business income every {secs}s (db: {db})");
        loop {
            thread::sleep(Duration::from_secs(secs));
            if let Err(e) = run_collection(&engine) {
                log::error!("collection failed: {e:#}");
            }
        }
    }

    Ok(())
}

fn run_collection(engine: &EconEngine) -> Result<()> {
    let report = engine.collect_business_income()?;
    let summary = CollectSummary {
        at: chrono::Utc::now().to_rfc3339(),
        groups_credited: report.groups_credited,
        accounts_scanned: report.accounts_scanned,
        total_credited: report.total_credited,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Seed the first operator at the top of the moderation ladder. Later
/// promotions go through the engine; this only exists because a fresh
/// database has nobody who could grant the first level.
fn bootstrap_owner(engine: &EconEngine, rest: &[String]) -> Result<()> {
    let account_id: i64 = rest
        .first()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("--bootstrap-owner needs an account id"))?;
    let username = rest
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("owner");

    engine.register(account_id, username)?;
    engine
        .store()
        .set_mod_level(account_id, 2, Some("owner"), chrono::Utc::now())?;
    log::info!("bootstrapped owner account {account_id} ({username})");
    Ok(())
}
