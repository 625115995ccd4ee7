//! Shared test harness: in-memory store, manual clock, default catalog.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use irongrind_core::clock::ManualClock;
use irongrind_core::config::EconConfig;
use irongrind_core::engine::EconEngine;
use irongrind_core::store::EconStore;
use irongrind_core::types::{AccountId, Coins, TxCategory};
use std::sync::Arc;

pub fn engine() -> (EconEngine, Arc<ManualClock>) {
    let store = EconStore::in_memory().expect("in-memory store");
    store.migrate().expect("migrations apply");
    let clock = Arc::new(ManualClock::fixed());
    let engine = EconEngine::new(store, EconConfig::default(), clock.clone());
    (engine, clock)
}

/// Register an account and top its balance up to a known amount.
pub fn funded_account(engine: &EconEngine, id: AccountId, coins: Coins) -> AccountId {
    engine
        .register(id, &format!("player{id}"))
        .expect("register");
    if coins > 0 {
        engine
            .store()
            .mutate_balance(
                id,
                coins,
                TxCategory::AdminAdd,
                "test funding",
                None,
                None,
                now(engine),
            )
            .expect("fund");
    }
    id
}

/// Promote an account to the given moderation level.
pub fn moderator(engine: &EconEngine, id: AccountId, level: i64) -> AccountId {
    engine.register(id, &format!("mod{id}")).expect("register");
    engine
        .store()
        .set_mod_level(id, level, None, now(engine))
        .expect("set mod level");
    id
}

pub fn now(engine: &EconEngine) -> DateTime<Utc> {
    // Any fixed instant works for store-level setup calls.
    let _ = engine;
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn balance(engine: &EconEngine, id: AccountId) -> Coins {
    engine
        .store()
        .account(id)
        .expect("query account")
        .expect("account exists")
        .balance
}
