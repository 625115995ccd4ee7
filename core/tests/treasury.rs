//! Groups and treasuries: the per-lift split, deposits, level upgrades,
//! distribution, and the scheduled business income collection.

mod common;

use common::{balance, engine, funded_account};
use irongrind_core::clock::ManualClock;
use irongrind_core::config::EconConfig;
use irongrind_core::engine::EconEngine;
use irongrind_core::error::EconError;
use irongrind_core::store::EconStore;
use irongrind_core::treasury::{additional_lift_bonus, group_bonuses};
use irongrind_core::types::TreasuryCategory;
use std::sync::Arc;

#[test]
fn bonuses_derive_linearly_from_level() {
    assert_eq!(group_bonuses(1).business_bonus_percent, 5);
    assert_eq!(group_bonuses(1).lift_bonus_coins, 1);
    assert_eq!(group_bonuses(4).business_bonus_percent, 8);
    assert_eq!(group_bonuses(4).lift_bonus_coins, 4);
}

#[test]
fn additional_lift_bonus_steps_with_tool_level() {
    assert_eq!(additional_lift_bonus(1), 1);
    assert_eq!(additional_lift_bonus(4), 1);
    assert_eq!(additional_lift_bonus(5), 2);
    assert_eq!(additional_lift_bonus(9), 2);
    assert_eq!(additional_lift_bonus(10), 3);
    assert_eq!(additional_lift_bonus(14), 3);
    assert_eq!(additional_lift_bonus(15), 4);
    assert_eq!(additional_lift_bonus(20), 4);
}

#[test]
fn creating_a_group_charges_the_founder_and_seats_them_as_owner() {
    let (engine, _clock) = engine();
    let id = funded_account(&engine, 1, 2_000);

    let group = engine.create_group(id, "IRON", "Iron Temple").unwrap();

    assert_eq!(group.tag, "IRON");
    assert_eq!(group.level, 1);
    assert_eq!(group.treasury, 0);
    assert_eq!(balance(&engine, id), 1_001); // 2001 - 1000 creation cost
    let membership = engine.store().member(id).unwrap().unwrap();
    assert_eq!(membership.group_id, group.group_id);
    let account = engine.store().account(id).unwrap().unwrap();
    assert_eq!(account.group_id, Some(group.group_id));
}

#[test]
fn duplicate_tag_is_a_conflict_even_with_different_case() {
    let (engine, _clock) = engine();
    let a = funded_account(&engine, 1, 2_000);
    let b = funded_account(&engine, 2, 2_000);
    engine.create_group(a, "IRON", "Iron Temple").unwrap();

    let result = engine.create_group(b, "iron", "Other Temple");

    assert!(matches!(result, Err(EconError::Conflict(_))));
}

#[test]
fn lift_in_a_level_one_group_pays_eleven_and_banks_two() {
    let (engine, _clock) = engine();
    let id = funded_account(&engine, 1, 2_000);
    let group = engine.create_group(id, "IRON", "Iron Temple").unwrap();
    let before = balance(&engine, id);

    let outcome = engine.use_tool(id).unwrap();

    // Level-1 tool pays 10; level-1 group adds +1 for the player and
    // banks 1 (lift bonus) + 1 (tool-level bonus) for the treasury.
    assert_eq!(outcome.player_gain, 11);
    assert_eq!(outcome.group_share, 2);
    assert_eq!(balance(&engine, id), before + 11);

    let group = engine.store().group(group.group_id).unwrap().unwrap();
    assert_eq!(group.treasury, 2);
    assert_eq!(group.total_lifts, 1);
    let lift_logs = engine
        .store()
        .treasury_log_count(group.group_id, TreasuryCategory::LiftIncome)
        .unwrap();
    assert_eq!(lift_logs, 1, "one treasury log entry per lift");
}

#[test]
fn joining_and_leaving_a_group() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 2_000);
    let member = funded_account(&engine, 2, 0);
    engine.create_group(owner, "IRON", "Iron Temple").unwrap();

    engine.join_group(member, "iron").unwrap();
    assert!(engine.store().member(member).unwrap().is_some());

    engine.leave_group(member).unwrap();
    assert!(engine.store().member(member).unwrap().is_none());
    let account = engine.store().account(member).unwrap().unwrap();
    assert_eq!(account.group_id, None);
}

#[test]
fn the_owner_cannot_leave_their_group() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 2_000);
    engine.create_group(owner, "IRON", "Iron Temple").unwrap();

    assert!(matches!(
        engine.leave_group(owner),
        Err(EconError::Conflict(_))
    ));
}

#[test]
fn deposit_moves_coins_and_tracks_contribution() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 2_000);
    let group = engine.create_group(owner, "IRON", "Iron Temple").unwrap();

    engine.deposit_to_treasury(owner, 500).unwrap();

    assert_eq!(balance(&engine, owner), 501);
    let group = engine.store().group(group.group_id).unwrap().unwrap();
    assert_eq!(group.treasury, 500);
    let membership = engine.store().member(owner).unwrap().unwrap();
    assert_eq!(membership.contributions, 500);
    let deposits = engine
        .store()
        .treasury_log_count(group.group_id, TreasuryCategory::Deposit)
        .unwrap();
    assert_eq!(deposits, 1);
}

#[test]
fn group_upgrade_costs_base_times_level_from_the_treasury() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 15_000);
    let group = engine.create_group(owner, "IRON", "Iron Temple").unwrap();
    engine.deposit_to_treasury(owner, 12_000).unwrap();

    let upgrade = engine.upgrade_group(owner).unwrap();
    assert_eq!(upgrade.cost, 5_000, "base cost at level 1");
    assert_eq!(upgrade.level, 2);

    let group_row = engine.store().group(group.group_id).unwrap().unwrap();
    assert_eq!(group_row.treasury, 7_000);

    // Next level costs base × 2; 7000 is not enough for 10000.
    let result = engine.upgrade_group(owner);
    assert!(matches!(
        result,
        Err(EconError::Insufficient { needed: 10_000, .. })
    ));
}

#[test]
fn only_owner_or_officer_may_upgrade() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 10_000);
    let member = funded_account(&engine, 2, 0);
    engine.create_group(owner, "IRON", "Iron Temple").unwrap();
    engine.join_group(member, "IRON").unwrap();
    engine.deposit_to_treasury(owner, 6_000).unwrap();

    assert!(matches!(
        engine.upgrade_group(member),
        Err(EconError::PermissionDenied)
    ));
}

#[test]
fn distribution_splits_equally_and_keeps_the_remainder() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 5_000);
    let a = funded_account(&engine, 2, 0);
    let b = funded_account(&engine, 3, 0);
    let group = engine.create_group(owner, "IRON", "Iron Temple").unwrap();
    engine.join_group(a, "IRON").unwrap();
    engine.join_group(b, "IRON").unwrap();
    engine.deposit_to_treasury(owner, 1_000).unwrap();

    let distribution = engine.distribute_treasury(owner, 100).unwrap();

    assert_eq!(distribution.members, 3);
    assert_eq!(distribution.share, 33);
    assert_eq!(distribution.distributed, 99);
    assert_eq!(balance(&engine, a), 34); // 1 starting + 33
    assert_eq!(balance(&engine, b), 34);
    let group = engine.store().group(group.group_id).unwrap().unwrap();
    assert_eq!(group.treasury, 901, "remainder of 1 stays banked");
}

#[test]
fn collection_credits_each_group_once_with_the_floored_percentage() {
    let (engine, _clock) = engine();
    // Group ALPHA: one member with business 1 (income 100 at level 1).
    let alpha_owner = funded_account(&engine, 1, 10_000);
    let alpha = engine.create_group(alpha_owner, "ALPHA", "First Group").unwrap();
    engine.buy_business(alpha_owner, 1).unwrap();

    // Group BETA: two members, incomes 100 and 350.
    let beta_owner = funded_account(&engine, 2, 10_000);
    let beta_member = funded_account(&engine, 3, 25_000);
    let beta = engine.create_group(beta_owner, "BETA", "Second Group").unwrap();
    engine.join_group(beta_member, "BETA").unwrap();
    engine.buy_business(beta_owner, 1).unwrap();
    engine.buy_business(beta_member, 2).unwrap();

    // An ungrouped business owner contributes nothing.
    let loner = funded_account(&engine, 4, 10_000);
    engine.buy_business(loner, 1).unwrap();

    let report = engine.collect_business_income().unwrap();

    assert_eq!(report.groups_credited, 2);
    assert_eq!(report.accounts_scanned, 3);
    // 5% of 100 = 5 for ALPHA; 5% of 100 + 5% of 350 = 5 + 17 for BETA.
    assert_eq!(report.total_credited, 27);

    let alpha_row = engine.store().group(alpha.group_id).unwrap().unwrap();
    assert_eq!(alpha_row.treasury, 5);
    assert_eq!(alpha_row.total_income_per_hour, 5);

    let beta_row = engine.store().group(beta.group_id).unwrap().unwrap();
    assert_eq!(beta_row.treasury, 22);

    for group_id in [alpha.group_id, beta.group_id] {
        let logs = engine
            .store()
            .treasury_log_count(group_id, TreasuryCategory::BusinessIncome)
            .unwrap();
        assert_eq!(logs, 1, "exactly one log entry per group per run");
    }
}

#[test]
fn collection_leaves_groups_with_a_zero_cut_untouched() {
    let store = EconStore::in_memory().expect("in-memory store");
    store.migrate().expect("migrations apply");
    let mut config = EconConfig::default();
    // 5% of 10 floors to 0.
    config.businesses[0].base_income = 10;
    config.businesses[0].income_increase = 0;
    let engine = EconEngine::new(store, config, Arc::new(ManualClock::fixed()));

    let owner = funded_account(&engine, 1, 10_000);
    let group = engine.create_group(owner, "IRON", "Iron Temple").unwrap();
    engine.buy_business(owner, 1).unwrap();

    let report = engine.collect_business_income().unwrap();

    assert_eq!(report.groups_credited, 0);
    assert_eq!(report.accounts_scanned, 1);
    assert_eq!(report.total_credited, 0);
    let row = engine.store().group(group.group_id).unwrap().unwrap();
    assert_eq!(row.treasury, 0);
    assert_eq!(row.total_income_per_hour, 0, "gauge untouched");
    let logs = engine
        .store()
        .treasury_log_count(group.group_id, TreasuryCategory::BusinessIncome)
        .unwrap();
    assert_eq!(logs, 0, "no zero-amount log entries");
}

#[test]
fn collection_gauge_reflects_the_latest_run_not_a_running_total() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 10_000);
    let group = engine.create_group(owner, "IRON", "Iron Temple").unwrap();
    engine.buy_business(owner, 1).unwrap();

    engine.collect_business_income().unwrap();
    engine.collect_business_income().unwrap();

    let row = engine.store().group(group.group_id).unwrap().unwrap();
    assert_eq!(row.treasury, 10, "two runs bank 5 each");
    assert_eq!(row.total_income_per_hour, 5, "gauge is set, not summed");
}

#[test]
fn group_profile_reports_bonuses_and_upgrade_cost() {
    let (engine, _clock) = engine();
    let owner = funded_account(&engine, 1, 2_000);
    engine.create_group(owner, "IRON", "Iron Temple").unwrap();

    let profile = engine.group_profile("iron").unwrap();

    assert_eq!(profile.group.tag, "IRON");
    assert_eq!(profile.members.len(), 1);
    assert_eq!(profile.bonuses.business_bonus_percent, 5);
    assert_eq!(profile.upgrade_cost, 5_000);
}
