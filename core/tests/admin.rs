//! Moderation: forced state, bans, and the moderation ladder.

mod common;

use chrono::Duration;
use common::{balance, engine, funded_account, moderator};
use irongrind_core::error::EconError;
use irongrind_core::types::TxCategory;

#[test]
fn set_balance_lands_as_a_delta_in_the_ledger() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 500);

    engine.admin_set_balance(operator, target, 300).unwrap();

    assert_eq!(balance(&engine, target), 300);
    let row = &engine.history(target, 1).unwrap()[0];
    assert_eq!(row.category, TxCategory::AdminSet);
    assert_eq!(row.amount, -201); // 501 -> 300
    assert_eq!(row.operator_id, Some(operator));
}

#[test]
fn remove_balance_may_go_negative() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 100);

    engine.admin_remove_balance(operator, target, 500).unwrap();

    assert_eq!(balance(&engine, target), -399);
}

#[test]
fn non_moderators_cannot_force_state() {
    let (engine, _clock) = engine();
    let player = funded_account(&engine, 1, 500);
    let other = funded_account(&engine, 2, 0);

    assert!(matches!(
        engine.admin_add_balance(player, other, 100),
        Err(EconError::PermissionDenied)
    ));
}

#[test]
fn granted_tool_level_takes_effect_and_counts_for_the_operator() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 0);

    engine.admin_set_tool_level(operator, target, 5).unwrap();

    let row = engine.store().account(target).unwrap().unwrap();
    assert_eq!(row.tool_level, 5);
    assert_eq!(row.tool_name, "25 kg dumbbell");
    let op_row = engine.store().account(operator).unwrap().unwrap();
    assert_eq!(op_row.tools_granted, 1);

    assert!(matches!(
        engine.admin_set_tool_level(operator, target, 21),
        Err(EconError::Validation(_))
    ));
}

#[test]
fn override_income_must_be_positive_when_set() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 0);

    assert!(matches!(
        engine.admin_set_override_income(operator, target, Some(0)),
        Err(EconError::Validation(_))
    ));
    engine
        .admin_set_override_income(operator, target, Some(50))
        .unwrap();
    engine
        .admin_set_override_income(operator, target, None)
        .unwrap();
    let row = engine.store().account(target).unwrap().unwrap();
    assert_eq!(row.override_income, None);
}

#[test]
fn ban_blocks_play_until_unbanned() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 0);

    engine.ban(operator, target, "botting", None).unwrap();
    assert!(matches!(
        engine.use_tool(target),
        Err(EconError::Banned(_))
    ));
    let op_row = engine.store().account(operator).unwrap().unwrap();
    assert_eq!(op_row.permabans_issued, 1);

    engine.unban(operator, target).unwrap();
    engine.use_tool(target).unwrap();
}

#[test]
fn a_timed_ban_clears_itself_after_expiry() {
    let (engine, clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 0);

    engine.ban(operator, target, "abuse", Some(2)).unwrap();
    let op_row = engine.store().account(operator).unwrap().unwrap();
    assert_eq!(op_row.bans_issued, 1);

    clock.advance(Duration::days(1));
    assert!(matches!(
        engine.use_tool(target),
        Err(EconError::Banned(_))
    ));

    clock.advance(Duration::days(2));
    engine.use_tool(target).unwrap();
    let row = engine.store().account(target).unwrap().unwrap();
    assert!(!row.is_banned);
    assert_eq!(row.ban_reason, None);
}

#[test]
fn banning_twice_is_a_conflict() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 0);

    engine.ban(operator, target, "abuse", None).unwrap();
    assert!(matches!(
        engine.ban(operator, target, "abuse", None),
        Err(EconError::Conflict(_))
    ));
}

#[test]
fn moderators_cannot_ban_their_peers_or_themselves() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let peer = moderator(&engine, 8, 1);

    assert!(matches!(
        engine.ban(operator, peer, "feud", None),
        Err(EconError::PermissionDenied)
    ));
    assert!(matches!(
        engine.ban(operator, operator, "oops", None),
        Err(EconError::Validation(_))
    ));
}

#[test]
fn the_ladder_only_grants_levels_below_ones_own() {
    let (engine, _clock) = engine();
    let owner = moderator(&engine, 9, 2);
    let target = funded_account(&engine, 1, 0);

    engine
        .make_moderator(owner, target, 1, Some("staff"))
        .unwrap();
    let row = engine.store().account(target).unwrap().unwrap();
    assert_eq!(row.mod_level, 1);
    assert_eq!(row.mod_tag.as_deref(), Some("staff"));

    // An equal-or-higher grant is refused, as is granting by a level-1.
    assert!(matches!(
        engine.make_moderator(owner, target, 2, None),
        Err(EconError::PermissionDenied)
    ));
    let junior = funded_account(&engine, 2, 0);
    assert!(matches!(
        engine.make_moderator(target, junior, 1, None),
        Err(EconError::PermissionDenied)
    ));
}

#[test]
fn group_rename_changes_the_name_but_never_the_tag() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let owner = funded_account(&engine, 1, 2_000);
    let other = funded_account(&engine, 2, 2_000);
    let group = engine.create_group(owner, "IRON", "Iron Temple").unwrap();
    engine.create_group(other, "STEEL", "Steel Hall").unwrap();

    engine.rename_group(operator, "iron", "Iron Palace").unwrap();

    let row = engine.store().group(group.group_id).unwrap().unwrap();
    assert_eq!(row.name, "Iron Palace");
    assert_eq!(row.tag, "IRON");

    assert!(matches!(
        engine.rename_group(operator, "IRON", "Steel Hall"),
        Err(EconError::Conflict(_))
    ));
    assert!(matches!(
        engine.rename_group(owner, "IRON", "Iron Castle"),
        Err(EconError::PermissionDenied)
    ));
    assert!(matches!(
        engine.rename_group(operator, "IRON", "x"),
        Err(EconError::Validation(_))
    ));
}

#[test]
fn removing_a_moderator_drops_them_to_zero() {
    let (engine, _clock) = engine();
    let owner = moderator(&engine, 9, 2);
    let staff = moderator(&engine, 8, 1);

    engine.remove_moderator(owner, staff).unwrap();

    let row = engine.store().account(staff).unwrap().unwrap();
    assert_eq!(row.mod_level, 0);
    let player = funded_account(&engine, 1, 0);
    assert!(matches!(
        engine.remove_moderator(owner, player),
        Err(EconError::Conflict(_))
    ));
}

#[test]
fn forced_rename_validates_like_a_self_rename() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let target = funded_account(&engine, 1, 0);

    assert!(matches!(
        engine.admin_rename(operator, target, "x"),
        Err(EconError::Validation(_))
    ));
    engine.admin_rename(operator, target, "Clean Name").unwrap();

    let row = engine.store().account(target).unwrap().unwrap();
    assert_eq!(row.username, "Clean Name");
    let op_row = engine.store().account(operator).unwrap().unwrap();
    assert_eq!(op_row.renames_issued, 1);
}
