//! Redeemable codes: creation rules, the fixed validation order, and the
//! atomic redemption.

mod common;

use chrono::Duration;
use common::{balance, engine, funded_account, moderator};
use irongrind_core::error::EconError;
use irongrind_core::types::RewardKind;

#[test]
fn redeeming_credits_the_reward_and_decrements_the_pool() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let player = funded_account(&engine, 1, 0);
    engine
        .create_promo(operator, "WELCOME", 10, RewardKind::Coins, 250, None)
        .unwrap();

    let outcome = engine.redeem_code(player, "welcome").unwrap();

    assert_eq!(outcome.amount, 250);
    assert_eq!(outcome.uses_left, 9);
    assert_eq!(balance(&engine, player), 251);
    let promo = engine.store().promo("WELCOME").unwrap().unwrap();
    assert_eq!(promo.uses_left, 9);
    let account = engine.store().account(player).unwrap().unwrap();
    assert_eq!(account.total_earned, 250, "coin rewards count as earned");
}

#[test]
fn token_codes_credit_the_token_balance() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let player = funded_account(&engine, 1, 0);
    engine
        .create_promo(operator, "TOKENS5", 1, RewardKind::Tokens, 5, None)
        .unwrap();

    engine.redeem_code(player, "TOKENS5").unwrap();

    let account = engine.store().account(player).unwrap().unwrap();
    assert_eq!(account.tokens, 5);
    assert_eq!(account.total_earned, 0);
}

#[test]
fn double_redemption_is_a_conflict_and_decrements_only_once() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let player = funded_account(&engine, 1, 0);
    engine
        .create_promo(operator, "ONCE", 10, RewardKind::Coins, 100, None)
        .unwrap();

    engine.redeem_code(player, "ONCE").unwrap();
    let second = engine.redeem_code(player, "ONCE");

    assert!(matches!(second, Err(EconError::Conflict(_))));
    let promo = engine.store().promo("ONCE").unwrap().unwrap();
    assert_eq!(promo.uses_left, 9, "failed retry must not burn a use");
    assert_eq!(balance(&engine, player), 101, "credited exactly once");
}

#[test]
fn unknown_code_is_not_found() {
    let (engine, _clock) = engine();
    let player = funded_account(&engine, 1, 0);

    assert!(matches!(
        engine.redeem_code(player, "GHOST"),
        Err(EconError::CodeNotFound(_))
    ));
}

#[test]
fn expired_code_is_rejected() {
    let (engine, clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let player = funded_account(&engine, 1, 0);
    engine
        .create_promo(operator, "SHORT", 10, RewardKind::Coins, 100, Some(2))
        .unwrap();

    clock.advance(Duration::days(3));

    assert!(matches!(
        engine.redeem_code(player, "SHORT"),
        Err(EconError::Validation(_))
    ));
    assert_eq!(balance(&engine, player), 1);
}

#[test]
fn exhausted_pool_is_a_conflict() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let first = funded_account(&engine, 1, 0);
    let second = funded_account(&engine, 2, 0);
    engine
        .create_promo(operator, "SINGLE", 1, RewardKind::Coins, 100, None)
        .unwrap();

    engine.redeem_code(first, "SINGLE").unwrap();

    assert!(matches!(
        engine.redeem_code(second, "SINGLE"),
        Err(EconError::Conflict(_))
    ));
    assert_eq!(balance(&engine, second), 1);
}

#[test]
fn non_moderators_cannot_create_codes() {
    let (engine, _clock) = engine();
    let player = funded_account(&engine, 1, 0);

    assert!(matches!(
        engine.create_promo(player, "NOPE", 10, RewardKind::Coins, 100, None),
        Err(EconError::PermissionDenied)
    ));
}

#[test]
fn duplicate_code_is_a_conflict() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    engine
        .create_promo(operator, "TWICE", 10, RewardKind::Coins, 100, None)
        .unwrap();

    assert!(matches!(
        engine.create_promo(operator, "twice", 5, RewardKind::Coins, 50, None),
        Err(EconError::Conflict(_))
    ));
}

#[test]
fn terms_must_be_positive() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);

    assert!(matches!(
        engine.create_promo(operator, "ZERO", 0, RewardKind::Coins, 100, None),
        Err(EconError::Validation(_))
    ));
    assert!(matches!(
        engine.create_promo(operator, "FREE", 10, RewardKind::Coins, 0, None),
        Err(EconError::Validation(_))
    ));
}

#[test]
fn deleting_a_code_stops_further_redemptions() {
    let (engine, _clock) = engine();
    let operator = moderator(&engine, 9, 1);
    let player = funded_account(&engine, 1, 0);
    engine
        .create_promo(operator, "GONE", 10, RewardKind::Coins, 100, None)
        .unwrap();
    engine.delete_promo(operator, "GONE").unwrap();

    assert!(matches!(
        engine.redeem_code(player, "GONE"),
        Err(EconError::CodeNotFound(_))
    ));
}
