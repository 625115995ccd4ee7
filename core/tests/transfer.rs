//! Money transfer: commission, minimums, and recipient checks.

mod common;

use common::{balance, engine, funded_account};
use irongrind_core::error::EconError;
use irongrind_core::types::TxCategory;

#[test]
fn transfer_debits_gross_and_credits_net() {
    let (engine, _clock) = engine();
    let from = funded_account(&engine, 1, 500);
    let to = funded_account(&engine, 2, 0);

    let receipt = engine.transfer(from, to, 100).unwrap();

    assert_eq!(receipt.amount, 100);
    assert_eq!(receipt.commission, 5);
    assert_eq!(receipt.net, 95);
    assert_eq!(balance(&engine, from), 401); // 501 - 100
    assert_eq!(balance(&engine, to), 96); // 1 + 95

    let sender_row = &engine.history(from, 1).unwrap()[0];
    assert_eq!(sender_row.category, TxCategory::TransferSent);
    assert_eq!(sender_row.counterpart_id, Some(to));
    let recipient_row = &engine.history(to, 1).unwrap()[0];
    assert_eq!(recipient_row.category, TxCategory::TransferReceived);
    assert_eq!(recipient_row.amount, 95);
}

#[test]
fn commission_floors_at_the_minimum() {
    let (engine, _clock) = engine();
    let from = funded_account(&engine, 1, 500);
    let to = funded_account(&engine, 2, 0);

    // 5% of 10 would be 0 after flooring; the minimum of 1 applies.
    let receipt = engine.transfer(from, to, 10).unwrap();

    assert_eq!(receipt.commission, 1);
    assert_eq!(receipt.net, 9);
}

#[test]
fn commission_floors_fractional_percentages() {
    let (engine, _clock) = engine();
    let from = funded_account(&engine, 1, 500);
    let to = funded_account(&engine, 2, 0);

    // 5% of 59 = 2.95, floored to 2.
    let receipt = engine.transfer(from, to, 59).unwrap();

    assert_eq!(receipt.commission, 2);
    assert_eq!(receipt.net, 57);
}

#[test]
fn transfers_below_the_minimum_are_rejected() {
    let (engine, _clock) = engine();
    let from = funded_account(&engine, 1, 500);
    let to = funded_account(&engine, 2, 0);

    assert!(matches!(
        engine.transfer(from, to, 9),
        Err(EconError::Validation(_))
    ));
    assert_eq!(balance(&engine, from), 501, "rejected transfer must not debit");
}

#[test]
fn self_transfer_is_rejected() {
    let (engine, _clock) = engine();
    let id = funded_account(&engine, 1, 500);

    assert!(matches!(
        engine.transfer(id, id, 100),
        Err(EconError::Validation(_))
    ));
}

#[test]
fn insufficient_funds_block_the_transfer() {
    let (engine, _clock) = engine();
    let from = funded_account(&engine, 1, 50);
    let to = funded_account(&engine, 2, 0);

    assert!(matches!(
        engine.transfer(from, to, 100),
        Err(EconError::Insufficient { needed: 100, .. })
    ));
}

#[test]
fn unknown_recipient_is_not_found() {
    let (engine, _clock) = engine();
    let from = funded_account(&engine, 1, 500);

    assert!(matches!(
        engine.transfer(from, 404, 100),
        Err(EconError::AccountNotFound(404))
    ));
}

#[test]
fn banned_recipient_cannot_receive() {
    let (engine, _clock) = engine();
    let from = funded_account(&engine, 1, 500);
    let to = funded_account(&engine, 2, 0);
    engine.store().set_ban(to, "fraud", None).unwrap();

    assert!(matches!(
        engine.transfer(from, to, 100),
        Err(EconError::Validation(_))
    ));
    assert_eq!(balance(&engine, from), 501);
}
