//! The Ledger: the sole path by which balances change. Every mutation writes
//! the balance delta and the transaction row in one SQLite transaction.

use super::{EconStore, TransactionRow};
use crate::error::EconResult;
use crate::types::{AccountId, Coins, Currency, TxCategory};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

/// Apply a signed delta to one of an account's balances.
/// Positive coin amounts also bump the lifetime-earned counter.
/// Intentionally no sufficiency check — callers validate first, and
/// admin categories may drive a balance negative.
pub(crate) fn apply_delta(
    conn: &Connection,
    account_id: AccountId,
    currency: Currency,
    amount: Coins,
) -> rusqlite::Result<usize> {
    match currency {
        Currency::Coin => conn.execute(
            "UPDATE accounts
             SET balance = balance + ?1,
                 total_earned = total_earned + MAX(?1, 0)
             WHERE account_id = ?2",
            params![amount, account_id],
        ),
        Currency::Token => conn.execute(
            "UPDATE accounts SET tokens = tokens + ?1 WHERE account_id = ?2",
            params![amount, account_id],
        ),
    }
}

/// Append the immutable transaction row for a balance mutation.
pub(crate) fn append_txn(
    conn: &Connection,
    account_id: AccountId,
    currency: Currency,
    amount: Coins,
    category: TxCategory,
    description: &str,
    operator_id: Option<AccountId>,
    counterpart_id: Option<AccountId>,
    now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO transactions
             (account_id, currency, amount, category, description,
              operator_id, counterpart_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            account_id,
            currency,
            amount,
            category,
            description,
            operator_id,
            counterpart_id,
            now.to_rfc3339()
        ],
    )
}

impl EconStore {
    /// Atomically mutate the coin balance and append the transaction row.
    #[allow(clippy::too_many_arguments)]
    pub fn mutate_balance(
        &self,
        account_id: AccountId,
        amount: Coins,
        category: TxCategory,
        description: &str,
        operator_id: Option<AccountId>,
        counterpart_id: Option<AccountId>,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        apply_delta(&tx, account_id, Currency::Coin, amount)?;
        append_txn(
            &tx,
            account_id,
            Currency::Coin,
            amount,
            category,
            description,
            operator_id,
            counterpart_id,
            now,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Token sibling of `mutate_balance`. No lifetime-earned side effect.
    #[allow(clippy::too_many_arguments)]
    pub fn mutate_tokens(
        &self,
        account_id: AccountId,
        amount: Coins,
        category: TxCategory,
        description: &str,
        operator_id: Option<AccountId>,
        counterpart_id: Option<AccountId>,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        apply_delta(&tx, account_id, Currency::Token, amount)?;
        append_txn(
            &tx,
            account_id,
            Currency::Token,
            amount,
            category,
            description,
            operator_id,
            counterpart_id,
            now,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Most recent transactions for an account, newest first.
    pub fn transactions_for(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> EconResult<Vec<TransactionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, currency, amount, category, description,
                    operator_id, counterpart_id, created_at
             FROM transactions
             WHERE account_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![account_id, limit], |row| {
            Ok(TransactionRow {
                id: row.get(0)?,
                account_id: row.get(1)?,
                currency: row.get(2)?,
                amount: row.get(3)?,
                category: row.get(4)?,
                description: row.get(5)?,
                operator_id: row.get(6)?,
                counterpart_id: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn transaction_count(&self) -> EconResult<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}
