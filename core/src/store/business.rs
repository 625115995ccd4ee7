use super::{ledger, BusinessHolding, BusinessRow, EconStore};
use crate::error::EconResult;
use crate::types::{AccountId, Coins, Currency, TxCategory};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

fn business_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BusinessRow> {
    Ok(BusinessRow {
        account_id: row.get(0)?,
        business_id: row.get(1)?,
        level: row.get(2)?,
        stages: [
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
        ],
        acquired_at: row.get(8)?,
    })
}

const BUSINESS_COLUMNS: &str =
    "account_id, business_id, level, stage1, stage2, stage3, stage4, stage5, acquired_at";

impl EconStore {
    // ── Businesses ────────────────────────────────────────────────

    pub fn business(
        &self,
        account_id: AccountId,
        business_id: u32,
    ) -> EconResult<Option<BusinessRow>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {BUSINESS_COLUMNS} FROM businesses
                     WHERE account_id = ?1 AND business_id = ?2"
                ),
                params![account_id, business_id],
                business_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn businesses_for(&self, account_id: AccountId) -> EconResult<Vec<BusinessRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses
             WHERE account_id = ?1 ORDER BY business_id ASC"
        ))?;
        let rows = stmt.query_map(params![account_id], business_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Debit the purchase price and create the level-1 ownership row,
    /// atomically.
    pub fn purchase_business(
        &self,
        account_id: AccountId,
        business_id: u32,
        cost: Coins,
        currency: Currency,
        description: &str,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        ledger::apply_delta(&tx, account_id, currency, -cost)?;
        ledger::append_txn(
            &tx,
            account_id,
            currency,
            -cost,
            TxCategory::BusinessPurchase,
            description,
            None,
            None,
            now,
        )?;
        tx.execute(
            "INSERT INTO businesses (account_id, business_id, acquired_at)
             VALUES (?1, ?2, ?3)",
            params![account_id, business_id, now.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Debit the stage cost, bump the stage counter, and — when all five
    /// counters are non-zero afterwards — raise the level and zero the
    /// counters. One SQLite transaction. Returns (new_level, leveled_up).
    #[allow(clippy::too_many_arguments)]
    pub fn upgrade_business_stage(
        &self,
        account_id: AccountId,
        business_id: u32,
        stage: u32,
        cost: Coins,
        currency: Currency,
        description: &str,
        now: DateTime<Utc>,
    ) -> EconResult<(i64, bool)> {
        assert!((1..=5).contains(&stage), "stage must be validated upstream");
        let tx = self.conn.unchecked_transaction()?;
        ledger::apply_delta(&tx, account_id, currency, -cost)?;
        ledger::append_txn(
            &tx,
            account_id,
            currency,
            -cost,
            TxCategory::BusinessUpgrade,
            description,
            None,
            None,
            now,
        )?;
        let column = format!("stage{stage}");
        tx.execute(
            &format!(
                "UPDATE businesses SET {column} = {column} + 1
                 WHERE account_id = ?1 AND business_id = ?2"
            ),
            params![account_id, business_id],
        )?;
        let (level, complete): (i64, bool) = tx.query_row(
            "SELECT level,
                    stage1 > 0 AND stage2 > 0 AND stage3 > 0 AND stage4 > 0 AND stage5 > 0
             FROM businesses WHERE account_id = ?1 AND business_id = ?2",
            params![account_id, business_id],
            |row| Ok((row.get(0)?, row.get::<_, i64>(1)? != 0)),
        )?;
        let new_level = if complete {
            tx.execute(
                "UPDATE businesses
                 SET level = level + 1,
                     stage1 = 0, stage2 = 0, stage3 = 0, stage4 = 0, stage5 = 0
                 WHERE account_id = ?1 AND business_id = ?2",
                params![account_id, business_id],
            )?;
            level + 1
        } else {
            level
        };
        tx.commit()?;
        Ok((new_level, complete))
    }

    /// Phase-1 input for the scheduled collection: every business owned by a
    /// grouped account. Ordered so batches apply deterministically.
    pub fn grouped_business_holdings(&self) -> EconResult<Vec<BusinessHolding>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.account_id, a.group_id, b.business_id, b.level
             FROM businesses b
             JOIN accounts a ON a.account_id = b.account_id
             WHERE a.group_id IS NOT NULL
             ORDER BY a.group_id ASC, b.account_id ASC, b.business_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(BusinessHolding {
                account_id: row.get(0)?,
                group_id: row.get(1)?,
                business_id: row.get(2)?,
                level: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
