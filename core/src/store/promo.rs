use super::{ledger, EconStore, PromoRow};
use crate::error::EconResult;
use crate::types::{AccountId, Coins, Currency, TxCategory};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const PROMO_COLUMNS: &str =
    "code, uses_total, uses_left, reward_kind, amount, created_by, created_at, expires_at, active";

fn promo_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PromoRow> {
    Ok(PromoRow {
        code: row.get(0)?,
        uses_total: row.get(1)?,
        uses_left: row.get(2)?,
        reward_kind: row.get(3)?,
        amount: row.get(4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
        expires_at: row.get(7)?,
        active: row.get::<_, i64>(8)? != 0,
    })
}

impl EconStore {
    // ── Redeemable codes ──────────────────────────────────────────

    pub fn insert_promo(&self, promo: &PromoRow) -> EconResult<()> {
        self.conn.execute(
            "INSERT INTO promo_codes
                 (code, uses_total, uses_left, reward_kind, amount,
                  created_by, created_at, expires_at, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                promo.code,
                promo.uses_total,
                promo.uses_left,
                promo.reward_kind,
                promo.amount,
                promo.created_by,
                promo.created_at,
                promo.expires_at,
                promo.active as i64,
            ],
        )?;
        Ok(())
    }

    pub fn promo(&self, code: &str) -> EconResult<Option<PromoRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PROMO_COLUMNS} FROM promo_codes WHERE code = ?1"),
                params![code],
                promo_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn promos(&self) -> EconResult<Vec<PromoRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROMO_COLUMNS} FROM promo_codes ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([], promo_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_promo(&self, code: &str) -> EconResult<bool> {
        let n = self
            .conn
            .execute("DELETE FROM promo_codes WHERE code = ?1", params![code])?;
        Ok(n > 0)
    }

    /// Atomic redemption: decrement the shared uses pool (guarded in SQL so
    /// a concurrent redeemer cannot take the last use twice), credit the
    /// reward through the ledger discipline, append the code to the
    /// account's redeemed list, and record the usage row.
    ///
    /// Returns false — with nothing applied — if the pool was exhausted.
    pub fn redeem_promo(
        &self,
        account_id: AccountId,
        code: &str,
        currency: Currency,
        amount: Coins,
        now: DateTime<Utc>,
    ) -> EconResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let taken = tx.execute(
            "UPDATE promo_codes SET uses_left = uses_left - 1
             WHERE code = ?1 AND uses_left > 0",
            params![code],
        )?;
        if taken == 0 {
            return Ok(false); // dropped transaction rolls back
        }
        ledger::apply_delta(&tx, account_id, currency, amount)?;
        ledger::append_txn(
            &tx,
            account_id,
            currency,
            amount,
            TxCategory::PromoReward,
            &format!("Redeemed code {code}"),
            None,
            None,
            now,
        )?;
        let raw: String = tx.query_row(
            "SELECT redeemed_codes FROM accounts WHERE account_id = ?1",
            params![account_id],
            |row| row.get(0),
        )?;
        let mut redeemed: Vec<String> = serde_json::from_str(&raw)?;
        redeemed.push(code.to_string());
        tx.execute(
            "UPDATE accounts SET redeemed_codes = ?1 WHERE account_id = ?2",
            params![serde_json::to_string(&redeemed)?, account_id],
        )?;
        tx.execute(
            "INSERT INTO promo_uses (code, account_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![code, account_id, now.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(true)
    }

    pub fn promo_use_count(&self, code: &str) -> EconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM promo_uses WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
