use super::{AccountRow, EconStore, TopEntry};
use crate::error::EconResult;
use crate::types::{AccountId, Coins};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const ACCOUNT_COLUMNS: &str = "account_id, username, balance, tokens, power, tool_level, tool_name,
     last_tool_use, total_lifts, total_earned, override_income, mod_level, mod_tag, mod_since,
     bans_issued, permabans_issued, accounts_deleted, tools_granted, renames_issued,
     is_banned, ban_reason, banned_until, group_id, redeemed_codes, created_at";

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        account_id: row.get(0)?,
        username: row.get(1)?,
        balance: row.get(2)?,
        tokens: row.get(3)?,
        power: row.get(4)?,
        tool_level: row.get(5)?,
        tool_name: row.get(6)?,
        last_tool_use: row.get(7)?,
        total_lifts: row.get(8)?,
        total_earned: row.get(9)?,
        override_income: row.get(10)?,
        mod_level: row.get(11)?,
        mod_tag: row.get(12)?,
        mod_since: row.get(13)?,
        bans_issued: row.get(14)?,
        permabans_issued: row.get(15)?,
        accounts_deleted: row.get(16)?,
        tools_granted: row.get(17)?,
        renames_issued: row.get(18)?,
        is_banned: row.get::<_, i64>(19)? != 0,
        ban_reason: row.get(20)?,
        banned_until: row.get(21)?,
        group_id: row.get(22)?,
        redeemed_codes: row.get(23)?,
        created_at: row.get(24)?,
    })
}

impl EconStore {
    // ── Account ───────────────────────────────────────────────────

    pub fn insert_account(
        &self,
        account_id: AccountId,
        username: &str,
        tool_name: &str,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        self.conn.execute(
            "INSERT INTO accounts (account_id, username, tool_name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![account_id, username, tool_name, now.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn account(&self, account_id: AccountId) -> EconResult<Option<AccountRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
                params![account_id],
                account_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn update_username(&self, account_id: AccountId, username: &str) -> EconResult<()> {
        self.conn.execute(
            "UPDATE accounts SET username = ?1 WHERE account_id = ?2",
            params![username, account_id],
        )?;
        Ok(())
    }

    /// Record a successful lift: power, lifetime counter, cooldown anchor,
    /// and the audit row — one transaction.
    pub fn record_lift(
        &self,
        account_id: AccountId,
        tool_level: u32,
        income: Coins,
        power_gain: i64,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE accounts
             SET power = power + ?1,
                 total_lifts = total_lifts + 1,
                 last_tool_use = ?2
             WHERE account_id = ?3",
            params![power_gain, now.to_rfc3339(), account_id],
        )?;
        tx.execute(
            "INSERT INTO tool_uses (account_id, tool_level, income, power_gain, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![account_id, tool_level, income, power_gain, now.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn set_tool(&self, account_id: AccountId, level: u32, name: &str) -> EconResult<()> {
        self.conn.execute(
            "UPDATE accounts SET tool_level = ?1, tool_name = ?2 WHERE account_id = ?3",
            params![level, name, account_id],
        )?;
        Ok(())
    }

    pub fn set_power(&self, account_id: AccountId, power: i64) -> EconResult<()> {
        self.conn.execute(
            "UPDATE accounts SET power = ?1 WHERE account_id = ?2",
            params![power, account_id],
        )?;
        Ok(())
    }

    pub fn set_total_lifts(&self, account_id: AccountId, total_lifts: i64) -> EconResult<()> {
        self.conn.execute(
            "UPDATE accounts SET total_lifts = ?1 WHERE account_id = ?2",
            params![total_lifts, account_id],
        )?;
        Ok(())
    }

    pub fn set_override_income(
        &self,
        account_id: AccountId,
        income: Option<Coins>,
    ) -> EconResult<()> {
        self.conn.execute(
            "UPDATE accounts SET override_income = ?1 WHERE account_id = ?2",
            params![income, account_id],
        )?;
        Ok(())
    }

    pub fn set_ban(
        &self,
        account_id: AccountId,
        reason: &str,
        until: Option<DateTime<Utc>>,
    ) -> EconResult<()> {
        self.conn.execute(
            "UPDATE accounts SET is_banned = 1, ban_reason = ?1, banned_until = ?2
             WHERE account_id = ?3",
            params![reason, until.map(|t| t.to_rfc3339()), account_id],
        )?;
        Ok(())
    }

    pub fn clear_ban(&self, account_id: AccountId) -> EconResult<()> {
        self.conn.execute(
            "UPDATE accounts SET is_banned = 0, ban_reason = NULL, banned_until = NULL
             WHERE account_id = ?1",
            params![account_id],
        )?;
        Ok(())
    }

    pub fn set_mod_level(
        &self,
        account_id: AccountId,
        level: i64,
        tag: Option<&str>,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let since = if level > 0 {
            Some(now.to_rfc3339())
        } else {
            None
        };
        self.conn.execute(
            "UPDATE accounts SET mod_level = ?1, mod_tag = ?2, mod_since = ?3
             WHERE account_id = ?4",
            params![level, tag, since, account_id],
        )?;
        Ok(())
    }

    /// Bump one of the per-operator statistic counters.
    pub fn bump_operator_stat(&self, operator_id: AccountId, stat: OperatorStat) -> EconResult<()> {
        let column = stat.column();
        self.conn.execute(
            &format!("UPDATE accounts SET {column} = {column} + 1 WHERE account_id = ?1"),
            params![operator_id],
        )?;
        Ok(())
    }

    /// Remove an account and everything hanging off it: transactions,
    /// tool uses, code redemptions, and group membership.
    pub fn delete_account_cascade(&self, account_id: AccountId) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM transactions WHERE account_id = ?1",
            params![account_id],
        )?;
        tx.execute(
            "DELETE FROM tool_uses WHERE account_id = ?1",
            params![account_id],
        )?;
        tx.execute(
            "DELETE FROM promo_uses WHERE account_id = ?1",
            params![account_id],
        )?;
        tx.execute(
            "DELETE FROM group_members WHERE account_id = ?1",
            params![account_id],
        )?;
        tx.execute(
            "DELETE FROM accounts WHERE account_id = ?1",
            params![account_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Wipe every non-privileged account and all group state.
    /// Privileged accounts (mod_level > 0) survive with their balances.
    pub fn reset_all_cascade(&self) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM accounts WHERE mod_level = 0", [])?;
        tx.execute("DELETE FROM transactions", [])?;
        tx.execute("DELETE FROM tool_uses", [])?;
        tx.execute("DELETE FROM promo_uses", [])?;
        tx.execute("DELETE FROM group_members", [])?;
        tx.execute("DELETE FROM group_treasury_log", [])?;
        tx.execute("DELETE FROM groups", [])?;
        tx.execute("UPDATE accounts SET group_id = NULL", [])?;
        tx.commit()?;
        Ok(())
    }

    // ── Leaderboards ──────────────────────────────────────────────

    pub fn top_by_balance(&self, limit: i64) -> EconResult<Vec<TopEntry>> {
        self.top_by("balance", limit)
    }

    pub fn top_by_lifts(&self, limit: i64) -> EconResult<Vec<TopEntry>> {
        self.top_by("total_lifts", limit)
    }

    pub fn top_by_earned(&self, limit: i64) -> EconResult<Vec<TopEntry>> {
        self.top_by("total_earned", limit)
    }

    fn top_by(&self, column: &str, limit: i64) -> EconResult<Vec<TopEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT account_id, username, {column}
             FROM accounts
             WHERE is_banned = 0
             ORDER BY {column} DESC, account_id ASC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(TopEntry {
                account_id: row.get(0)?,
                username: row.get(1)?,
                value: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Counters for the stats snapshot ───────────────────────────

    pub fn account_count(&self) -> EconResult<i64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn banned_count(&self) -> EconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE is_banned = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn moderator_count(&self) -> EconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE mod_level > 0",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn coin_supply(&self) -> EconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(balance), 0) FROM accounts",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn registered_since(&self, since: DateTime<Utc>) -> EconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE created_at >= ?1",
            params![since.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

/// Per-operator statistic counters kept on the account row.
#[derive(Debug, Clone, Copy)]
pub enum OperatorStat {
    BansIssued,
    PermabansIssued,
    AccountsDeleted,
    ToolsGranted,
    RenamesIssued,
}

impl OperatorStat {
    fn column(self) -> &'static str {
        match self {
            OperatorStat::BansIssued => "bans_issued",
            OperatorStat::PermabansIssued => "permabans_issued",
            OperatorStat::AccountsDeleted => "accounts_deleted",
            OperatorStat::ToolsGranted => "tools_granted",
            OperatorStat::RenamesIssued => "renames_issued",
        }
    }
}
