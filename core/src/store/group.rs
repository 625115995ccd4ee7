use super::{ledger, EconStore, GroupRow, MemberRow, TreasuryLogRow};
use crate::error::EconResult;
use crate::types::{AccountId, Coins, Currency, GroupId, GroupRole, TreasuryCategory, TxCategory};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

const GROUP_COLUMNS: &str = "group_id, tag, name, owner_id, level, treasury,
     total_income_per_hour, total_lifts, created_at";

fn group_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        group_id: row.get(0)?,
        tag: row.get(1)?,
        name: row.get(2)?,
        owner_id: row.get(3)?,
        level: row.get(4)?,
        treasury: row.get(5)?,
        total_income_per_hour: row.get(6)?,
        total_lifts: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn append_log(
    conn: &Connection,
    group_id: GroupId,
    account_id: Option<AccountId>,
    category: TreasuryCategory,
    amount: Coins,
    details: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO group_treasury_log
             (group_id, account_id, category, amount, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            group_id,
            account_id,
            category,
            amount,
            details,
            now.to_rfc3339()
        ],
    )
}

impl EconStore {
    // ── Groups ────────────────────────────────────────────────────

    /// Create a group: charge the owner the creation cost, insert the group
    /// row, the owner membership, and the owner's back-reference — one
    /// SQLite transaction.
    pub fn create_group(
        &self,
        owner_id: AccountId,
        tag: &str,
        name: &str,
        creation_cost: Coins,
        now: DateTime<Utc>,
    ) -> EconResult<GroupId> {
        let tx = self.conn.unchecked_transaction()?;
        ledger::apply_delta(&tx, owner_id, Currency::Coin, -creation_cost)?;
        ledger::append_txn(
            &tx,
            owner_id,
            Currency::Coin,
            -creation_cost,
            TxCategory::GroupCreate,
            &format!("Founded group [{tag}] {name}"),
            None,
            None,
            now,
        )?;
        tx.execute(
            "INSERT INTO groups (tag, name, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![tag, name, owner_id, now.to_rfc3339()],
        )?;
        let group_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO group_members (group_id, account_id, role, joined_at)
             VALUES (?1, ?2, 'owner', ?3)",
            params![group_id, owner_id, now.to_rfc3339()],
        )?;
        tx.execute(
            "UPDATE accounts SET group_id = ?1 WHERE account_id = ?2",
            params![group_id, owner_id],
        )?;
        tx.commit()?;
        Ok(group_id)
    }

    pub fn group(&self, group_id: GroupId) -> EconResult<Option<GroupRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM groups WHERE group_id = ?1"),
                params![group_id],
                group_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Tag lookup is case-insensitive (tag column is COLLATE NOCASE).
    pub fn group_by_tag(&self, tag: &str) -> EconResult<Option<GroupRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM groups WHERE tag = ?1"),
                params![tag],
                group_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn update_group_name(&self, group_id: GroupId, name: &str) -> EconResult<()> {
        self.conn.execute(
            "UPDATE groups SET name = ?1 WHERE group_id = ?2",
            params![name, group_id],
        )?;
        Ok(())
    }

    pub fn group_name_taken(&self, name: &str) -> EconResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM groups WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn members(&self, group_id: GroupId) -> EconResult<Vec<MemberRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, account_id, role, contributions, joined_at
             FROM group_members WHERE group_id = ?1
             ORDER BY joined_at ASC, account_id ASC",
        )?;
        let rows = stmt.query_map(params![group_id], |row| {
            Ok(MemberRow {
                group_id: row.get(0)?,
                account_id: row.get(1)?,
                role: row.get(2)?,
                contributions: row.get(3)?,
                joined_at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn member(&self, account_id: AccountId) -> EconResult<Option<MemberRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT group_id, account_id, role, contributions, joined_at
                 FROM group_members WHERE account_id = ?1",
                params![account_id],
                |row| {
                    Ok(MemberRow {
                        group_id: row.get(0)?,
                        account_id: row.get(1)?,
                        role: row.get(2)?,
                        contributions: row.get(3)?,
                        joined_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn member_count(&self, group_id: GroupId) -> EconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Add a member and set the account's back-reference, atomically.
    pub fn add_member(
        &self,
        group_id: GroupId,
        account_id: AccountId,
        role: GroupRole,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO group_members (group_id, account_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![group_id, account_id, role, now.to_rfc3339()],
        )?;
        tx.execute(
            "UPDATE accounts SET group_id = ?1 WHERE account_id = ?2",
            params![group_id, account_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove a member and clear the back-reference, atomically.
    pub fn remove_member(&self, account_id: AccountId) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM group_members WHERE account_id = ?1",
            params![account_id],
        )?;
        tx.execute(
            "UPDATE accounts SET group_id = NULL WHERE account_id = ?1",
            params![account_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Member deposit: debit the account, credit the treasury, bump the
    /// member's contribution counter, log — one transaction.
    pub fn deposit_to_treasury(
        &self,
        group_id: GroupId,
        account_id: AccountId,
        amount: Coins,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        ledger::apply_delta(&tx, account_id, Currency::Coin, -amount)?;
        ledger::append_txn(
            &tx,
            account_id,
            Currency::Coin,
            -amount,
            TxCategory::GroupDeposit,
            "Deposit to group treasury",
            None,
            None,
            now,
        )?;
        tx.execute(
            "UPDATE groups SET treasury = treasury + ?1 WHERE group_id = ?2",
            params![amount, group_id],
        )?;
        tx.execute(
            "UPDATE group_members SET contributions = contributions + ?1
             WHERE account_id = ?2",
            params![amount, account_id],
        )?;
        append_log(
            &tx,
            group_id,
            Some(account_id),
            TreasuryCategory::Deposit,
            amount,
            "Member deposit",
            now,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Credit the treasury with a logged entry; optionally bump the group's
    /// cumulative lift counter (per-lift income does, batch income doesn't).
    #[allow(clippy::too_many_arguments)]
    pub fn credit_treasury(
        &self,
        group_id: GroupId,
        account_id: Option<AccountId>,
        category: TreasuryCategory,
        amount: Coins,
        bump_lifts: bool,
        details: &str,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE groups
             SET treasury = treasury + ?1,
                 total_lifts = total_lifts + ?2
             WHERE group_id = ?3",
            params![amount, bump_lifts as i64, group_id],
        )?;
        append_log(&tx, group_id, account_id, category, amount, details, now)?;
        tx.commit()?;
        Ok(())
    }

    /// Spend treasury funds on a level upgrade, atomically.
    pub fn upgrade_group(
        &self,
        group_id: GroupId,
        account_id: AccountId,
        cost: Coins,
        now: DateTime<Utc>,
    ) -> EconResult<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE groups SET treasury = treasury - ?1, level = level + 1
             WHERE group_id = ?2",
            params![cost, group_id],
        )?;
        append_log(
            &tx,
            group_id,
            Some(account_id),
            TreasuryCategory::Upgrade,
            -cost,
            "Group level upgrade",
            now,
        )?;
        let level: i64 = tx.query_row(
            "SELECT level FROM groups WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(level)
    }

    /// Split a treasury amount across members: one treasury debit, one
    /// ledger credit per member, one log entry — a single transaction.
    pub fn distribute_treasury(
        &self,
        group_id: GroupId,
        actor_id: AccountId,
        shares: &[(AccountId, Coins)],
        total: Coins,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE groups SET treasury = treasury - ?1 WHERE group_id = ?2",
            params![total, group_id],
        )?;
        for (member_id, share) in shares {
            ledger::apply_delta(&tx, *member_id, Currency::Coin, *share)?;
            ledger::append_txn(
                &tx,
                *member_id,
                Currency::Coin,
                *share,
                TxCategory::GroupPayout,
                "Treasury distribution",
                Some(actor_id),
                None,
                now,
            )?;
        }
        append_log(
            &tx,
            group_id,
            Some(actor_id),
            TreasuryCategory::Distribution,
            -total,
            &format!("Distributed to {} members", shares.len()),
            now,
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Refresh the income gauge shown on the group profile. Set to the
    /// latest batch total, not accumulated.
    pub fn set_income_gauge(&self, group_id: GroupId, amount: Coins) -> EconResult<()> {
        self.conn.execute(
            "UPDATE groups SET total_income_per_hour = ?1 WHERE group_id = ?2",
            params![amount, group_id],
        )?;
        Ok(())
    }

    /// Delete a group: clear every member's back-reference, then the
    /// membership rows, the treasury log, and the group itself.
    pub fn delete_group_cascade(&self, group_id: GroupId) -> EconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE accounts SET group_id = NULL WHERE group_id = ?1",
            params![group_id],
        )?;
        tx.execute(
            "DELETE FROM group_members WHERE group_id = ?1",
            params![group_id],
        )?;
        tx.execute(
            "DELETE FROM group_treasury_log WHERE group_id = ?1",
            params![group_id],
        )?;
        tx.execute("DELETE FROM groups WHERE group_id = ?1", params![group_id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn treasury_log(&self, group_id: GroupId, limit: i64) -> EconResult<Vec<TreasuryLogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, group_id, account_id, category, amount, details, created_at
             FROM group_treasury_log
             WHERE group_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![group_id, limit], |row| {
            Ok(TreasuryLogRow {
                id: row.get(0)?,
                group_id: row.get(1)?,
                account_id: row.get(2)?,
                category: row.get(3)?,
                amount: row.get(4)?,
                details: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn treasury_log_count(
        &self,
        group_id: GroupId,
        category: TreasuryCategory,
    ) -> EconResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM group_treasury_log
             WHERE group_id = ?1 AND category = ?2",
            params![group_id, category],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn top_groups(&self, limit: i64) -> EconResult<Vec<GroupRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups
             ORDER BY level DESC, treasury DESC, group_id ASC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], group_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn group_count(&self) -> EconResult<i64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM groups", [], |row| row.get(0))?;
        Ok(n)
    }
}
