//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Engine modules call store methods — they never execute SQL directly.
//! Every multi-statement mutation runs inside a single SQLite transaction.

mod account;
mod business;
mod group;
mod ledger;
mod promo;

pub use account::OperatorStat;

use crate::error::EconResult;
use crate::types::{AccountId, Coins, Currency, GroupId, GroupRole, RewardKind, TreasuryCategory, TxCategory};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

pub struct EconStore {
    conn: Connection,
}

impl EconStore {
    pub fn open(path: &str) -> EconResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EconResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EconResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_accounts.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_businesses.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_promocodes.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_groups.sql"))?;
        Ok(())
    }

    // ── Admin audit trail ──────────────────────────────────────

    pub fn log_admin_action(
        &self,
        operator_id: AccountId,
        action: &str,
        target: &str,
        details: &str,
        now: DateTime<Utc>,
    ) -> EconResult<()> {
        self.conn.execute(
            "INSERT INTO admin_actions (operator_id, action, target, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![operator_id, action, target, details, now.to_rfc3339()],
        )?;
        Ok(())
    }
}

// ── Row types ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AccountRow {
    pub account_id: AccountId,
    pub username: String,
    pub balance: Coins,
    pub tokens: Coins,
    pub power: i64,
    pub tool_level: u32,
    pub tool_name: String,
    pub last_tool_use: Option<String>,
    pub total_lifts: i64,
    pub total_earned: Coins,
    pub override_income: Option<Coins>,
    pub mod_level: i64,
    pub mod_tag: Option<String>,
    pub mod_since: Option<String>,
    pub bans_issued: i64,
    pub permabans_issued: i64,
    pub accounts_deleted: i64,
    pub tools_granted: i64,
    pub renames_issued: i64,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub banned_until: Option<String>,
    pub group_id: Option<GroupId>,
    pub redeemed_codes: String, // JSON array of code strings
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct TransactionRow {
    pub id: i64,
    pub account_id: AccountId,
    pub currency: Currency,
    pub amount: Coins,
    pub category: TxCategory,
    pub description: String,
    pub operator_id: Option<AccountId>,
    pub counterpart_id: Option<AccountId>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct BusinessRow {
    pub account_id: AccountId,
    pub business_id: u32,
    pub level: i64,
    pub stages: [i64; 5],
    pub acquired_at: String,
}

impl BusinessRow {
    pub fn completed_stages(&self) -> i64 {
        self.stages.iter().filter(|s| **s > 0).count() as i64
    }
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub group_id: GroupId,
    pub tag: String,
    pub name: String,
    pub owner_id: AccountId,
    pub level: i64,
    pub treasury: Coins,
    pub total_income_per_hour: Coins,
    pub total_lifts: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MemberRow {
    pub group_id: GroupId,
    pub account_id: AccountId,
    pub role: GroupRole,
    pub contributions: Coins,
    pub joined_at: String,
}

#[derive(Debug, Clone)]
pub struct TreasuryLogRow {
    pub id: i64,
    pub group_id: GroupId,
    pub account_id: Option<AccountId>,
    pub category: TreasuryCategory,
    pub amount: Coins,
    pub details: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PromoRow {
    pub code: String,
    pub uses_total: i64,
    pub uses_left: i64,
    pub reward_kind: RewardKind,
    pub amount: Coins,
    pub created_by: AccountId,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub active: bool,
}

/// One leaderboard line.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TopEntry {
    pub account_id: AccountId,
    pub username: String,
    pub value: i64,
}

/// An account owning at least one business while belonging to a group.
/// Input to the scheduled collection scan.
#[derive(Debug, Clone)]
pub struct BusinessHolding {
    pub account_id: AccountId,
    pub group_id: GroupId,
    pub business_id: u32,
    pub level: i64,
}
