//! The economy engine — one typed operation per player or operator intent.
//!
//! RULES:
//!   - All persistence goes through `EconStore`; the engine never sees SQL.
//!   - Every balance mutation flows through the ledger methods and names a
//!     `TxCategory`.
//!   - All time is read from the injected `Clock`, never from `Utc::now()`
//!     directly, so cooldowns, expiries, and TTLs are testable.
//!
//! Operation implementations are split by concern: tool progression in
//! `progression.rs`, businesses in `business.rs`, groups and treasuries in
//! `treasury.rs`, redeemable codes in `promo.rs`, moderation and destructive
//! operations in `admin.rs`.

use crate::{
    clock::Clock,
    config::EconConfig,
    confirm::PendingActions,
    error::{EconError, EconResult},
    store::{AccountRow, EconStore, TopEntry, TransactionRow},
    types::{AccountId, Coins, Currency, TxCategory},
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub struct EconEngine {
    pub(crate) store: EconStore,
    pub(crate) config: EconConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) pending: PendingActions,
}

impl EconEngine {
    pub fn new(store: EconStore, config: EconConfig, clock: Arc<dyn Clock>) -> Self {
        let pending = PendingActions::new(Duration::seconds(config.pending_ttl_secs));
        Self {
            store,
            config,
            clock,
            pending,
        }
    }

    /// Wire an engine with the production clock.
    pub fn with_system_clock(store: EconStore, config: EconConfig) -> Self {
        Self::new(store, config, Arc::new(crate::clock::SystemClock))
    }

    pub fn store(&self) -> &EconStore {
        &self.store
    }

    pub fn config(&self) -> &EconConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn parse_ts(s: &str) -> EconResult<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
    }

    /// Fetch an account, clearing an expired timed ban on the way.
    pub(crate) fn require_account(&self, account_id: AccountId) -> EconResult<AccountRow> {
        let mut account = self
            .store
            .account(account_id)?
            .ok_or(EconError::AccountNotFound(account_id))?;
        if account.is_banned {
            if let Some(until) = &account.banned_until {
                if Self::parse_ts(until)? <= self.now() {
                    self.store.clear_ban(account_id)?;
                    log::info!("account {account_id}: timed ban expired, cleared");
                    account.is_banned = false;
                    account.ban_reason = None;
                    account.banned_until = None;
                }
            }
        }
        Ok(account)
    }

    /// Fetch an account that must not be banned.
    pub(crate) fn require_active(&self, account_id: AccountId) -> EconResult<AccountRow> {
        let account = self.require_account(account_id)?;
        if account.is_banned {
            return Err(EconError::Banned(account_id));
        }
        Ok(account)
    }

    // ── Registration & profile ─────────────────────────────────

    /// Create-on-first-interaction. Returns the existing account unchanged
    /// when already registered.
    pub fn register(&self, account_id: AccountId, username: &str) -> EconResult<AccountRow> {
        if let Some(existing) = self.store.account(account_id)? {
            return Ok(existing);
        }
        let tool_name = self
            .config
            .tool(1)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        self.store
            .insert_account(account_id, username, &tool_name, self.now())?;
        log::info!("registered account {account_id} ({username})");
        self.require_account(account_id)
    }

    pub fn profile(&self, account_id: AccountId) -> EconResult<Profile> {
        let account = self.require_account(account_id)?;
        let income_per_use = self.effective_income(&account);
        let group = match account.group_id {
            Some(group_id) => self.store.group(group_id)?,
            None => None,
        }
        .map(|g| GroupBadge {
            tag: g.tag,
            name: g.name,
            level: g.level,
        });
        Ok(Profile {
            income_per_use,
            override_active: account.override_income.is_some(),
            group,
            account,
        })
    }

    /// Per-use income: the operator override wins over the catalog.
    pub(crate) fn effective_income(&self, account: &AccountRow) -> Coins {
        match account.override_income {
            Some(income) => income,
            None => self
                .config
                .tool(account.tool_level)
                .map(|t| t.income_per_use)
                .unwrap_or(0),
        }
    }

    /// Change one's own display name. Rules: 3–20 chars, letters, digits,
    /// spaces, dashes, underscores; no leading/trailing/double spaces.
    pub fn rename(&self, account_id: AccountId, new_username: &str) -> EconResult<()> {
        self.require_active(account_id)?;
        validate_username(new_username)?;
        self.store.update_username(account_id, new_username)?;
        Ok(())
    }

    // ── Money transfer ─────────────────────────────────────────

    /// Transfer coins between accounts. Sender pays the full amount; the
    /// recipient receives it minus the commission. Sender debit and
    /// recipient credit are two atomic ledger units.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Coins,
    ) -> EconResult<TransferReceipt> {
        if amount < self.config.transfer_min_amount {
            return Err(EconError::Validation(format!(
                "minimum transfer is {} coins",
                self.config.transfer_min_amount
            )));
        }
        if from == to {
            return Err(EconError::Validation(
                "cannot transfer to yourself".into(),
            ));
        }
        let sender = self.require_active(from)?;
        if sender.balance < amount {
            return Err(EconError::Insufficient {
                needed: amount,
                available: sender.balance,
                currency: Currency::Coin,
            });
        }
        let recipient = self.require_account(to)?;
        if recipient.is_banned {
            return Err(EconError::Validation(
                "cannot transfer to a banned account".into(),
            ));
        }

        let commission = (amount * self.config.transfer_commission_percent / 100)
            .max(self.config.transfer_commission_min);
        let net = amount - commission;
        let now = self.now();

        self.store.mutate_balance(
            from,
            -amount,
            TxCategory::TransferSent,
            &format!("Transfer to {}", recipient.username),
            None,
            Some(to),
            now,
        )?;
        self.store.mutate_balance(
            to,
            net,
            TxCategory::TransferReceived,
            &format!("Transfer from {}", sender.username),
            None,
            Some(from),
            now,
        )?;
        log::info!("transfer {from} -> {to}: {amount} coins ({commission} commission)");
        Ok(TransferReceipt {
            amount,
            commission,
            net,
        })
    }

    // ── Leaderboards, history, stats ───────────────────────────

    pub fn top_by_balance(&self, limit: i64) -> EconResult<Vec<TopEntry>> {
        self.store.top_by_balance(limit)
    }

    pub fn top_by_lifts(&self, limit: i64) -> EconResult<Vec<TopEntry>> {
        self.store.top_by_lifts(limit)
    }

    pub fn top_by_earned(&self, limit: i64) -> EconResult<Vec<TopEntry>> {
        self.store.top_by_earned(limit)
    }

    pub fn history(&self, account_id: AccountId, limit: i64) -> EconResult<Vec<TransactionRow>> {
        self.require_account(account_id)?;
        self.store.transactions_for(account_id, limit)
    }

    pub fn stats(&self) -> EconResult<EngineStats> {
        let day_ago = self.now() - Duration::days(1);
        Ok(EngineStats {
            accounts: self.store.account_count()?,
            banned: self.store.banned_count()?,
            moderators: self.store.moderator_count()?,
            groups: self.store.group_count()?,
            transactions: self.store.transaction_count()?,
            coin_supply: self.store.coin_supply()?,
            registered_last_day: self.store.registered_since(day_ago)?,
        })
    }
}

pub(crate) fn validate_username(name: &str) -> EconResult<()> {
    let length = name.chars().count();
    if !(3..=20).contains(&length) {
        return Err(EconError::Validation(
            "username must be 3-20 characters".into(),
        ));
    }
    if name.starts_with(' ') || name.ends_with(' ') || name.contains("  ") {
        return Err(EconError::Validation(
            "username cannot have leading, trailing, or doubled spaces".into(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(EconError::Validation(
            "username may only contain letters, digits, spaces, dashes, underscores".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub account: AccountRow,
    pub income_per_use: Coins,
    pub override_active: bool,
    pub group: Option<GroupBadge>,
}

#[derive(Debug, Clone)]
pub struct GroupBadge {
    pub tag: String,
    pub name: String,
    pub level: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub amount: Coins,
    pub commission: Coins,
    pub net: Coins,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStats {
    pub accounts: i64,
    pub banned: i64,
    pub moderators: i64,
    pub groups: i64,
    pub transactions: i64,
    pub coin_supply: i64,
    pub registered_last_day: i64,
}
