//! Tool progression: the cooldown-gated lift and the catalog-driven
//! level advance.

use crate::{
    engine::EconEngine,
    error::{EconError, EconResult},
    treasury::{additional_lift_bonus, group_bonuses},
    types::{AccountId, Coins, Currency, TreasuryCategory, TxCategory},
};
use chrono::Duration;

impl EconEngine {
    /// Current tool, effective income, and what the next level would cost.
    pub fn tool_info(&self, account_id: AccountId) -> EconResult<ToolInfo> {
        let account = self.require_account(account_id)?;
        let income_per_use = self.effective_income(&account);
        let power_per_use = self.power_per_use(account.tool_level, account.override_income);
        let next = self.config.tool(account.tool_level + 1).map(|t| NextTool {
            level: t.level,
            name: t.name.clone(),
            income_per_use: t.income_per_use,
            price: t.price,
        });
        Ok(ToolInfo {
            level: account.tool_level,
            name: account.tool_name,
            income_per_use,
            power_per_use,
            next,
        })
    }

    /// Perform one lift. Checks the cooldown, credits the player (their base
    /// income plus the group lift bonus when they belong to a group), routes
    /// the group's share into the treasury, then records power, counters,
    /// and the audit row.
    pub fn use_tool(&self, account_id: AccountId) -> EconResult<LiftOutcome> {
        let account = self.require_active(account_id)?;
        let now = self.now();

        if let Some(last) = &account.last_tool_use {
            let elapsed = now - Self::parse_ts(last)?;
            let cooldown = Duration::seconds(self.config.tool_cooldown_secs);
            if elapsed < cooldown {
                // Reported remainder stays strictly inside the window even
                // for a same-instant retry.
                let cap = (self.config.tool_cooldown_secs - 1).max(1);
                return Err(EconError::Cooldown {
                    remaining_secs: (cooldown - elapsed).num_seconds().clamp(1, cap),
                });
            }
        }

        let base_income = self.effective_income(&account);
        let power_gain = self.power_per_use(account.tool_level, account.override_income);

        let group = match account.group_id {
            Some(group_id) => self.store.group(group_id)?,
            None => None,
        };

        let (player_gain, group_share) = match &group {
            Some(g) => {
                let bonuses = group_bonuses(g.level);
                let share = bonuses.lift_bonus_coins + additional_lift_bonus(account.tool_level);
                (base_income + bonuses.lift_bonus_coins, share)
            }
            None => (base_income, 0),
        };

        // Player credit and treasury credit are two separate atomic units.
        self.store.mutate_balance(
            account_id,
            player_gain,
            TxCategory::ToolIncome,
            &format!("Lift with {}", account.tool_name),
            None,
            None,
            now,
        )?;
        if let Some(g) = &group {
            if group_share > 0 {
                self.store.credit_treasury(
                    g.group_id,
                    Some(account_id),
                    TreasuryCategory::LiftIncome,
                    group_share,
                    true,
                    "Lift bonus",
                    now,
                )?;
            }
        }
        self.store
            .record_lift(account_id, account.tool_level, player_gain, power_gain, now)?;

        log::debug!(
            "account {account_id} lifted: +{player_gain} coins, +{power_gain} power, group +{group_share}"
        );
        Ok(LiftOutcome {
            player_gain,
            base_income,
            power_gain,
            group_share,
        })
    }

    /// Advance the tool one level. Saturation at the top of the catalog is a
    /// reported outcome, not an error.
    pub fn upgrade_tool(&self, account_id: AccountId) -> EconResult<ToolAdvance> {
        let account = self.require_active(account_id)?;
        let next_level = account.tool_level + 1;
        let next = match self.config.tool(next_level) {
            Some(t) => t.clone(),
            None => return Ok(ToolAdvance::AtMaxLevel),
        };
        if account.balance < next.price {
            return Err(EconError::Insufficient {
                needed: next.price,
                available: account.balance,
                currency: Currency::Coin,
            });
        }
        self.store.mutate_balance(
            account_id,
            -next.price,
            TxCategory::ToolUpgrade,
            &format!("Upgrade to {}", next.name),
            None,
            None,
            self.now(),
        )?;
        self.store.set_tool(account_id, next.level, &next.name)?;
        log::info!("account {account_id} upgraded tool to level {next_level}");
        Ok(ToolAdvance::Advanced {
            level: next.level,
            name: next.name,
            price: next.price,
        })
    }

    /// Power gain floors at 1 while an income override is active.
    fn power_per_use(&self, tool_level: u32, override_income: Option<Coins>) -> i64 {
        if override_income.is_some() {
            return 1;
        }
        self.config
            .tool(tool_level)
            .map(|t| t.power_per_use)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub level: u32,
    pub name: String,
    pub income_per_use: Coins,
    pub power_per_use: i64,
    pub next: Option<NextTool>,
}

#[derive(Debug, Clone)]
pub struct NextTool {
    pub level: u32,
    pub name: String,
    pub income_per_use: Coins,
    pub price: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiftOutcome {
    /// Coins credited to the player (base income + group lift bonus).
    pub player_gain: Coins,
    /// Catalog or override income before group bonuses.
    pub base_income: Coins,
    pub power_gain: i64,
    /// Coins credited to the group treasury (0 when not in a group).
    pub group_share: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAdvance {
    Advanced {
        level: u32,
        name: String,
        price: Coins,
    },
    AtMaxLevel,
}
