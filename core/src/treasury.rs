//! Groups and their treasuries: membership, deposits, level upgrades,
//! distribution, and the scheduled batch collection of business income.

use crate::{
    business::business_income,
    engine::{EconEngine, validate_username},
    error::{EconError, EconResult},
    store::{GroupRow, MemberRow, TreasuryLogRow},
    types::{AccountId, Coins, Currency, GroupId, GroupRole, TreasuryCategory},
};
use std::collections::BTreeMap;

/// Level-derived group bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBonuses {
    /// Percent of member business income routed to the treasury.
    pub business_bonus_percent: i64,
    /// Flat coins added to both the member and the treasury per lift.
    pub lift_bonus_coins: Coins,
}

pub fn group_bonuses(level: i64) -> GroupBonuses {
    GroupBonuses {
        business_bonus_percent: 5 + (level - 1),
        lift_bonus_coins: 1 + (level - 1),
    }
}

/// Extra treasury coins per lift, stepped by the member's tool level.
pub fn additional_lift_bonus(tool_level: u32) -> Coins {
    match tool_level {
        0..=4 => 1,
        5..=9 => 2,
        10..=14 => 3,
        _ => 4,
    }
}

impl EconEngine {
    // ── Lifecycle & membership ─────────────────────────────────

    /// Found a group. Charges the fixed creation cost and seats the founder
    /// as owner.
    pub fn create_group(
        &self,
        owner_id: AccountId,
        tag: &str,
        name: &str,
    ) -> EconResult<GroupRow> {
        let owner = self.require_active(owner_id)?;
        validate_tag(tag)?;
        validate_username(name)
            .map_err(|_| EconError::Validation("group name must be 3-20 plain characters".into()))?;
        if owner.group_id.is_some() {
            return Err(EconError::Conflict("already in a group".into()));
        }
        if self.store.group_by_tag(tag)?.is_some() {
            return Err(EconError::Conflict(format!("tag [{tag}] is taken")));
        }
        if self.store.group_name_taken(name)? {
            return Err(EconError::Conflict(format!("group name '{name}' is taken")));
        }
        let cost = self.config.group_creation_cost;
        if owner.balance < cost {
            return Err(EconError::Insufficient {
                needed: cost,
                available: owner.balance,
                currency: Currency::Coin,
            });
        }
        let tag = tag.to_uppercase();
        let group_id = self
            .store
            .create_group(owner_id, &tag, name, cost, self.now())?;
        log::info!("group [{tag}] created by account {owner_id}");
        self.store
            .group(group_id)?
            .ok_or_else(|| EconError::GroupNotFound(tag))
    }

    pub fn join_group(&self, account_id: AccountId, tag: &str) -> EconResult<GroupRow> {
        let account = self.require_active(account_id)?;
        if account.group_id.is_some() {
            return Err(EconError::Conflict("already in a group".into()));
        }
        let group = self
            .store
            .group_by_tag(tag)?
            .ok_or_else(|| EconError::GroupNotFound(tag.to_string()))?;
        self.store
            .add_member(group.group_id, account_id, GroupRole::Member, self.now())?;
        Ok(group)
    }

    /// Leave the current group. The owner cannot leave — they delete the
    /// group instead.
    pub fn leave_group(&self, account_id: AccountId) -> EconResult<()> {
        let membership = self.membership(account_id)?;
        if membership.role == GroupRole::Owner {
            return Err(EconError::Conflict(
                "the owner cannot leave; delete the group instead".into(),
            ));
        }
        self.store.remove_member(account_id)?;
        Ok(())
    }

    // ── Treasury operations ────────────────────────────────────

    pub fn deposit_to_treasury(&self, account_id: AccountId, amount: Coins) -> EconResult<()> {
        if amount <= 0 {
            return Err(EconError::Validation("deposit must be positive".into()));
        }
        let account = self.require_active(account_id)?;
        let membership = self.membership(account_id)?;
        if account.balance < amount {
            return Err(EconError::Insufficient {
                needed: amount,
                available: account.balance,
                currency: Currency::Coin,
            });
        }
        self.store
            .deposit_to_treasury(membership.group_id, account_id, amount, self.now())
    }

    /// Raise the group level. Cost scales linearly: base cost × current
    /// level, paid from the treasury. Owner or officer only.
    pub fn upgrade_group(&self, account_id: AccountId) -> EconResult<GroupUpgrade> {
        self.require_active(account_id)?;
        let membership = self.manager_membership(account_id)?;
        let group = self.group_row(membership.group_id)?;
        let cost = self.config.group_upgrade_base_cost * group.level;
        if group.treasury < cost {
            return Err(EconError::Insufficient {
                needed: cost,
                available: group.treasury,
                currency: Currency::Coin,
            });
        }
        let level = self
            .store
            .upgrade_group(group.group_id, account_id, cost, self.now())?;
        log::info!("group [{}] upgraded to level {level}", group.tag);
        Ok(GroupUpgrade { level, cost })
    }

    /// Split `total` coins from the treasury equally among all members.
    /// The indivisible remainder stays in the treasury.
    pub fn distribute_treasury(
        &self,
        account_id: AccountId,
        total: Coins,
    ) -> EconResult<Distribution> {
        if total <= 0 {
            return Err(EconError::Validation("amount must be positive".into()));
        }
        self.require_active(account_id)?;
        let membership = self.manager_membership(account_id)?;
        let group = self.group_row(membership.group_id)?;
        if group.treasury < total {
            return Err(EconError::Insufficient {
                needed: total,
                available: group.treasury,
                currency: Currency::Coin,
            });
        }
        let members = self.store.members(group.group_id)?;
        let share = total / members.len() as i64;
        if share == 0 {
            return Err(EconError::Validation(
                "amount too small to split among members".into(),
            ));
        }
        let shares: Vec<(AccountId, Coins)> =
            members.iter().map(|m| (m.account_id, share)).collect();
        let distributed = share * members.len() as i64;
        self.store.distribute_treasury(
            group.group_id,
            account_id,
            &shares,
            distributed,
            self.now(),
        )?;
        Ok(Distribution {
            members: members.len(),
            share,
            distributed,
        })
    }

    // ── Scheduled batch collection ─────────────────────────────

    /// Collect business income into group treasuries. Two explicit phases:
    /// a read-only scan that computes each group's cut, then one logged
    /// treasury credit per group. The caller's scheduler is responsible for
    /// not running two collections concurrently.
    pub fn collect_business_income(&self) -> EconResult<CollectionReport> {
        // Phase 1: compute. No writes happen here.
        let holdings = self.store.grouped_business_holdings()?;
        let mut per_account: BTreeMap<(GroupId, AccountId), Coins> = BTreeMap::new();
        for holding in &holdings {
            let config = match self.config.business(holding.business_id) {
                Some(c) => c,
                None => continue, // catalog shrank; skip unknown holdings
            };
            *per_account
                .entry((holding.group_id, holding.account_id))
                .or_insert(0) += business_income(config, holding.level);
        }

        let mut group_levels: BTreeMap<GroupId, i64> = BTreeMap::new();
        let mut per_group: BTreeMap<GroupId, Coins> = BTreeMap::new();
        for ((group_id, _account_id), income) in &per_account {
            let level = match group_levels.get(group_id) {
                Some(level) => *level,
                None => {
                    let level = self.group_row(*group_id)?.level;
                    group_levels.insert(*group_id, level);
                    level
                }
            };
            let cut = income * group_bonuses(level).business_bonus_percent / 100;
            *per_group.entry(*group_id).or_insert(0) += cut;
        }

        // Phase 2: apply. One credit and one log entry per group whose
        // floored cut came out positive; zero-cut groups are untouched.
        let now = self.now();
        let mut total_credited = 0;
        let mut groups_credited = 0;
        for (group_id, amount) in &per_group {
            if *amount <= 0 {
                continue;
            }
            self.store.credit_treasury(
                *group_id,
                None,
                TreasuryCategory::BusinessIncome,
                *amount,
                false,
                "Business income collection",
                now,
            )?;
            self.store.set_income_gauge(*group_id, *amount)?;
            total_credited += *amount;
            groups_credited += 1;
        }
        log::info!(
            "business income collected: {total_credited} coins across {groups_credited} groups"
        );
        Ok(CollectionReport {
            groups_credited,
            accounts_scanned: per_account.len(),
            total_credited,
        })
    }

    // ── Views ──────────────────────────────────────────────────

    pub fn group_profile(&self, tag: &str) -> EconResult<GroupProfile> {
        let group = self
            .store
            .group_by_tag(tag)?
            .ok_or_else(|| EconError::GroupNotFound(tag.to_string()))?;
        let members = self.store.members(group.group_id)?;
        let bonuses = group_bonuses(group.level);
        Ok(GroupProfile {
            bonuses,
            upgrade_cost: self.config.group_upgrade_base_cost * group.level,
            members,
            group,
        })
    }

    pub fn top_groups(&self, limit: i64) -> EconResult<Vec<GroupRow>> {
        self.store.top_groups(limit)
    }

    pub fn treasury_log(&self, tag: &str, limit: i64) -> EconResult<Vec<TreasuryLogRow>> {
        let group = self
            .store
            .group_by_tag(tag)?
            .ok_or_else(|| EconError::GroupNotFound(tag.to_string()))?;
        self.store.treasury_log(group.group_id, limit)
    }

    // ── Internal helpers ───────────────────────────────────────

    pub(crate) fn membership(&self, account_id: AccountId) -> EconResult<MemberRow> {
        self.store
            .member(account_id)?
            .ok_or_else(|| EconError::Validation("not in a group".into()))
    }

    fn manager_membership(&self, account_id: AccountId) -> EconResult<MemberRow> {
        let membership = self.membership(account_id)?;
        if !membership.role.can_manage() {
            return Err(EconError::PermissionDenied);
        }
        Ok(membership)
    }

    pub(crate) fn group_row(&self, group_id: GroupId) -> EconResult<GroupRow> {
        self.store
            .group(group_id)?
            .ok_or_else(|| EconError::GroupNotFound(format!("#{group_id}")))
    }
}

fn validate_tag(tag: &str) -> EconResult<()> {
    let length = tag.chars().count();
    if !(2..=5).contains(&length) || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EconError::Validation(
            "tag must be 2-5 ASCII letters or digits".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct GroupProfile {
    pub group: GroupRow,
    pub members: Vec<MemberRow>,
    pub bonuses: GroupBonuses,
    pub upgrade_cost: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpgrade {
    pub level: i64,
    pub cost: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub members: usize,
    pub share: Coins,
    pub distributed: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub groups_credited: usize,
    pub accounts_scanned: usize,
    pub total_credited: Coins,
}
