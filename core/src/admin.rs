//! Moderation: forced account state, bans, the moderation ladder, and the
//! confirm-gated destructive operations (account deletion, group deletion,
//! global reset). Every operation here lands a row in `admin_actions`.

use crate::{
    confirm::{ConfirmOutcome, PendingKey},
    engine::{validate_username, EconEngine},
    error::{EconError, EconResult},
    store::{AccountRow, OperatorStat},
    types::{AccountId, Coins, GroupRole, TxCategory},
};
use chrono::Duration;

impl EconEngine {
    /// An operator must hold at least `min_level` on the moderation ladder
    /// (1 = moderator, 2 = owner).
    pub(crate) fn require_moderator(
        &self,
        operator_id: AccountId,
        min_level: i64,
    ) -> EconResult<AccountRow> {
        let operator = self.require_active(operator_id)?;
        if operator.mod_level < min_level {
            return Err(EconError::PermissionDenied);
        }
        Ok(operator)
    }

    /// A target the operator outranks. Acting on self is never allowed here.
    fn require_subordinate(
        &self,
        operator: &AccountRow,
        target_id: AccountId,
    ) -> EconResult<AccountRow> {
        if operator.account_id == target_id {
            return Err(EconError::Validation("cannot target yourself".into()));
        }
        let target = self.require_account(target_id)?;
        if target.mod_level >= operator.mod_level {
            return Err(EconError::PermissionDenied);
        }
        Ok(target)
    }

    // ── Forced account state ───────────────────────────────────

    pub fn admin_set_balance(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        balance: Coins,
    ) -> EconResult<()> {
        let operator = self.require_moderator(operator_id, 1)?;
        let target = if operator_id == target_id {
            operator
        } else {
            self.require_account(target_id)?
        };
        let delta = balance - target.balance;
        self.store.mutate_balance(
            target_id,
            delta,
            TxCategory::AdminSet,
            "Balance set by operator",
            Some(operator_id),
            None,
            self.now(),
        )?;
        self.log_admin(operator_id, "set_balance", target_id, &balance.to_string())
    }

    pub fn admin_add_balance(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        amount: Coins,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        if amount <= 0 {
            return Err(EconError::Validation("amount must be positive".into()));
        }
        self.require_account(target_id)?;
        self.store.mutate_balance(
            target_id,
            amount,
            TxCategory::AdminAdd,
            "Coins granted by operator",
            Some(operator_id),
            None,
            self.now(),
        )?;
        self.log_admin(operator_id, "add_balance", target_id, &amount.to_string())
    }

    pub fn admin_remove_balance(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        amount: Coins,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        if amount <= 0 {
            return Err(EconError::Validation("amount must be positive".into()));
        }
        self.require_account(target_id)?;
        // Admin categories may drive a balance negative on purpose.
        self.store.mutate_balance(
            target_id,
            -amount,
            TxCategory::AdminRemove,
            "Coins removed by operator",
            Some(operator_id),
            None,
            self.now(),
        )?;
        self.log_admin(operator_id, "remove_balance", target_id, &amount.to_string())
    }

    pub fn admin_grant_tokens(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        amount: Coins,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        if amount == 0 {
            return Err(EconError::Validation("amount must be non-zero".into()));
        }
        self.require_account(target_id)?;
        self.store.mutate_tokens(
            target_id,
            amount,
            TxCategory::AdminAdd,
            "Tokens granted by operator",
            Some(operator_id),
            None,
            self.now(),
        )?;
        self.log_admin(operator_id, "grant_tokens", target_id, &amount.to_string())
    }

    pub fn admin_set_power(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        power: i64,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        if power < 0 {
            return Err(EconError::Validation("power cannot be negative".into()));
        }
        self.require_account(target_id)?;
        self.store.set_power(target_id, power)?;
        self.log_admin(operator_id, "set_power", target_id, &power.to_string())
    }

    pub fn admin_set_total_lifts(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        total_lifts: i64,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        if total_lifts < 0 {
            return Err(EconError::Validation("lift count cannot be negative".into()));
        }
        self.require_account(target_id)?;
        self.store.set_total_lifts(target_id, total_lifts)?;
        self.log_admin(operator_id, "set_total_lifts", target_id, &total_lifts.to_string())
    }

    /// Set or clear the per-use income override. While set, it replaces the
    /// catalog income and power gain drops to 1 per lift.
    pub fn admin_set_override_income(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        income: Option<Coins>,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        if matches!(income, Some(i) if i <= 0) {
            return Err(EconError::Validation("override must be positive".into()));
        }
        self.require_account(target_id)?;
        self.store.set_override_income(target_id, income)?;
        let detail = income.map_or("cleared".to_string(), |i| i.to_string());
        self.log_admin(operator_id, "set_override_income", target_id, &detail)
    }

    pub fn admin_set_tool_level(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        level: u32,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        let tool = self
            .config
            .tool(level)
            .ok_or_else(|| EconError::Validation(format!("no tool at level {level}")))?
            .clone();
        self.require_account(target_id)?;
        self.store.set_tool(target_id, tool.level, &tool.name)?;
        self.store
            .bump_operator_stat(operator_id, OperatorStat::ToolsGranted)?;
        self.log_admin(operator_id, "set_tool_level", target_id, &level.to_string())
    }

    pub fn admin_rename(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        username: &str,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        validate_username(username)?;
        self.require_account(target_id)?;
        self.store.update_username(target_id, username)?;
        self.store
            .bump_operator_stat(operator_id, OperatorStat::RenamesIssued)?;
        self.log_admin(operator_id, "rename", target_id, username)
    }

    /// Rename a group. The tag never changes; only the display name does.
    pub fn rename_group(
        &self,
        operator_id: AccountId,
        tag: &str,
        new_name: &str,
    ) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        let group = self
            .store
            .group_by_tag(tag)?
            .ok_or_else(|| EconError::GroupNotFound(tag.to_string()))?;
        validate_username(new_name)
            .map_err(|_| EconError::Validation("group name must be 3-20 plain characters".into()))?;
        if new_name != group.name && self.store.group_name_taken(new_name)? {
            return Err(EconError::Conflict(format!(
                "group name '{new_name}' is taken"
            )));
        }
        self.store.update_group_name(group.group_id, new_name)?;
        log::info!("group [{}] renamed to '{new_name}' by {operator_id}", group.tag);
        self.log_admin(
            operator_id,
            "rename_group",
            group.owner_id,
            &format!("[{}] '{}' -> '{new_name}'", group.tag, group.name),
        )
    }

    // ── Bans ───────────────────────────────────────────────────

    /// Ban for a number of days, or permanently when `days` is None.
    pub fn ban(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        reason: &str,
        days: Option<i64>,
    ) -> EconResult<()> {
        let operator = self.require_moderator(operator_id, 1)?;
        let target = self.require_subordinate(&operator, target_id)?;
        if target.is_banned {
            return Err(EconError::Conflict(format!(
                "account {target_id} is already banned"
            )));
        }
        if matches!(days, Some(d) if d <= 0) {
            return Err(EconError::Validation("ban duration must be positive".into()));
        }
        let until = days.map(|d| self.now() + Duration::days(d));
        self.store.set_ban(target_id, reason, until)?;
        let stat = if days.is_some() {
            OperatorStat::BansIssued
        } else {
            OperatorStat::PermabansIssued
        };
        self.store.bump_operator_stat(operator_id, stat)?;
        log::warn!("account {target_id} banned by {operator_id}: {reason}");
        let detail = match days {
            Some(d) => format!("{reason} ({d} days)"),
            None => format!("{reason} (permanent)"),
        };
        self.log_admin(operator_id, "ban", target_id, &detail)
    }

    pub fn unban(&self, operator_id: AccountId, target_id: AccountId) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        let target = self.require_account(target_id)?;
        if !target.is_banned {
            return Err(EconError::Conflict(format!(
                "account {target_id} is not banned"
            )));
        }
        self.store.clear_ban(target_id)?;
        self.log_admin(operator_id, "unban", target_id, "")
    }

    // ── Moderation ladder ──────────────────────────────────────

    /// Grant a moderation level. An operator can only grant levels below
    /// their own.
    pub fn make_moderator(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        level: i64,
        tag: Option<&str>,
    ) -> EconResult<()> {
        let operator = self.require_moderator(operator_id, 2)?;
        if level < 1 || level >= operator.mod_level {
            return Err(EconError::PermissionDenied);
        }
        let target = self.require_account(target_id)?;
        if target.mod_level >= operator.mod_level {
            return Err(EconError::PermissionDenied);
        }
        self.store
            .set_mod_level(target_id, level, tag, self.now())?;
        self.log_admin(operator_id, "make_moderator", target_id, &level.to_string())
    }

    pub fn remove_moderator(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
    ) -> EconResult<()> {
        let operator = self.require_moderator(operator_id, 2)?;
        let target = self.require_subordinate(&operator, target_id)?;
        if target.mod_level == 0 {
            return Err(EconError::Conflict(format!(
                "account {target_id} is not a moderator"
            )));
        }
        self.store.set_mod_level(target_id, 0, None, self.now())?;
        self.log_admin(operator_id, "remove_moderator", target_id, "")
    }

    // ── Confirm-gated destructive operations ───────────────────

    /// First call arms the deletion; an identical repeat executes it.
    pub fn request_account_deletion(
        &self,
        operator_id: AccountId,
        target_id: AccountId,
        reason: &str,
    ) -> EconResult<ConfirmOutcome> {
        let operator = self.require_moderator(operator_id, 1)?;
        let target = self.require_subordinate(&operator, target_id)?;
        if target.group_id.is_some() && self.is_group_owner(target_id)? {
            return Err(EconError::Conflict(
                "target owns a group; delete the group first".into(),
            ));
        }
        let key = PendingKey::AccountDeletion {
            operator: operator_id,
        };
        let payload = target_id.to_string();
        let now = self.now();
        if self.pending.confirm(&key, &payload, now) {
            self.store.delete_account_cascade(target_id)?;
            self.store
                .bump_operator_stat(operator_id, OperatorStat::AccountsDeleted)?;
            log::warn!("account {target_id} deleted by {operator_id}: {reason}");
            self.log_admin(operator_id, "delete_account", target_id, reason)?;
            return Ok(ConfirmOutcome::Executed);
        }
        self.pending.arm(key, operator_id, payload, now);
        Ok(ConfirmOutcome::Armed {
            summary: format!(
                "delete account {} ({}) with {} coins — repeat to confirm",
                target_id, target.username, target.balance
            ),
        })
    }

    pub fn cancel_account_deletion(&self, operator_id: AccountId) -> EconResult<bool> {
        self.require_moderator(operator_id, 1)?;
        let key = PendingKey::AccountDeletion {
            operator: operator_id,
        };
        Ok(self.pending.cancel(&key, self.now()))
    }

    /// Group deletion is requested by the group owner or any moderator, and
    /// is keyed by tag: any authorized repeat for the same tag confirms.
    pub fn request_group_deletion(
        &self,
        operator_id: AccountId,
        tag: &str,
    ) -> EconResult<ConfirmOutcome> {
        let operator = self.require_active(operator_id)?;
        let group = self
            .store
            .group_by_tag(tag)?
            .ok_or_else(|| EconError::GroupNotFound(tag.to_string()))?;
        if group.owner_id != operator_id && operator.mod_level < 1 {
            return Err(EconError::PermissionDenied);
        }
        let key = PendingKey::GroupDeletion {
            tag: group.tag.to_uppercase(),
        };
        let payload = group.group_id.to_string();
        let now = self.now();
        if self.pending.confirm(&key, &payload, now) {
            self.store.delete_group_cascade(group.group_id)?;
            log::warn!("group [{}] deleted by {operator_id}", group.tag);
            if operator.mod_level >= 1 {
                self.log_admin(operator_id, "delete_group", group.owner_id, &group.tag)?;
            }
            return Ok(ConfirmOutcome::Executed);
        }
        let members = self.store.member_count(group.group_id)?;
        self.pending.arm(key, operator_id, payload, now);
        Ok(ConfirmOutcome::Armed {
            summary: format!(
                "delete group [{}] {} with {} members and {} coins in treasury — repeat to confirm",
                group.tag, group.name, members, group.treasury
            ),
        })
    }

    /// Same authorization as arming: the group owner or a moderator.
    pub fn cancel_group_deletion(&self, operator_id: AccountId, tag: &str) -> EconResult<bool> {
        let operator = self.require_active(operator_id)?;
        let group = self
            .store
            .group_by_tag(tag)?
            .ok_or_else(|| EconError::GroupNotFound(tag.to_string()))?;
        if group.owner_id != operator_id && operator.mod_level < 1 {
            return Err(EconError::PermissionDenied);
        }
        let key = PendingKey::GroupDeletion {
            tag: group.tag.to_uppercase(),
        };
        Ok(self.pending.cancel(&key, self.now()))
    }

    /// Global reset: wipes every non-privileged account and all groups.
    /// Requires the top of the moderation ladder.
    pub fn request_global_reset(&self, operator_id: AccountId) -> EconResult<ConfirmOutcome> {
        self.require_moderator(operator_id, 2)?;
        let key = PendingKey::GlobalReset {
            operator: operator_id,
        };
        let now = self.now();
        if self.pending.confirm(&key, "reset", now) {
            let accounts = self.store.account_count()?;
            let groups = self.store.group_count()?;
            self.store.reset_all_cascade()?;
            log::warn!("global reset executed by {operator_id}");
            self.log_admin(
                operator_id,
                "global_reset",
                operator_id,
                &format!("{accounts} accounts, {groups} groups"),
            )?;
            return Ok(ConfirmOutcome::Executed);
        }
        let accounts = self.store.account_count()?;
        let groups = self.store.group_count()?;
        self.pending.arm(key, operator_id, "reset".into(), now);
        Ok(ConfirmOutcome::Armed {
            summary: format!(
                "reset {accounts} accounts and {groups} groups — repeat to confirm"
            ),
        })
    }

    pub fn cancel_global_reset(&self, operator_id: AccountId) -> EconResult<bool> {
        self.require_moderator(operator_id, 2)?;
        let key = PendingKey::GlobalReset {
            operator: operator_id,
        };
        Ok(self.pending.cancel(&key, self.now()))
    }

    // ── Helpers ────────────────────────────────────────────────

    fn is_group_owner(&self, account_id: AccountId) -> EconResult<bool> {
        Ok(self
            .store
            .member(account_id)?
            .map(|m| m.role == GroupRole::Owner)
            .unwrap_or(false))
    }

    fn log_admin(
        &self,
        operator_id: AccountId,
        action: &str,
        target_id: AccountId,
        details: &str,
    ) -> EconResult<()> {
        self.store.log_admin_action(
            operator_id,
            action,
            &target_id.to_string(),
            details,
            self.now(),
        )
    }
}
