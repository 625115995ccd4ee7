//! Redeemable codes: moderator-created, single-use-per-account, drawing on
//! a shared uses pool.

use crate::{
    engine::EconEngine,
    error::{EconError, EconResult},
    store::PromoRow,
    types::{AccountId, Coins, Currency, RewardKind},
};
use chrono::Duration;

impl EconEngine {
    /// Create a code. Terms are immutable once created.
    #[allow(clippy::too_many_arguments)]
    pub fn create_promo(
        &self,
        operator_id: AccountId,
        code: &str,
        uses: i64,
        reward_kind: RewardKind,
        amount: Coins,
        expires_days: Option<i64>,
    ) -> EconResult<PromoRow> {
        self.require_moderator(operator_id, 1)?;
        let code = normalize_code(code)?;
        if uses <= 0 {
            return Err(EconError::Validation("uses must be positive".into()));
        }
        if amount <= 0 {
            return Err(EconError::Validation("amount must be positive".into()));
        }
        if self.store.promo(&code)?.is_some() {
            return Err(EconError::Conflict(format!("code '{code}' already exists")));
        }
        let now = self.now();
        let promo = PromoRow {
            code: code.clone(),
            uses_total: uses,
            uses_left: uses,
            reward_kind,
            amount,
            created_by: operator_id,
            created_at: now.to_rfc3339(),
            expires_at: expires_days.map(|d| (now + Duration::days(d)).to_rfc3339()),
            active: true,
        };
        self.store.insert_promo(&promo)?;
        self.store.log_admin_action(
            operator_id,
            "promo_create",
            &code,
            &format!("{uses} uses, {amount} {}", reward_kind.as_str()),
            now,
        )?;
        log::info!("promo '{code}' created by {operator_id}");
        Ok(promo)
    }

    /// Redeem a code. Checks run in a fixed order: the code must exist, be
    /// active, not be expired, have uses left, and not have been redeemed by
    /// this account before. The decrement, credit, and redemption record
    /// land in one storage transaction.
    pub fn redeem_code(&self, account_id: AccountId, code: &str) -> EconResult<RedeemOutcome> {
        let account = self.require_active(account_id)?;
        let code = normalize_code(code)?;
        let promo = self
            .store
            .promo(&code)?
            .ok_or_else(|| EconError::CodeNotFound(code.clone()))?;
        if !promo.active {
            return Err(EconError::Validation(format!("code '{code}' is disabled")));
        }
        if let Some(expires_at) = &promo.expires_at {
            if Self::parse_ts(expires_at)? <= self.now() {
                return Err(EconError::Validation(format!("code '{code}' has expired")));
            }
        }
        if promo.uses_left <= 0 {
            return Err(EconError::Conflict(format!(
                "code '{code}' has no uses left"
            )));
        }
        let redeemed: Vec<String> = serde_json::from_str(&account.redeemed_codes)?;
        if redeemed.iter().any(|c| c == &code) {
            return Err(EconError::Conflict(format!("code '{code}' already redeemed")));
        }

        let currency = match promo.reward_kind {
            RewardKind::Coins => Currency::Coin,
            RewardKind::Tokens => Currency::Token,
        };
        let applied = self
            .store
            .redeem_promo(account_id, &code, currency, promo.amount, self.now())?;
        if !applied {
            // A concurrent redeemer drained the pool between the read
            // and the guarded decrement.
            return Err(EconError::Conflict(format!(
                "code '{code}' has no uses left"
            )));
        }
        log::info!("account {account_id} redeemed '{code}'");
        Ok(RedeemOutcome {
            code,
            reward_kind: promo.reward_kind,
            amount: promo.amount,
            uses_left: promo.uses_left - 1,
        })
    }

    pub fn promo_info(&self, operator_id: AccountId, code: &str) -> EconResult<PromoRow> {
        self.require_moderator(operator_id, 1)?;
        let code = normalize_code(code)?;
        self.store
            .promo(&code)?
            .ok_or(EconError::CodeNotFound(code))
    }

    pub fn list_promos(&self, operator_id: AccountId) -> EconResult<Vec<PromoRow>> {
        self.require_moderator(operator_id, 1)?;
        self.store.promos()
    }

    pub fn delete_promo(&self, operator_id: AccountId, code: &str) -> EconResult<()> {
        self.require_moderator(operator_id, 1)?;
        let code = normalize_code(code)?;
        if !self.store.delete_promo(&code)? {
            return Err(EconError::CodeNotFound(code));
        }
        self.store
            .log_admin_action(operator_id, "promo_delete", &code, "", self.now())?;
        Ok(())
    }
}

/// Codes are stored and matched uppercase.
fn normalize_code(code: &str) -> EconResult<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() || code.chars().count() > 32 {
        return Err(EconError::Validation("code must be 1-32 characters".into()));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(EconError::Validation(
            "code may only contain letters, digits, underscores".into(),
        ));
    }
    Ok(code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemOutcome {
    pub code: String,
    pub reward_kind: RewardKind,
    pub amount: Coins,
    pub uses_left: i64,
}
