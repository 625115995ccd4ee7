//! Owned businesses: purchase and the five-stage upgrade tracks.
//!
//! Per-use income is always recomputed from the catalog and the ownership
//! level; it is never stored.

use crate::{
    config::BusinessConfig,
    engine::EconEngine,
    error::{EconError, EconResult},
    store::{AccountRow, BusinessRow},
    treasury::group_bonuses,
    types::{AccountId, Coins, Currency},
};

/// `base_income + (level - 1) * income_increase`.
pub fn business_income(config: &BusinessConfig, level: i64) -> Coins {
    config.base_income + (level - 1).max(0) * config.income_increase
}

impl EconEngine {
    /// Everything the account owns, with recomputed incomes and the group's
    /// projected cut of the next collection.
    pub fn business_overview(&self, account_id: AccountId) -> EconResult<BusinessOverview> {
        let account = self.require_account(account_id)?;
        let rows = self.store.businesses_for(account_id)?;
        let mut owned = Vec::with_capacity(rows.len());
        let mut total_income = 0;
        for row in rows {
            let config = self
                .config
                .business(row.business_id)
                .ok_or_else(|| EconError::Validation(format!("unknown business {}", row.business_id)))?;
            let income = business_income(config, row.level);
            total_income += income;
            owned.push(OwnedBusiness {
                name: config.name.clone(),
                income_per_use: income,
                next_stage_cost: self.stage_cost(config, &row),
                stage_currency: config.stage_currency,
                row,
            });
        }
        let group_cut = match account.group_id {
            Some(group_id) => match self.store.group(group_id)? {
                Some(g) => total_income * group_bonuses(g.level).business_bonus_percent / 100,
                None => 0,
            },
            None => 0,
        };
        Ok(BusinessOverview {
            owned,
            total_income,
            group_cut,
        })
    }

    /// Buy a business at catalog price. Owning it already is a conflict.
    pub fn buy_business(&self, account_id: AccountId, business_id: u32) -> EconResult<PurchaseReceipt> {
        let account = self.require_active(account_id)?;
        let config = self
            .config
            .business(business_id)
            .ok_or_else(|| EconError::Validation(format!("unknown business {business_id}")))?;
        if self.store.business(account_id, business_id)?.is_some() {
            return Err(EconError::Conflict(format!(
                "already owns {}",
                config.name
            )));
        }
        check_funds(&account, config.price, config.price_currency)?;
        self.store.purchase_business(
            account_id,
            business_id,
            config.price,
            config.price_currency,
            &format!("Bought {}", config.name),
            self.now(),
        )?;
        log::info!("account {account_id} bought business {business_id}");
        Ok(PurchaseReceipt {
            name: config.name.clone(),
            price: config.price,
            currency: config.price_currency,
        })
    }

    /// Upgrade one of the five stages. When the upgrade leaves all five
    /// counters non-zero the business levels up and the counters reset, in
    /// the same storage transaction as the debit.
    pub fn upgrade_business_stage(
        &self,
        account_id: AccountId,
        business_id: u32,
        stage: u32,
    ) -> EconResult<StageOutcome> {
        if !(1..=5).contains(&stage) {
            return Err(EconError::Validation("stage must be 1-5".into()));
        }
        let account = self.require_active(account_id)?;
        let config = self
            .config
            .business(business_id)
            .ok_or_else(|| EconError::Validation(format!("unknown business {business_id}")))?;
        let row = self
            .store
            .business(account_id, business_id)?
            .ok_or_else(|| EconError::Conflict(format!("does not own {}", config.name)))?;

        let cost = self.stage_cost(config, &row);
        check_funds(&account, cost, config.stage_currency)?;

        let (new_level, leveled_up) = self.store.upgrade_business_stage(
            account_id,
            business_id,
            stage,
            cost,
            config.stage_currency,
            &format!("Stage {stage} upgrade of {}", config.name),
            self.now(),
        )?;
        if leveled_up {
            log::info!("account {account_id}: business {business_id} reached level {new_level}");
        }
        Ok(StageOutcome {
            stage,
            cost,
            currency: config.stage_currency,
            level: new_level,
            leveled_up,
            income_per_use: business_income(config, new_level),
        })
    }

    /// Stage upgrades get pricier as the track fills up.
    fn stage_cost(&self, config: &BusinessConfig, row: &BusinessRow) -> Coins {
        config.stage_price + row.completed_stages() * self.config.stage_cost_step
    }
}

fn check_funds(account: &AccountRow, needed: Coins, currency: Currency) -> EconResult<()> {
    let available = match currency {
        Currency::Coin => account.balance,
        Currency::Token => account.tokens,
    };
    if available < needed {
        return Err(EconError::Insufficient {
            needed,
            available,
            currency,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OwnedBusiness {
    pub row: BusinessRow,
    pub name: String,
    pub income_per_use: Coins,
    pub next_stage_cost: Coins,
    pub stage_currency: Currency,
}

#[derive(Debug, Clone)]
pub struct BusinessOverview {
    pub owned: Vec<OwnedBusiness>,
    pub total_income: Coins,
    pub group_cut: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub name: String,
    pub price: Coins,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: u32,
    pub cost: Coins,
    pub currency: Currency,
    pub level: i64,
    pub leveled_up: bool,
    pub income_per_use: Coins,
}
