//! Shared primitive types and the closed enums stored as text in SQLite.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A stable account identifier (assigned by the embedding front end).
pub type AccountId = i64;

/// Row id of a group.
pub type GroupId = i64;

/// Whole-unit currency amount. All balance math is integral.
pub type Coins = i64;

/// The two balances an account carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Coin,
    Token,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Coin => "coin",
            Currency::Token => "token",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "coin" => Some(Currency::Coin),
            "token" => Some(Currency::Token),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a redeemable code pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Coins,
    Tokens,
}

impl RewardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardKind::Coins => "coins",
            RewardKind::Tokens => "tokens",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "coins" => Some(RewardKind::Coins),
            "tokens" => Some(RewardKind::Tokens),
            _ => None,
        }
    }
}

/// Ledger transaction category. Closed set — every balance mutation names one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxCategory {
    ToolIncome,
    ToolUpgrade,
    BusinessPurchase,
    BusinessUpgrade,
    PromoReward,
    TransferSent,
    TransferReceived,
    GroupCreate,
    GroupDeposit,
    GroupPayout,
    AdminAdd,
    AdminRemove,
    AdminSet,
}

impl TxCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TxCategory::ToolIncome => "tool_income",
            TxCategory::ToolUpgrade => "tool_upgrade",
            TxCategory::BusinessPurchase => "business_purchase",
            TxCategory::BusinessUpgrade => "business_upgrade",
            TxCategory::PromoReward => "promo_reward",
            TxCategory::TransferSent => "transfer_sent",
            TxCategory::TransferReceived => "transfer_received",
            TxCategory::GroupCreate => "group_create",
            TxCategory::GroupDeposit => "group_deposit",
            TxCategory::GroupPayout => "group_payout",
            TxCategory::AdminAdd => "admin_add",
            TxCategory::AdminRemove => "admin_remove",
            TxCategory::AdminSet => "admin_set",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tool_income" => Some(TxCategory::ToolIncome),
            "tool_upgrade" => Some(TxCategory::ToolUpgrade),
            "business_purchase" => Some(TxCategory::BusinessPurchase),
            "business_upgrade" => Some(TxCategory::BusinessUpgrade),
            "promo_reward" => Some(TxCategory::PromoReward),
            "transfer_sent" => Some(TxCategory::TransferSent),
            "transfer_received" => Some(TxCategory::TransferReceived),
            "group_create" => Some(TxCategory::GroupCreate),
            "group_deposit" => Some(TxCategory::GroupDeposit),
            "group_payout" => Some(TxCategory::GroupPayout),
            "admin_add" => Some(TxCategory::AdminAdd),
            "admin_remove" => Some(TxCategory::AdminRemove),
            "admin_set" => Some(TxCategory::AdminSet),
            _ => None,
        }
    }
}

/// Membership role inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Owner,
    Officer,
    Member,
}

impl GroupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Owner => "owner",
            GroupRole::Officer => "officer",
            GroupRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(GroupRole::Owner),
            "officer" => Some(GroupRole::Officer),
            "member" => Some(GroupRole::Member),
            _ => None,
        }
    }

    /// Owners and officers may spend from the treasury.
    pub fn can_manage(self) -> bool {
        matches!(self, GroupRole::Owner | GroupRole::Officer)
    }
}

/// Treasury log category. One row per treasury movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreasuryCategory {
    Deposit,
    LiftIncome,
    BusinessIncome,
    Upgrade,
    Distribution,
}

impl TreasuryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TreasuryCategory::Deposit => "deposit",
            TreasuryCategory::LiftIncome => "lift_income",
            TreasuryCategory::BusinessIncome => "business_income",
            TreasuryCategory::Upgrade => "upgrade",
            TreasuryCategory::Distribution => "distribution",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(TreasuryCategory::Deposit),
            "lift_income" => Some(TreasuryCategory::LiftIncome),
            "business_income" => Some(TreasuryCategory::BusinessIncome),
            "upgrade" => Some(TreasuryCategory::Upgrade),
            "distribution" => Some(TreasuryCategory::Distribution),
            _ => None,
        }
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                <$ty>::parse(s).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {}: {s}", stringify!($ty)).into())
                })
            }
        }
    };
}

sql_text_enum!(Currency);
sql_text_enum!(RewardKind);
sql_text_enum!(TxCategory);
sql_text_enum!(GroupRole);
sql_text_enum!(TreasuryCategory);
