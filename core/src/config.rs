//! Engine configuration: the tool catalog, the business catalog, and the
//! economy tunables. Ships with built-in defaults; `EconConfig::load` reads a
//! JSON override file for deployments that want a different catalog.

use crate::types::{Coins, Currency};
use serde::{Deserialize, Serialize};

/// One level of the primary-tool catalog. Levels are 1-based and contiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub level: u32,
    pub name: String,
    pub income_per_use: Coins,
    pub power_per_use: i64,
    /// Cost of advancing *to* this level. Level 1 is the starting tool.
    pub price: Coins,
}

/// One entry of the business catalog. `business_id` is 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub business_id: u32,
    pub name: String,
    pub price: Coins,
    pub price_currency: Currency,
    pub base_income: Coins,
    pub income_increase: Coins,
    pub stage_price: Coins,
    pub stage_currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconConfig {
    pub tools: Vec<ToolConfig>,
    pub businesses: Vec<BusinessConfig>,
    pub tool_cooldown_secs: i64,
    pub group_creation_cost: Coins,
    pub group_upgrade_base_cost: Coins,
    pub transfer_commission_percent: i64,
    pub transfer_commission_min: Coins,
    pub transfer_min_amount: Coins,
    /// Extra cost added to a stage upgrade per already-completed stage.
    pub stage_cost_step: Coins,
    pub pending_ttl_secs: i64,
}

impl EconConfig {
    /// Load a JSON config file. Missing fields fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EconConfig = serde_json::from_str(&content)?;
        if config.tools.is_empty() {
            anyhow::bail!("tool catalog must not be empty");
        }
        Ok(config)
    }

    pub fn max_tool_level(&self) -> u32 {
        self.tools.len() as u32
    }

    pub fn tool(&self, level: u32) -> Option<&ToolConfig> {
        self.tools.get(level.checked_sub(1)? as usize)
    }

    pub fn business(&self, business_id: u32) -> Option<&BusinessConfig> {
        self.businesses
            .iter()
            .find(|b| b.business_id == business_id)
    }
}

impl Default for EconConfig {
    fn default() -> Self {
        let tools = (1u32..=20)
            .map(|level| {
                let n = level as i64;
                ToolConfig {
                    level,
                    name: format!("{} kg dumbbell", 5 * n),
                    income_per_use: 10 + (n - 1) * 5,
                    power_per_use: n,
                    price: 100 * (n - 1) * n,
                }
            })
            .collect();

        let businesses = vec![
            BusinessConfig {
                business_id: 1,
                name: "Basement Gym".into(),
                price: 5_000,
                price_currency: Currency::Coin,
                base_income: 100,
                income_increase: 25,
                stage_price: 500,
                stage_currency: Currency::Coin,
            },
            BusinessConfig {
                business_id: 2,
                name: "Supplement Shop".into(),
                price: 20_000,
                price_currency: Currency::Coin,
                base_income: 350,
                income_increase: 75,
                stage_price: 1_500,
                stage_currency: Currency::Coin,
            },
            BusinessConfig {
                business_id: 3,
                name: "Fitness Arena".into(),
                price: 50,
                price_currency: Currency::Token,
                base_income: 1_000,
                income_increase: 200,
                stage_price: 10,
                stage_currency: Currency::Token,
            },
        ];

        Self {
            tools,
            businesses,
            tool_cooldown_secs: 60,
            group_creation_cost: 1_000,
            group_upgrade_base_cost: 5_000,
            transfer_commission_percent: 5,
            transfer_commission_min: 1,
            transfer_min_amount: 10,
            stage_cost_step: 50,
            pending_ttl_secs: 600,
        }
    }
}
