#![allow(dead_code)]
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Settings key the tier table is stored under.
pub const TIER_SETTINGS_KEY: &str = "botTierSettings";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(String);

impl TierId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TierId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TierId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TierId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An admin-configurable profit band keyed by minimum balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: TierId,
    pub name: String,
    /// Inclusive minimum balance to qualify.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_threshold: Decimal,
    /// Fractional daily rate, display only (0.02 = 2%).
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_profit: Decimal,
    /// Daily grid count, display only.
    pub clicks: u32,
}

impl Tier {
    pub fn new(name: impl Into<String>, balance_threshold: Decimal, daily_profit: Decimal, clicks: u32) -> Self {
        Self {
            id: TierId::new(),
            name: name.into(),
            balance_threshold,
            daily_profit,
            clicks,
        }
    }

    pub fn with_id(mut self, id: impl Into<TierId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn daily_profit_pct(&self) -> Decimal {
        self.daily_profit * Decimal::from(100)
    }

    /// Table seeded into an empty store.
    pub fn default_table() -> Vec<Tier> {
        vec![
            Tier::new("Starter", dec!(0), dec!(0.02), 1).with_id("starter"),
            Tier::new("Advanced", dec!(1000), dec!(0.03), 2).with_id("advanced"),
            Tier::new("Professional", dec!(20000), dec!(0.04), 3).with_id("professional"),
        ]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (>= {}, {}%/day, {} clicks)",
            self.name,
            self.balance_threshold,
            self.daily_profit_pct().normalize(),
            self.clicks
        )
    }
}

/// A single-field edit applied to a tier in the editor's working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TierField {
    Name(String),
    BalanceThreshold(Decimal),
    DailyProfit(Decimal),
    Clicks(u32),
}

impl TierField {
    pub fn apply(self, tier: &mut Tier) {
        match self {
            TierField::Name(name) => tier.name = name,
            TierField::BalanceThreshold(v) => tier.balance_threshold = v,
            TierField::DailyProfit(v) => tier.daily_profit = v,
            TierField::Clicks(v) => tier.clicks = v,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TierField::Name(_) => "name",
            TierField::BalanceThreshold(_) => "balanceThreshold",
            TierField::DailyProfit(_) => "dailyProfit",
            TierField::Clicks(_) => "clicks",
        }
    }
}
