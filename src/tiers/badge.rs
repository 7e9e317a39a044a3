use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use super::resolver::{rank_index, resolve_tier};
use crate::types::{Tier, TierId, RANKS};

pub const DEFAULT_TIER_ICON: &str = "zap";
pub const DEFAULT_TIER_CLASS: &str = "tier-default";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub icon: String,
    pub label: String,
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBadge {
    pub id: TierId,
    #[serde(flatten)]
    pub badge: Badge,
    pub daily_profit_pct: Decimal,
    pub clicks: u32,
}

/// What a dashboard header, wallet, profile or chat row shows for a balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBadges {
    pub balance: Decimal,
    pub rank_index: usize,
    pub rank: Badge,
    pub tier: Option<TierBadge>,
}

/// Icon and style lookup for tier names. Admins can create tiers with any
/// name, so lookups fall back to a default.
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    styles: HashMap<String, (String, String)>,
}

impl BadgeCatalog {
    pub fn empty() -> Self {
        Self { styles: HashMap::new() }
    }

    pub fn with_style(mut self, tier_name: &str, icon: &str, class_name: &str) -> Self {
        self.styles.insert(
            tier_name.to_lowercase(),
            (icon.to_string(), class_name.to_string()),
        );
        self
    }

    pub fn style_for(&self, tier_name: &str) -> (&str, &str) {
        self.styles
            .get(&tier_name.trim().to_lowercase())
            .map(|(icon, class)| (icon.as_str(), class.as_str()))
            .unwrap_or((DEFAULT_TIER_ICON, DEFAULT_TIER_CLASS))
    }

    pub fn tier_badge(&self, tier: &Tier) -> TierBadge {
        let (icon, class_name) = self.style_for(&tier.name);
        TierBadge {
            id: tier.id.clone(),
            badge: Badge {
                icon: icon.to_string(),
                label: tier.name.clone(),
                class_name: class_name.to_string(),
            },
            daily_profit_pct: tier.daily_profit_pct().normalize(),
            clicks: tier.clicks,
        }
    }

    pub fn status(&self, balance: Decimal, tiers: &[Tier]) -> StatusBadges {
        let idx = rank_index(balance);
        let rank = &RANKS[idx];

        StatusBadges {
            balance,
            rank_index: idx,
            rank: Badge {
                icon: rank.icon.to_string(),
                label: rank.name.to_string(),
                class_name: rank.class_name.to_string(),
            },
            tier: resolve_tier(balance, tiers).map(|t| self.tier_badge(&t)),
        }
    }
}

impl Default for BadgeCatalog {
    fn default() -> Self {
        Self::empty()
            .with_style("Starter", "rocket", "tier-starter")
            .with_style("Advanced", "trending-up", "tier-advanced")
            .with_style("Professional", "briefcase", "tier-professional")
            .with_style("Hyperdrive", "zap", "tier-hyperdrive")
    }
}

impl StatusBadges {
    pub fn for_balance(balance: Decimal, tiers: &[Tier]) -> Self {
        BadgeCatalog::default().status(balance, tiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_with_default_table() {
        let status = StatusBadges::for_balance(dec!(1500), &Tier::default_table());
        assert_eq!(status.rank.label, "Bronze");
        assert_eq!(status.rank.icon, "medal");

        let tier = status.tier.unwrap();
        assert_eq!(tier.badge.label, "Advanced");
        assert_eq!(tier.badge.class_name, "tier-advanced");
        assert_eq!(tier.daily_profit_pct, dec!(3));
    }

    #[test]
    fn test_no_tier_badge_for_empty_table() {
        let status = StatusBadges::for_balance(dec!(250000), &[]);
        assert!(status.tier.is_none());
        assert_eq!(status.rank.label, "Platinum");
    }

    #[test]
    fn test_unknown_tier_name_falls_back() {
        let tiers = vec![Tier::new("Custom Promo", dec!(0), dec!(0.05), 4)];
        let status = BadgeCatalog::empty().status(dec!(10), &tiers);
        let tier = status.tier.unwrap();
        assert_eq!(tier.badge.icon, DEFAULT_TIER_ICON);
        assert_eq!(tier.badge.class_name, DEFAULT_TIER_CLASS);
        assert_eq!(tier.badge.label, "Custom Promo");
    }

    #[test]
    fn test_catalog_lookup_ignores_case() {
        let catalog = BadgeCatalog::default();
        assert_eq!(catalog.style_for("  STARTER "), ("rocket", "tier-starter"));
    }
}
