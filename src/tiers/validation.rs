use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::types::{Tier, TierId};

/// A rule violation on one field of one tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub tier_id: TierId,
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}: {} {}", self.tier_id, self.field, self.message)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{}", format_errors(.0))]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    #[cfg(test)]
    pub fn has(&self, tier_id: &TierId, field: &str) -> bool {
        self.0.iter().any(|e| &e.tier_id == tier_id && e.field == field)
    }
}

fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field rules for a single tier.
pub fn validate_tier(tier: &Tier) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut push = |field: &'static str, message: &str| {
        errors.push(FieldError {
            tier_id: tier.id.clone(),
            field,
            message: message.to_string(),
        });
    };

    if tier.name.trim().is_empty() {
        push("name", "must not be empty");
    }
    if tier.balance_threshold < Decimal::ZERO {
        push("balanceThreshold", "must be >= 0");
    }
    if tier.daily_profit < Decimal::ZERO || tier.daily_profit > Decimal::ONE {
        push("dailyProfit", "must be between 0 and 1");
    }
    if tier.clicks < 1 {
        push("clicks", "must be >= 1");
    }

    errors
}

/// Field rules for every tier plus table-wide uniqueness of ids and thresholds.
pub fn validate_table(tiers: &[Tier]) -> Result<(), ValidationError> {
    let mut errors: Vec<FieldError> = tiers.iter().flat_map(validate_tier).collect();

    let mut ids = HashSet::new();
    let mut thresholds = HashSet::new();
    for tier in tiers {
        if !ids.insert(&tier.id) {
            errors.push(FieldError {
                tier_id: tier.id.clone(),
                field: "id",
                message: "is duplicated".to_string(),
            });
        }
        if !thresholds.insert(tier.balance_threshold.normalize()) {
            errors.push(FieldError {
                tier_id: tier.id.clone(),
                field: "balanceThreshold",
                message: format!("{} is already used by another tier", tier.balance_threshold),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid() -> Tier {
        Tier::new("Gold", dec!(1000), dec!(0.02), 2).with_id("gold")
    }

    #[test]
    fn test_valid_tier_passes() {
        assert!(validate_tier(&valid()).is_empty());
        assert!(validate_table(&Tier::default_table()).is_ok());
        assert!(validate_table(&[]).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_fields() {
        let cases = [
            (Tier { daily_profit: dec!(1.5), ..valid() }, "dailyProfit"),
            (Tier { clicks: 0, ..valid() }, "clicks"),
            (Tier { balance_threshold: dec!(-1), ..valid() }, "balanceThreshold"),
            (Tier { name: String::new(), ..valid() }, "name"),
            (Tier { name: "   ".to_string(), ..valid() }, "name"),
            (Tier { daily_profit: dec!(-0.01), ..valid() }, "dailyProfit"),
        ];

        for (tier, field) in cases {
            let err = validate_table(&[tier.clone()]).unwrap_err();
            assert!(err.has(&tier.id, field), "expected {} error for {:?}", field, tier);
            assert_eq!(err.errors().len(), 1);
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let tier = Tier { daily_profit: dec!(1), balance_threshold: dec!(0), clicks: 1, ..valid() };
        assert!(validate_tier(&tier).is_empty());
    }

    #[test]
    fn test_rejects_duplicate_thresholds() {
        let a = Tier::new("A", dec!(100), dec!(0.01), 1).with_id("a");
        let b = Tier::new("B", dec!(100.00), dec!(0.02), 1).with_id("b");
        let err = validate_table(&[a, b]).unwrap_err();
        assert!(err.has(&TierId::from("b"), "balanceThreshold"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let a = Tier::new("A", dec!(0), dec!(0.01), 1).with_id("same");
        let b = Tier::new("B", dec!(10), dec!(0.01), 1).with_id("same");
        let err = validate_table(&[a, b]).unwrap_err();
        assert!(err.has(&TierId::from("same"), "id"));
    }

    #[test]
    fn test_error_message_lists_fields() {
        let tier = Tier { name: String::new(), clicks: 0, ..valid() };
        let err = validate_table(&[tier]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("name must not be empty"));
        assert!(msg.contains("clicks must be >= 1"));
    }
}
