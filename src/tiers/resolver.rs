use rust_decimal::Decimal;

use crate::types::{Rank, Tier, RANKS};

/// Index into `RANKS` of the highest rank whose minimum is covered by `balance`.
/// Balances below every minimum map to the default rank at index 0.
pub fn rank_index(balance: Decimal) -> usize {
    RANKS
        .iter()
        .rposition(|r| r.min_balance <= balance)
        .unwrap_or(0)
}

pub fn resolve_rank(balance: Decimal) -> &'static Rank {
    &RANKS[rank_index(balance)]
}

/// Highest tier whose threshold does not exceed `balance`.
///
/// Stored order is not trusted, so the table is sorted first. The sort is
/// stable: among equal thresholds the tier appearing later in `tiers` wins.
pub fn resolve_tier(balance: Decimal, tiers: &[Tier]) -> Option<Tier> {
    let mut sorted: Vec<&Tier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.balance_threshold.cmp(&b.balance_threshold));

    sorted
        .into_iter()
        .rev()
        .find(|t| t.balance_threshold <= balance)
        .cloned()
}

/// Sort a tier table into canonical (ascending threshold) order.
pub fn sort_tiers(tiers: &mut [Tier]) {
    tiers.sort_by(|a, b| a.balance_threshold.cmp(&b.balance_threshold));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scenario_table() -> Vec<Tier> {
        vec![
            Tier::new("Base", dec!(0), dec!(0.01), 1).with_id("t0"),
            Tier::new("Mid", dec!(1000), dec!(0.02), 2).with_id("t1000"),
            Tier::new("Top", dec!(20000), dec!(0.03), 3).with_id("t20000"),
        ]
    }

    #[test]
    fn test_scenario_boundaries() {
        let table = scenario_table();
        assert_eq!(resolve_tier(dec!(999), &table).unwrap().id.as_str(), "t0");
        assert_eq!(resolve_tier(dec!(1000), &table).unwrap().id.as_str(), "t1000");
        assert_eq!(resolve_tier(dec!(500000), &table).unwrap().id.as_str(), "t20000");
    }

    #[test]
    fn test_empty_table_has_no_tier() {
        for b in [dec!(0), dec!(1), dec!(1000000)] {
            assert!(resolve_tier(b, &[]).is_none());
        }
    }

    #[test]
    fn test_below_every_threshold() {
        let table = vec![Tier::new("Only", dec!(50), dec!(0.01), 1)];
        assert!(resolve_tier(dec!(49.99), &table).is_none());
        assert!(resolve_tier(dec!(50), &table).is_some());
    }

    #[test]
    fn test_resolved_tier_is_maximal() {
        let table = scenario_table();
        for b in [0, 1, 500, 999, 1000, 1001, 19999, 20000, 20001, 1_000_000] {
            let balance = Decimal::from(b);
            let chosen = resolve_tier(balance, &table).unwrap();
            assert!(chosen.balance_threshold <= balance);
            assert!(!table
                .iter()
                .any(|t| t.balance_threshold > chosen.balance_threshold && t.balance_threshold <= balance));
        }
    }

    #[test]
    fn test_permutation_invariance() {
        let table = scenario_table();
        let permutations = [
            vec![0, 1, 2],
            vec![0, 2, 1],
            vec![1, 0, 2],
            vec![1, 2, 0],
            vec![2, 0, 1],
            vec![2, 1, 0],
        ];

        for b in [dec!(0), dec!(999), dec!(1000), dec!(15000), dec!(20000), dec!(90000)] {
            let expected = resolve_tier(b, &table);
            for perm in &permutations {
                let shuffled: Vec<Tier> = perm.iter().map(|&i| table[i].clone()).collect();
                assert_eq!(resolve_tier(b, &shuffled), expected);
            }
        }
    }

    #[test]
    fn test_duplicate_threshold_later_entry_wins() {
        let table = vec![
            Tier::new("First", dec!(100), dec!(0.01), 1).with_id("a"),
            Tier::new("Second", dec!(100), dec!(0.02), 1).with_id("b"),
        ];
        assert_eq!(resolve_tier(dec!(150), &table).unwrap().id.as_str(), "b");
    }

    #[test]
    fn test_rank_default_and_top() {
        assert_eq!(resolve_rank(dec!(0)).name, "Novice");
        assert_eq!(resolve_rank(dec!(-5)).name, "Novice");
        assert_eq!(resolve_rank(dec!(1000)).name, "Bronze");
        assert_eq!(resolve_rank(dec!(999.99)).name, "Novice");
        assert_eq!(resolve_rank(dec!(10000000)).name, "Whale");
    }

    #[test]
    fn test_rank_monotonic() {
        let mut previous = 0;
        let mut balance = Decimal::ZERO;
        while balance <= dec!(600000) {
            let idx = rank_index(balance);
            assert!(idx >= previous, "rank dropped at balance {}", balance);
            previous = idx;
            balance += dec!(250);
        }
        assert_eq!(previous, RANKS.len() - 1);
    }

    #[test]
    fn test_sort_tiers() {
        let mut table = scenario_table();
        table.reverse();
        sort_tiers(&mut table);
        let ids: Vec<&str> = table.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1000", "t20000"]);
    }
}
