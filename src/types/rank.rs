#![allow(dead_code)]
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankIcon {
    Shield,
    Medal,
    Star,
    Award,
    Gem,
    Diamond,
    Crown,
}

impl RankIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankIcon::Shield => "shield",
            RankIcon::Medal => "medal",
            RankIcon::Star => "star",
            RankIcon::Award => "award",
            RankIcon::Gem => "gem",
            RankIcon::Diamond => "diamond",
            RankIcon::Crown => "crown",
        }
    }
}

impl fmt::Display for RankIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A compiled-in cosmetic status band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rank {
    pub name: &'static str,
    pub icon: RankIcon,
    pub class_name: &'static str,
    pub min_balance: Decimal,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

const fn rank(name: &'static str, min_balance: u32, icon: RankIcon, class_name: &'static str) -> Rank {
    Rank {
        name,
        icon,
        class_name,
        min_balance: Decimal::from_parts(min_balance, 0, 0, false, 0),
    }
}

/// Ascending by `min_balance`; the first entry is the default rank.
pub static RANKS: [Rank; 7] = [
    rank("Novice", 0, RankIcon::Shield, "rank-novice"),
    rank("Bronze", 1_000, RankIcon::Medal, "rank-bronze"),
    rank("Silver", 5_000, RankIcon::Star, "rank-silver"),
    rank("Gold", 20_000, RankIcon::Award, "rank-gold"),
    rank("Platinum", 50_000, RankIcon::Gem, "rank-platinum"),
    rank("Diamond", 100_000, RankIcon::Diamond, "rank-diamond"),
    rank("Whale", 500_000, RankIcon::Crown, "rank-whale"),
];
