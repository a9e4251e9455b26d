use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Retirement,
    Deduction,
    Timing,
    Entity,
    Family,
    Credit,
}

impl fmt::Display for Category {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Retirement => "retirement",
            Self::Deduction => "deduction",
            Self::Timing => "timing",
            Self::Entity => "entity",
            Self::Family => "family",
            Self::Credit => "credit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    Medium,
    Advanced,
}

impl fmt::Display for Complexity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Advanced => "advanced",
        };
        f.write_str(name)
    }
}

/// A recommended action with its estimated dollar benefit.
///
/// `id` identifies the rule that produced it and is only stable per rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationOpportunity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub complexity: Complexity,
    /// 0 to 100.
    pub confidence: u8,
    /// Whole dollars.
    pub potential_savings: Decimal,
    pub action_items: Vec<String>,
}

/// A concrete change to the return and the refund it would produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub complexity: Complexity,
    pub confidence: u8,
    pub current_refund: Decimal,
    pub new_refund: Decimal,
    /// Whole dollars.
    pub savings: Decimal,
    /// Human-readable deltas, in the order they should be applied.
    pub changes: Vec<String>,
    pub time_to_implement: String,
}
