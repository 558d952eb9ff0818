use serde::{Deserialize, Serialize};

use super::domain::{Condition, ConditionTier, ValidationError};

/// Fractional adjustment for the reported condition tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionAdjustment {
    pub tier: ConditionTier,
    pub percent: f64,
    pub description: String,
}

pub fn condition_percent(tier: ConditionTier) -> f64 {
    match tier {
        ConditionTier::Excellent => 0.05,
        ConditionTier::Good => 0.0,
        ConditionTier::Fair => -0.10,
        ConditionTier::Poor => -0.25,
    }
}

pub fn condition_adjustment(condition: Condition) -> Result<ConditionAdjustment, ValidationError> {
    let tier = condition.tier()?;
    let percent = condition_percent(tier);
    let description = match condition {
        Condition::Score(score) => format!(
            "{} condition (scored {score}/100, {:+.0}%)",
            tier.label(),
            percent * 100.0
        ),
        _ => format!("{} condition ({:+.0}%)", tier.label(), percent * 100.0),
    };

    Ok(ConditionAdjustment {
        tier,
        percent,
        description,
    })
}
