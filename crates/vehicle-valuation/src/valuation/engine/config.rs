use serde::{Deserialize, Serialize};

/// Tunables for the valuation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Half-width of the reported price range as a fraction of the estimate.
    pub price_spread: f64,
    /// Ceiling on equipment value-adds as a fraction of the pre-equipment value.
    pub equipment_cap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_spread: 0.05,
            equipment_cap: 0.15,
        }
    }
}
