mod config;
mod steps;

pub use config::EngineConfig;

use std::sync::Arc;

use super::catalog;
use super::confidence::{confidence_score, ConfidenceLevel};
use super::domain::{Appraisal, Cents, PriceRange, ValidationError, VehicleFacts};
use super::market::{RegionClassifier, ZipPrefixClassifier};
use steps::run_pipeline;

/// Stateless valuation pipeline: depreciation, condition, accident history,
/// local market and equipment, followed by confidence scoring.
pub struct ValuationEngine {
    config: EngineConfig,
    classifier: Option<Arc<dyn RegionClassifier>>,
}

impl ValuationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_classifier(config, Arc::new(ZipPrefixClassifier))
    }

    pub fn with_classifier(config: EngineConfig, classifier: Arc<dyn RegionClassifier>) -> Self {
        Self {
            config,
            classifier: Some(classifier),
        }
    }

    /// Table lookups only; untabulated ZIP codes are neutral.
    pub fn without_classifier(config: EngineConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prices `facts` as of `reference_year`. Without an explicit base value
    /// the make's catalog baseline is used.
    pub fn appraise(
        &self,
        facts: &VehicleFacts,
        base_value: Option<Cents>,
        reference_year: i32,
    ) -> Result<Appraisal, ValidationError> {
        let base_value = base_value.unwrap_or_else(|| catalog::base_price(&facts.make));
        let output = run_pipeline(
            facts,
            base_value,
            reference_year,
            &self.config,
            self.classifier.as_deref(),
        )?;

        let confidence_score = confidence_score(&facts.confidence_factors(reference_year));

        Ok(Appraisal {
            vehicle: facts.summary(),
            reference_year,
            base_value: output.base_value,
            estimated_value: output.estimated_value,
            price_range: PriceRange::around(output.estimated_value, self.config.price_spread),
            confidence_score,
            confidence_level: ConfidenceLevel::from_score(confidence_score),
            adjustments: output.adjustments,
            accident: output.accident,
            market: output.market,
        })
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
