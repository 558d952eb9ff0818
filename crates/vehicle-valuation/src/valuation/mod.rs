//! Vehicle valuation: deterministic pricing core plus the service, storage
//! and HTTP seams around it.
//!
//! Money is carried as integer cents ([`Cents`]) and every computed
//! adjustment as a fraction. The pricing modules are pure; the reference
//! year is always passed in by the caller.

pub mod accident;
pub mod catalog;
pub mod condition;
pub mod confidence;
pub mod depreciation;
pub mod domain;
pub mod engine;
pub mod intake;
pub mod market;
pub mod providers;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use accident::{accident_impact, AccidentImpact};
pub use confidence::{
    classify, confidence_components, confidence_score, ConfidenceComponent, ConfidenceFactors,
    ConfidenceLevel, ConfidenceSignal,
};
pub use depreciation::{depreciate, depreciation_breakdown, Depreciation};
pub use domain::{
    AccidentRecord, AccidentSeverity, AdjustmentFactor, Appraisal, Cents, Condition,
    ConditionTier, EquipmentItem, PriceRange, TitleStatus, ValidationError, ValuationAdjustment, ValuationId,
    ValuationResult, VehicleFacts, VehicleSummary,
};
pub use engine::{EngineConfig, ValuationEngine};
pub use intake::{
    AccidentInput, ConditionInput, EquipmentInput, IntakeOutcome, VehicleIntake,
    VehicleSubmission,
};
pub use market::{
    market_adjustment, market_multiplier, MarketAdjustment, MarketSource, RegionClass,
    RegionClassifier, ZipPrefixClassifier,
};
pub use providers::{
    ComparableQuery, HistoryReport, HistoryReportProvider, MarketDataProvider, MarketSummary,
    ProviderError, RateLimitError, RateLimiter,
};
pub use repository::{RepositoryError, ValuationRepository};
pub use router::valuation_router;
pub use service::{ValuationService, ValuationServiceError};
