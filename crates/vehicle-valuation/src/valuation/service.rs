use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Local};
use tracing::{debug, info, warn};

use super::domain::{ValidationError, ValuationId, ValuationResult};
use super::engine::{EngineConfig, ValuationEngine};
use super::intake::{VehicleIntake, VehicleSubmission};
use super::providers::{
    summarize_comparables, ComparableQuery, HistoryReportProvider, MarketDataProvider,
    NoHistoryReports, NoMarketData, RateLimitError, RateLimiter,
};
use super::repository::{RepositoryError, ValuationRepository};
use crate::config::ValuationSettings;

/// Service composing rate limiting, intake, enrichment, pricing and storage.
pub struct ValuationService<R, L> {
    engine: Arc<ValuationEngine>,
    repository: Arc<R>,
    limiter: Arc<L>,
    history: Arc<dyn HistoryReportProvider>,
    market_data: Arc<dyn MarketDataProvider>,
    reference_year: Option<i32>,
}

static VALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_valuation_id() -> ValuationId {
    let id = VALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ValuationId(format!("val-{id:06}"))
}

impl<R, L> ValuationService<R, L>
where
    R: ValuationRepository + 'static,
    L: RateLimiter + 'static,
{
    pub fn new(repository: Arc<R>, limiter: Arc<L>, settings: &ValuationSettings) -> Self {
        let engine = ValuationEngine::new(EngineConfig {
            price_spread: settings.price_spread,
            ..EngineConfig::default()
        });
        Self::with_engine(engine, repository, limiter, settings.reference_year)
    }

    pub fn with_engine(
        engine: ValuationEngine,
        repository: Arc<R>,
        limiter: Arc<L>,
        reference_year: Option<i32>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            repository,
            limiter,
            history: Arc::new(NoHistoryReports),
            market_data: Arc::new(NoMarketData),
            reference_year,
        }
    }

    pub fn with_history_provider(mut self, provider: Arc<dyn HistoryReportProvider>) -> Self {
        self.history = provider;
        self
    }

    pub fn with_market_data(mut self, provider: Arc<dyn MarketDataProvider>) -> Self {
        self.market_data = provider;
        self
    }

    /// Configured override, else the current calendar year. The clock is read
    /// here and nowhere below.
    pub fn reference_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| Local::now().date_naive().year())
    }

    /// Validate, enrich, price and persist a submission for `client_key`.
    pub fn appraise(
        &self,
        client_key: &str,
        submission: VehicleSubmission,
    ) -> Result<ValuationResult, ValuationServiceError> {
        self.limiter.check(client_key)?;

        let reference_year = self.reference_year();
        let outcome = VehicleIntake::new(reference_year).facts_from_submission(submission)?;
        let mut facts = outcome.facts;

        let mut history_report = false;
        if let Some(vin) = facts.vin.clone() {
            match self.history.lookup(&vin) {
                Ok(Some(report)) => {
                    debug!(%vin, accidents = report.accident_count, "history report applied");
                    report.apply_to(&mut facts);
                    history_report = true;
                }
                Ok(None) => debug!(%vin, "no history report on file"),
                Err(err) => warn!(%vin, error = %err, "history report lookup failed"),
            }
        }

        let appraisal = self
            .engine
            .appraise(&facts, outcome.base_value, reference_year)?;

        let market_summary = match self.market_data.comparables(&ComparableQuery::from(&facts)) {
            Ok(prices) if prices.is_empty() => None,
            Ok(prices) => Some(summarize_comparables(&prices)),
            Err(err) => {
                warn!(make = %facts.make, model = %facts.model, error = %err, "comparable listings unavailable");
                None
            }
        };

        let result = ValuationResult {
            id: next_valuation_id(),
            appraisal,
            history_report,
            market_summary,
        };
        let stored = self.repository.insert(result)?;

        info!(
            valuation_id = %stored.id,
            make = %stored.appraisal.vehicle.make,
            model = %stored.appraisal.vehicle.model,
            estimated_cents = stored.appraisal.estimated_value.0,
            confidence = stored.appraisal.confidence_score,
            "valuation recorded"
        );

        Ok(stored)
    }

    pub fn get(&self, id: &ValuationId) -> Result<ValuationResult, ValuationServiceError> {
        let result = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(result)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<ValuationResult>, ValuationServiceError> {
        Ok(self.repository.recent(limit)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValuationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
