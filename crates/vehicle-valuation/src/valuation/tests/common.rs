use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::ValuationSettings;
use crate::valuation::domain::{
    AccidentSeverity, Cents, Condition, EquipmentItem, TitleStatus, ValuationId, ValuationResult,
    VehicleFacts,
};
use crate::valuation::intake::{ConditionInput, EquipmentInput, VehicleSubmission};
use crate::valuation::providers::{
    ComparableQuery, HistoryReport, HistoryReportProvider, MarketDataProvider, ProviderError,
    RateLimitError, RateLimiter, Unlimited,
};
use crate::valuation::repository::{RepositoryError, ValuationRepository};
use crate::valuation::service::ValuationService;

pub(super) const REFERENCE_YEAR: i32 = 2025;
pub(super) const BMW_VIN: &str = "WBAJB0C51JB085775";

pub(super) fn settings() -> ValuationSettings {
    ValuationSettings {
        reference_year: Some(REFERENCE_YEAR),
        price_spread: 0.05,
    }
}

/// Fully described 2019 BMW 3 Series.
pub(super) fn bmw_facts() -> VehicleFacts {
    let mut facts = VehicleFacts::new("BMW", "3 Series", 2019, 25_000);
    facts.condition = Condition::Excellent;
    facts.vin = Some(BMW_VIN.to_string());
    facts.zip = Some("94103".to_string());
    facts.history_verified = true;
    facts.photo_score = Some(92);
    facts.equipment = vec![
        EquipmentItem {
            name: "Navigation".to_string(),
            value: None,
        },
        EquipmentItem {
            name: "Premium Audio".to_string(),
            value: None,
        },
    ];
    facts.transmission = Some("8-speed automatic".to_string());
    facts
}

/// Same vehicle without identifiers or reports, with a title record and an open recall.
pub(super) fn degraded_bmw_facts() -> VehicleFacts {
    let mut facts = bmw_facts();
    facts.vin = None;
    facts.zip = None;
    facts.history_verified = false;
    facts.photo_score = None;
    facts.title_status = Some(TitleStatus::Clean);
    facts.open_recalls = 1;
    facts
}

pub(super) fn bmw_submission() -> VehicleSubmission {
    VehicleSubmission {
        make: "BMW".to_string(),
        model: "3 Series".to_string(),
        year: Some(2019),
        mileage: Some(25_000.0),
        condition: Some(ConditionInput::Label("Excellent".to_string())),
        vin: Some(BMW_VIN.to_string()),
        zip: Some("94103".to_string()),
        equipment: vec![
            EquipmentInput::Name("Navigation".to_string()),
            EquipmentInput::Name("Premium Audio".to_string()),
        ],
        transmission: Some("8-speed automatic".to_string()),
        photo_score: Some(92),
        ..VehicleSubmission::default()
    }
}

pub(super) fn invalid_submission() -> VehicleSubmission {
    VehicleSubmission {
        mileage: Some(-10.0),
        ..bmw_submission()
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<BTreeMap<ValuationId, ValuationResult>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl ValuationRepository for MemoryRepository {
    fn insert(&self, result: ValuationResult) -> Result<ValuationResult, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&result.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(result.id.clone(), result.clone());
        Ok(result)
    }

    fn fetch(&self, id: &ValuationId) -> Result<Option<ValuationResult>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ValuationResult>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().rev().take(limit).cloned().collect())
    }
}

pub(super) struct ConflictRepository;

impl ValuationRepository for ConflictRepository {
    fn insert(&self, _result: ValuationResult) -> Result<ValuationResult, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &ValuationId) -> Result<Option<ValuationResult>, RepositoryError> {
        Ok(None)
    }

    fn recent(&self, _limit: usize) -> Result<Vec<ValuationResult>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl ValuationRepository for UnavailableRepository {
    fn insert(&self, _result: ValuationResult) -> Result<ValuationResult, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ValuationId) -> Result<Option<ValuationResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<ValuationResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct FixedHistory(pub(super) HistoryReport);

impl HistoryReportProvider for FixedHistory {
    fn lookup(&self, _vin: &str) -> Result<Option<HistoryReport>, ProviderError> {
        Ok(Some(self.0.clone()))
    }
}

pub(super) fn rebuilt_history() -> HistoryReport {
    HistoryReport {
        accident_count: 1,
        worst_severity: Some(AccidentSeverity::Moderate),
        title_status: Some(TitleStatus::Rebuilt),
        open_recalls: 0,
    }
}

pub(super) struct OfflineProvider;

impl HistoryReportProvider for OfflineProvider {
    fn lookup(&self, _vin: &str) -> Result<Option<HistoryReport>, ProviderError> {
        Err(ProviderError::Unavailable("vendor timeout".to_string()))
    }
}

impl MarketDataProvider for OfflineProvider {
    fn comparables(&self, _query: &ComparableQuery) -> Result<Vec<Cents>, ProviderError> {
        Err(ProviderError::Unavailable("vendor timeout".to_string()))
    }
}

/// Canned comparable listings standing in for a market data feed.
pub(super) struct FakeListings(pub(super) Vec<Cents>);

impl MarketDataProvider for FakeListings {
    fn comparables(&self, _query: &ComparableQuery) -> Result<Vec<Cents>, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Allows `budget` checks in total, then rejects.
pub(super) struct BudgetLimiter {
    budget: u32,
    used: AtomicU32,
}

impl BudgetLimiter {
    pub(super) fn new(budget: u32) -> Self {
        Self {
            budget,
            used: AtomicU32::new(0),
        }
    }
}

impl RateLimiter for BudgetLimiter {
    fn check(&self, _key: &str) -> Result<(), RateLimitError> {
        let used = self.used.fetch_add(1, Ordering::SeqCst);
        if used < self.budget {
            Ok(())
        } else {
            Err(RateLimitError::Exceeded {
                retry_after_secs: 30,
            })
        }
    }
}

pub(super) fn build_service() -> (
    ValuationService<MemoryRepository, Unlimited>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let service = ValuationService::new(repository.clone(), Arc::new(Unlimited), &settings());
    (service, repository)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
