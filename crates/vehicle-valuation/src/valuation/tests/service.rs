use std::sync::Arc;

use super::common::*;
use crate::valuation::domain::{AccidentSeverity, Cents, TitleStatus, ValidationError, ValuationId};
use crate::valuation::providers::{RateLimitError, Unlimited};
use crate::valuation::repository::RepositoryError;
use crate::valuation::service::{ValuationService, ValuationServiceError};

#[test]
fn appraise_persists_result_with_generated_id() {
    let (service, repository) = build_service();

    let result = service
        .appraise("203.0.113.9", bmw_submission())
        .expect("bmw valuation succeeds");

    assert!(result.id.0.starts_with("val-"));
    assert_eq!(result.appraisal.reference_year, REFERENCE_YEAR);
    assert_eq!(result.appraisal.confidence_score, 85);
    assert!(!result.history_report);
    assert!(result.market_summary.is_none());
    assert_eq!(repository.len(), 1);

    let fetched = service.get(&result.id).expect("stored valuation");
    assert_eq!(fetched, result);
}

#[test]
fn consecutive_valuations_get_distinct_ids() {
    let (service, repository) = build_service();

    let first = service
        .appraise("client", bmw_submission())
        .expect("first valuation");
    let second = service
        .appraise("client", bmw_submission())
        .expect("second valuation");

    assert_ne!(first.id, second.id);
    assert_eq!(first.appraisal, second.appraisal);
    assert_eq!(repository.len(), 2);
    assert_eq!(service.recent(10).expect("recent valuations").len(), 2);
}

#[test]
fn history_report_is_layered_over_submission() {
    let (service, _) = build_service();
    let service = service.with_history_provider(Arc::new(FixedHistory(rebuilt_history())));

    let result = service
        .appraise("client", bmw_submission())
        .expect("valuation with history");

    assert!(result.history_report);
    assert!(!result.appraisal.accident.is_clean());
    assert!(result.appraisal.accident.description.contains("moderate"));
    // history +15, title record -10 against the unreported baseline of 85
    assert_eq!(result.appraisal.confidence_score, 90);
}

#[test]
fn declared_accidents_are_not_lowered_by_history() {
    let (service, _) = build_service();
    let service = service.with_history_provider(Arc::new(FixedHistory(rebuilt_history())));
    let mut submission = bmw_submission();
    submission.accident = Some(crate::valuation::intake::AccidentInput {
        count: 3,
        severity: Some("severe".to_string()),
        description: None,
    });

    let result = service
        .appraise("client", submission)
        .expect("valuation with declared accidents");

    assert!(result.appraisal.accident.description.starts_with("3 severe"));
}

#[test]
fn unavailable_providers_do_not_block_valuation() {
    let (service, _) = build_service();
    let service = service
        .with_history_provider(Arc::new(OfflineProvider))
        .with_market_data(Arc::new(OfflineProvider));

    let result = service
        .appraise("client", bmw_submission())
        .expect("valuation without providers");

    assert!(!result.history_report);
    assert!(result.market_summary.is_none());
}

#[test]
fn comparable_listings_are_summarized() {
    let (service, _) = build_service();
    let service = service.with_market_data(Arc::new(FakeListings(vec![
        Cents::from_dollars(27_000),
        Cents::from_dollars(29_500),
        Cents::from_dollars(31_000),
    ])));

    let result = service
        .appraise("client", bmw_submission())
        .expect("valuation with comparables");

    let summary = result.market_summary.expect("market summary");
    assert_eq!(summary.sample_size, 3);
    assert_eq!(summary.low, Cents::from_dollars(27_000));
    assert_eq!(summary.high, Cents::from_dollars(31_000));
    assert_eq!(summary.average, Cents(2_916_667));
}

#[test]
fn invalid_submission_is_not_persisted() {
    let (service, repository) = build_service();

    let err = service
        .appraise("client", invalid_submission())
        .expect_err("negative mileage rejected");

    assert!(matches!(
        err,
        ValuationServiceError::Validation(ValidationError::InvalidMileage(_))
            | ValuationServiceError::Validation(ValidationError::NegativeValue { .. })
    ));
    assert_eq!(repository.len(), 0);
}

#[test]
fn rate_limit_rejects_before_validation() {
    let repository = Arc::new(MemoryRepository::default());
    let service = ValuationService::new(
        repository.clone(),
        Arc::new(BudgetLimiter::new(1)),
        &settings(),
    );

    service
        .appraise("client", bmw_submission())
        .expect("first request within budget");
    let err = service
        .appraise("client", invalid_submission())
        .expect_err("second request limited");

    assert!(matches!(
        err,
        ValuationServiceError::RateLimited(RateLimitError::Exceeded {
            retry_after_secs: 30
        })
    ));
    assert_eq!(repository.len(), 1);
}

#[test]
fn repository_failures_surface_as_repository_errors() {
    let service = ValuationService::new(
        Arc::new(ConflictRepository),
        Arc::new(Unlimited),
        &settings(),
    );
    assert!(matches!(
        service.appraise("client", bmw_submission()),
        Err(ValuationServiceError::Repository(RepositoryError::Conflict))
    ));

    let service = ValuationService::new(
        Arc::new(UnavailableRepository),
        Arc::new(Unlimited),
        &settings(),
    );
    assert!(matches!(
        service.get(&ValuationId("val-000001".to_string())),
        Err(ValuationServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn missing_valuation_is_not_found() {
    let (service, _) = build_service();
    assert!(matches!(
        service.get(&ValuationId("val-999999".to_string())),
        Err(ValuationServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn reference_year_override_is_used() {
    let (service, _) = build_service();
    assert_eq!(service.reference_year(), REFERENCE_YEAR);
}

#[test]
fn history_title_brand_replaces_submitted_title() {
    let mut facts = bmw_facts();
    facts.title_status = Some(TitleStatus::Clean);
    rebuilt_history().apply_to(&mut facts);

    assert_eq!(facts.title_status, Some(TitleStatus::Rebuilt));
    assert!(facts.history_verified);
    let record = facts.accident.expect("reported accident");
    assert_eq!(record.count, 1);
    assert_eq!(record.severity, AccidentSeverity::Moderate);
}
