//! Outbound data collaborators: vehicle history reports, comparable market
//! listings and request rate limiting. Implementations live outside the
//! pricing core; the null adapters here keep the service usable without them.

use serde::{Deserialize, Serialize};

use super::domain::{AccidentRecord, AccidentSeverity, Cents, TitleStatus, VehicleFacts};

/// History report (accidents, title brand, recalls) for a VIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub accident_count: u32,
    pub worst_severity: Option<AccidentSeverity>,
    pub title_status: Option<TitleStatus>,
    pub open_recalls: u32,
}

impl HistoryReport {
    /// Layers the report over submitted facts. Reported counts only ever
    /// raise what the owner declared.
    pub fn apply_to(&self, facts: &mut VehicleFacts) {
        facts.history_verified = true;

        if self.accident_count > 0 {
            let declared = facts.accident.take();
            let count = declared
                .as_ref()
                .map_or(self.accident_count, |record| record.count.max(self.accident_count));
            let severity = declared
                .as_ref()
                .map(|record| record.severity)
                .into_iter()
                .chain(self.worst_severity)
                .max()
                .unwrap_or(AccidentSeverity::Moderate);
            facts.accident = Some(AccidentRecord {
                count,
                severity,
                description: declared.and_then(|record| record.description),
            });
        }

        if self.title_status.is_some() {
            facts.title_status = self.title_status;
        }
        facts.open_recalls = facts.open_recalls.max(self.open_recalls);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider returned malformed data: {0}")]
    Malformed(String),
}

pub trait HistoryReportProvider: Send + Sync {
    fn lookup(&self, vin: &str) -> Result<Option<HistoryReport>, ProviderError>;
}

/// Vehicle identity used to search for comparable listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparableQuery {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub zip: Option<String>,
}

impl From<&VehicleFacts> for ComparableQuery {
    fn from(facts: &VehicleFacts) -> Self {
        Self {
            make: facts.make.clone(),
            model: facts.model.clone(),
            year: facts.year,
            zip: facts.zip.clone(),
        }
    }
}

pub trait MarketDataProvider: Send + Sync {
    fn comparables(&self, query: &ComparableQuery) -> Result<Vec<Cents>, ProviderError>;
}

/// Aggregate of comparable listing prices attached to a valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub average: Cents,
    pub low: Cents,
    pub high: Cents,
    pub sample_size: usize,
}

/// Summary over listing prices; an empty sample is all zeros.
pub fn summarize_comparables(prices: &[Cents]) -> MarketSummary {
    if prices.is_empty() {
        return MarketSummary {
            average: Cents::ZERO,
            low: Cents::ZERO,
            high: Cents::ZERO,
            sample_size: 0,
        };
    }

    let total: i128 = prices.iter().map(|price| price.0 as i128).sum();
    let average = Cents::from_f64(total as f64 / prices.len() as f64);

    MarketSummary {
        average,
        low: prices.iter().copied().min().unwrap_or(Cents::ZERO),
        high: prices.iter().copied().max().unwrap_or(Cents::ZERO),
        sample_size: prices.len(),
    }
}

/// Shared request budget, typically backed by a counter store with TTLs.
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str) -> Result<(), RateLimitError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded; retry in {retry_after_secs}s")]
    Exceeded { retry_after_secs: u64 },
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

/// Used when no history vendor is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistoryReports;

impl HistoryReportProvider for NoHistoryReports {
    fn lookup(&self, _vin: &str) -> Result<Option<HistoryReport>, ProviderError> {
        Ok(None)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoMarketData;

impl MarketDataProvider for NoMarketData {
    fn comparables(&self, _query: &ComparableQuery) -> Result<Vec<Cents>, ProviderError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn check(&self, _key: &str) -> Result<(), RateLimitError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_comparables_summarize_to_zero() {
        let summary = summarize_comparables(&[]);
        assert_eq!(summary.average, Cents::ZERO);
        assert_eq!(summary.sample_size, 0);
    }

    #[test]
    fn comparables_average_rounds_to_cents() {
        let summary = summarize_comparables(&[Cents(100), Cents(101), Cents(200)]);
        assert_eq!(summary.average, Cents(134));
        assert_eq!(summary.low, Cents(100));
        assert_eq!(summary.high, Cents(200));
        assert_eq!(summary.sample_size, 3);
    }

    #[test]
    fn history_report_raises_declared_accidents() {
        let mut facts = VehicleFacts::new("Honda", "Civic", 2018, 70_000);
        facts.accident = Some(AccidentRecord {
            count: 1,
            severity: AccidentSeverity::Minor,
            description: Some("Parking lot scrape".to_string()),
        });

        HistoryReport {
            accident_count: 2,
            worst_severity: Some(AccidentSeverity::Severe),
            title_status: Some(TitleStatus::Rebuilt),
            open_recalls: 1,
        }
        .apply_to(&mut facts);

        let record = facts.accident.expect("accident retained");
        assert_eq!(record.count, 2);
        assert_eq!(record.severity, AccidentSeverity::Severe);
        assert_eq!(record.description.as_deref(), Some("Parking lot scrape"));
        assert_eq!(facts.title_status, Some(TitleStatus::Rebuilt));
        assert_eq!(facts.open_recalls, 1);
        assert!(facts.history_verified);
    }

    #[test]
    fn clean_history_report_keeps_declared_facts() {
        let mut facts = VehicleFacts::new("Honda", "Civic", 2018, 70_000);
        facts.open_recalls = 2;

        HistoryReport {
            accident_count: 0,
            worst_severity: None,
            title_status: None,
            open_recalls: 0,
        }
        .apply_to(&mut facts);

        assert!(facts.accident.is_none());
        assert_eq!(facts.open_recalls, 2);
        assert!(facts.history_verified);
    }
}
