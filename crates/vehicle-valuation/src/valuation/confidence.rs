//! Additive confidence score describing how well-supported an estimate is.

use serde::{Deserialize, Serialize};

/// Presence flags and numeric signals behind a confidence score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceFactors {
    pub has_vin: bool,
    pub has_zip: bool,
    pub has_make: bool,
    pub has_model: bool,
    pub has_condition: bool,
    pub has_history_report: bool,
    pub has_photo_score: bool,
    pub has_title_status: bool,
    pub has_equipment_data: bool,
    pub has_transmission_data: bool,
    pub has_open_recall: bool,
    pub mileage: Option<u32>,
    pub age_years: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSignal {
    Vin,
    Zip,
    Mileage,
    Age,
    Make,
    Model,
    Condition,
    HistoryReport,
    PhotoScore,
    TitleStatus,
    Equipment,
    Transmission,
    OpenRecall,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceComponent {
    pub signal: ConfidenceSignal,
    pub points: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => ConfidenceLevel::VeryHigh,
            75..=89 => ConfidenceLevel::High,
            50..=74 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "Very High",
            ConfidenceLevel::High => "High",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::Low => "Low",
        }
    }
}

const MILES_PER_POINT: f64 = 5_000.0;
const MAX_MILEAGE_POINTS: f64 = 10.0;
const POINTS_PER_YEAR: f64 = 2.0;
const MAX_AGE_POINTS: f64 = 10.0;

/// Every non-zero contribution, in scoring order.
pub fn confidence_components(factors: &ConfidenceFactors) -> Vec<ConfidenceComponent> {
    let mut components = Vec::new();
    let mut award = |present: bool, signal: ConfidenceSignal, points: f64| {
        if present && points != 0.0 {
            components.push(ConfidenceComponent { signal, points });
        }
    };

    award(factors.has_vin, ConfidenceSignal::Vin, 20.0);
    award(factors.has_zip, ConfidenceSignal::Zip, 10.0);

    if let Some(mileage) = factors.mileage {
        let points = (mileage as f64 / MILES_PER_POINT).min(MAX_MILEAGE_POINTS);
        award(true, ConfidenceSignal::Mileage, points);
    }
    if let Some(age) = factors.age_years {
        let points = (age.max(0) as f64 * POINTS_PER_YEAR).min(MAX_AGE_POINTS);
        award(true, ConfidenceSignal::Age, points);
    }

    award(factors.has_make, ConfidenceSignal::Make, 5.0);
    award(factors.has_model, ConfidenceSignal::Model, 5.0);
    award(factors.has_condition, ConfidenceSignal::Condition, 10.0);
    award(factors.has_history_report, ConfidenceSignal::HistoryReport, 15.0);
    award(factors.has_photo_score, ConfidenceSignal::PhotoScore, 10.0);
    // Penalizes the presence of a title-status record, not an adverse status.
    // Intent unclear; a clean title is penalized the same as a salvage title.
    award(factors.has_title_status, ConfidenceSignal::TitleStatus, -10.0);
    award(factors.has_equipment_data, ConfidenceSignal::Equipment, 5.0);
    award(
        factors.has_transmission_data,
        ConfidenceSignal::Transmission,
        5.0,
    );
    award(factors.has_open_recall, ConfidenceSignal::OpenRecall, -5.0);

    components
}

/// Score in `0..=100`. Total for every input.
pub fn confidence_score(factors: &ConfidenceFactors) -> u8 {
    let total: f64 = confidence_components(factors)
        .iter()
        .map(|component| component.points)
        .sum();
    total.min(100.0).max(0.0).round() as u8
}

pub fn classify(score: u8) -> ConfidenceLevel {
    ConfidenceLevel::from_score(score)
}
