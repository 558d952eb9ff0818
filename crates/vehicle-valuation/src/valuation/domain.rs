use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::accident::AccidentImpact;
use super::confidence::{ConfidenceFactors, ConfidenceLevel};
use super::market::MarketAdjustment;
use super::providers::MarketSummary;

/// Monetary amount in whole US cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn from_dollars(dollars: i64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Multiplies by `factor` and rounds to the nearest cent.
    pub fn scale(self, factor: f64) -> Self {
        Self::from_f64(self.0 as f64 * factor)
    }

    /// Non-finite inputs resolve to zero.
    pub(crate) fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        let rounded = value.round();
        if rounded == 0.0 {
            return Self::ZERO;
        }
        Self(rounded.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Self) -> Self::Output {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Self) -> Self::Output {
        Cents(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// Relative change from `before` to `after` as a fraction; a zero baseline yields 0.
pub(crate) fn relative_change(before: Cents, after: Cents) -> f64 {
    if before.0 == 0 {
        0.0
    } else {
        (after.0 - before.0) as f64 / before.0 as f64
    }
}

/// Identifier wrapper for persisted valuations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValuationId(pub String);

impl fmt::Display for ValuationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reported vehicle condition, either a named tier or a 0-100 slider reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
    Score(u8),
}

/// Named condition tier a reported condition resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ConditionTier {
    pub fn label(self) -> &'static str {
        match self {
            ConditionTier::Excellent => "Excellent",
            ConditionTier::Good => "Good",
            ConditionTier::Fair => "Fair",
            ConditionTier::Poor => "Poor",
        }
    }
}

impl Condition {
    /// Collapses slider readings onto the named tiers.
    pub fn tier(self) -> Result<ConditionTier, ValidationError> {
        match self {
            Condition::Excellent => Ok(ConditionTier::Excellent),
            Condition::Good => Ok(ConditionTier::Good),
            Condition::Fair => Ok(ConditionTier::Fair),
            Condition::Poor => Ok(ConditionTier::Poor),
            Condition::Score(score) if score > 100 => {
                Err(ValidationError::InvalidCondition(score.to_string()))
            }
            Condition::Score(score) if score >= 90 => Ok(ConditionTier::Excellent),
            Condition::Score(score) if score >= 70 => Ok(ConditionTier::Good),
            Condition::Score(score) if score >= 40 => Ok(ConditionTier::Fair),
            Condition::Score(_) => Ok(ConditionTier::Poor),
        }
    }
}

impl FromStr for Condition {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "excellent" => Ok(Condition::Excellent),
            "good" => Ok(Condition::Good),
            "fair" => Ok(Condition::Fair),
            "poor" => Ok(Condition::Poor),
            other => other
                .parse::<u8>()
                .ok()
                .filter(|score| *score <= 100)
                .map(Condition::Score)
                .ok_or_else(|| ValidationError::InvalidCondition(trimmed.to_string())),
        }
    }
}

/// Accident severity ordered from least to most damaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccidentSeverity {
    Minor,
    Moderate,
    Severe,
}

impl AccidentSeverity {
    pub fn label(self) -> &'static str {
        match self {
            AccidentSeverity::Minor => "minor",
            AccidentSeverity::Moderate => "moderate",
            AccidentSeverity::Severe => "severe",
        }
    }
}

impl FromStr for AccidentSeverity {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(AccidentSeverity::Minor),
            "moderate" => Ok(AccidentSeverity::Moderate),
            "severe" => Ok(AccidentSeverity::Severe),
            _ => Err(ValidationError::UnknownSeverity(raw.trim().to_string())),
        }
    }
}

/// Accident history attached to a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentRecord {
    pub count: u32,
    pub severity: AccidentSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Title brand reported for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    Clean,
    Salvage,
    Rebuilt,
    Flood,
    Lemon,
}

impl TitleStatus {
    pub fn label(self) -> &'static str {
        match self {
            TitleStatus::Clean => "clean",
            TitleStatus::Salvage => "salvage",
            TitleStatus::Rebuilt => "rebuilt",
            TitleStatus::Flood => "flood",
            TitleStatus::Lemon => "lemon",
        }
    }
}

impl FromStr for TitleStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "clean" => Ok(TitleStatus::Clean),
            "salvage" => Ok(TitleStatus::Salvage),
            "rebuilt" | "reconstructed" => Ok(TitleStatus::Rebuilt),
            "flood" => Ok(TitleStatus::Flood),
            "lemon" | "buyback" => Ok(TitleStatus::Lemon),
            _ => Err(ValidationError::InvalidTitleStatus(raw.trim().to_string())),
        }
    }
}

/// Optional equipment line. An explicit value wins over the catalog estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Cents>,
}

/// Canonical, validated description of a vehicle fed into the pricing formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFacts {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u32,
    pub condition: Condition,
    pub vin: Option<String>,
    pub zip: Option<String>,
    pub equipment: Vec<EquipmentItem>,
    pub accident: Option<AccidentRecord>,
    pub transmission: Option<String>,
    pub title_status: Option<TitleStatus>,
    pub open_recalls: u32,
    pub history_verified: bool,
    pub photo_score: Option<u8>,
}

impl VehicleFacts {
    /// Minimal facts for a manually entered vehicle.
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: i32, mileage: u32) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            year,
            mileage,
            condition: Condition::Good,
            vin: None,
            zip: None,
            equipment: Vec::new(),
            accident: None,
            transmission: None,
            title_status: None,
            open_recalls: 0,
            history_verified: false,
            photo_score: None,
        }
    }

    /// Age in whole years; future model years count as zero.
    pub fn age_in(&self, reference_year: i32) -> i32 {
        reference_year.saturating_sub(self.year).max(0)
    }

    pub fn confidence_factors(&self, reference_year: i32) -> ConfidenceFactors {
        ConfidenceFactors {
            has_vin: self.vin.is_some(),
            has_zip: self.zip.is_some(),
            has_make: !self.make.trim().is_empty(),
            has_model: !self.model.trim().is_empty(),
            has_condition: true,
            has_history_report: self.history_verified,
            has_photo_score: self.photo_score.is_some(),
            has_title_status: self.title_status.is_some(),
            has_equipment_data: !self.equipment.is_empty(),
            has_transmission_data: self.transmission.is_some(),
            has_open_recall: self.open_recalls > 0,
            mileage: Some(self.mileage),
            age_years: Some(self.age_in(reference_year)),
        }
    }

    pub fn summary(&self) -> VehicleSummary {
        VehicleSummary {
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year,
            mileage: self.mileage,
            vin: self.vin.clone(),
            zip: self.zip.clone(),
        }
    }
}

/// Identifying subset of the facts echoed back with every valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub mileage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// Pipeline step that produced an adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentFactor {
    Depreciation,
    Condition,
    Accident,
    Market,
    Equipment,
}

impl AdjustmentFactor {
    pub fn label(self) -> &'static str {
        match self {
            AdjustmentFactor::Depreciation => "Depreciation",
            AdjustmentFactor::Condition => "Condition",
            AdjustmentFactor::Accident => "Accident history",
            AdjustmentFactor::Market => "Local market",
            AdjustmentFactor::Equipment => "Equipment",
        }
    }
}

/// Named, auditable contribution to the estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationAdjustment {
    pub factor: AdjustmentFactor,
    /// Fraction of the running value before this step (`-0.05` is minus five percent).
    pub percent: f64,
    pub amount: Cents,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: Cents,
    pub high: Cents,
}

impl PriceRange {
    /// Symmetric band of `spread` around the estimate.
    pub fn around(estimate: Cents, spread: f64) -> Self {
        let spread = spread.clamp(0.0, 0.5);
        Self {
            low: estimate.scale(1.0 - spread),
            high: estimate.scale(1.0 + spread),
        }
    }

    pub fn contains(&self, value: Cents) -> bool {
        self.low <= value && value <= self.high
    }
}

/// Deterministic output of the pricing pipeline before it is given an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    pub vehicle: VehicleSummary,
    pub reference_year: i32,
    pub base_value: Cents,
    pub estimated_value: Cents,
    pub price_range: PriceRange,
    pub confidence_score: u8,
    pub confidence_level: ConfidenceLevel,
    pub adjustments: Vec<ValuationAdjustment>,
    pub accident: AccidentImpact,
    pub market: MarketAdjustment,
}

impl Appraisal {
    pub fn adjustment(&self, factor: AdjustmentFactor) -> Option<&ValuationAdjustment> {
        self.adjustments
            .iter()
            .find(|adjustment| adjustment.factor == factor)
    }
}

/// Persisted valuation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub id: ValuationId,
    #[serde(flatten)]
    pub appraisal: Appraisal,
    pub history_report: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_summary: Option<MarketSummary>,
}

/// Malformed or out-of-range vehicle input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("model year {year} outside supported range {min}..={max}")]
    InvalidYear { year: i64, min: i32, max: i32 },
    #[error("{field} must not be negative (got {value})")]
    NegativeValue { field: &'static str, value: String },
    #[error("{field} must be a finite number")]
    NonFiniteValue { field: &'static str },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("VIN must be 17 characters without I, O or Q (got '{0}')")]
    InvalidVin(String),
    #[error("ZIP code must be five digits (got '{0}')")]
    InvalidZip(String),
    #[error("condition '{0}' is not recognized")]
    InvalidCondition(String),
    #[error("accident severity '{0}' is not one of minor, moderate, severe")]
    UnknownSeverity(String),
    #[error("title status '{0}' is not recognized")]
    InvalidTitleStatus(String),
    #[error("photo condition score {0} must be within 0..=100")]
    InvalidPhotoScore(i64),
    #[error("mileage {0} exceeds the supported maximum")]
    InvalidMileage(f64),
}
