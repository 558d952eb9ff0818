//! Boundary between wire payloads and the canonical [`VehicleFacts`].
//!
//! Submissions arrive from forms and decode services that disagree on field
//! casing and numeric types. Everything is normalized here, once, so the
//! formulas only ever see validated facts.

use serde::{Deserialize, Serialize};

use super::depreciation::validate_model_year;
use super::domain::{
    AccidentRecord, AccidentSeverity, Cents, Condition, EquipmentItem, TitleStatus,
    ValidationError, VehicleFacts,
};
use super::market::normalize_zip;

/// Raw vehicle payload as submitted by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleSubmission {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub condition: Option<ConditionInput>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default, alias = "zipCode", alias = "zip_code")]
    pub zip: Option<String>,
    #[serde(default, alias = "baseValueCents")]
    pub base_value_cents: Option<i64>,
    #[serde(default)]
    pub equipment: Vec<EquipmentInput>,
    #[serde(default)]
    pub accident: Option<AccidentInput>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default, alias = "titleStatus")]
    pub title_status: Option<String>,
    #[serde(default, alias = "openRecalls")]
    pub open_recalls: Option<u32>,
    #[serde(default, alias = "photoScore")]
    pub photo_score: Option<i64>,
}

/// Condition as a tier label or a slider reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionInput {
    Score(f64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EquipmentInput {
    Name(String),
    Priced {
        name: String,
        #[serde(default, alias = "valueCents")]
        value_cents: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentInput {
    #[serde(default, alias = "accidentCount")]
    pub count: i64,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Validated facts plus the caller-supplied base value, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeOutcome {
    pub facts: VehicleFacts,
    pub base_value: Option<Cents>,
}

/// Normalizes submissions for a fixed reference year.
#[derive(Debug, Clone, Copy)]
pub struct VehicleIntake {
    reference_year: i32,
}

impl VehicleIntake {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn facts_from_submission(
        &self,
        submission: VehicleSubmission,
    ) -> Result<IntakeOutcome, ValidationError> {
        let make = required_text(&submission.make, "make")?;
        let model = required_text(&submission.model, "model")?;
        let year = submission.year.ok_or(ValidationError::MissingField("year"))?;
        let year = validate_model_year(year, self.reference_year)?;
        let mileage = normalize_mileage(submission.mileage)?;

        let condition = match submission.condition {
            Some(input) => normalize_condition(input)?,
            None => Condition::Good,
        };

        let vin = optional_text(submission.vin.as_deref())
            .map(normalize_vin)
            .transpose()?;
        let zip = optional_text(submission.zip.as_deref())
            .map(|raw| {
                normalize_zip(&raw)
                    .map(str::to_string)
                    .ok_or(ValidationError::InvalidZip(raw))
            })
            .transpose()?;

        let base_value = submission
            .base_value_cents
            .map(|cents| non_negative(cents, "base_value_cents").map(Cents))
            .transpose()?;

        let equipment = submission
            .equipment
            .into_iter()
            .filter_map(|input| normalize_equipment(input).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        let accident = submission
            .accident
            .map(normalize_accident)
            .transpose()?
            .flatten();

        let title_status = optional_text(submission.title_status.as_deref())
            .map(|raw| raw.parse::<TitleStatus>())
            .transpose()?;

        let photo_score = submission
            .photo_score
            .map(|score| {
                u8::try_from(score)
                    .ok()
                    .filter(|score| *score <= 100)
                    .ok_or(ValidationError::InvalidPhotoScore(score))
            })
            .transpose()?;

        Ok(IntakeOutcome {
            facts: VehicleFacts {
                make,
                model,
                year,
                mileage,
                condition,
                vin,
                zip,
                equipment,
                accident,
                transmission: optional_text(submission.transmission.as_deref()),
                title_status,
                open_recalls: submission.open_recalls.unwrap_or(0),
                history_verified: false,
                photo_score,
            },
            base_value,
        })
    }
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required_text(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    optional_text(Some(raw)).ok_or(ValidationError::MissingField(field))
}

fn non_negative(value: i64, field: &'static str) -> Result<i64, ValidationError> {
    if value < 0 {
        Err(ValidationError::NegativeValue {
            field,
            value: value.to_string(),
        })
    } else {
        Ok(value)
    }
}

fn normalize_mileage(raw: Option<f64>) -> Result<u32, ValidationError> {
    let mileage = raw.ok_or(ValidationError::MissingField("mileage"))?;
    if !mileage.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "mileage" });
    }
    if mileage < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: "mileage",
            value: mileage.to_string(),
        });
    }
    let rounded = mileage.round();
    if rounded > u32::MAX as f64 {
        return Err(ValidationError::InvalidMileage(mileage));
    }
    Ok(rounded as u32)
}

fn normalize_condition(input: ConditionInput) -> Result<Condition, ValidationError> {
    match input {
        ConditionInput::Label(label) => label.parse(),
        ConditionInput::Score(score) => {
            if score.is_finite() && (0.0..=100.0).contains(&score) {
                Ok(Condition::Score(score.round() as u8))
            } else {
                Err(ValidationError::InvalidCondition(score.to_string()))
            }
        }
    }
}

/// Uppercased 17-character VIN; I, O and Q never appear in a valid VIN.
pub fn normalize_vin(raw: String) -> Result<String, ValidationError> {
    let vin = raw.trim().to_ascii_uppercase();
    let valid = vin.len() == 17
        && vin
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() && !matches!(byte, b'I' | b'O' | b'Q'));
    if valid {
        Ok(vin)
    } else {
        Err(ValidationError::InvalidVin(raw))
    }
}

fn normalize_equipment(input: EquipmentInput) -> Result<Option<EquipmentItem>, ValidationError> {
    let (name, value_cents) = match input {
        EquipmentInput::Name(name) => (name, None),
        EquipmentInput::Priced { name, value_cents } => (name, value_cents),
    };
    let Some(name) = optional_text(Some(&name)) else {
        return Ok(None);
    };
    let value = value_cents
        .map(|cents| non_negative(cents, "equipment.value_cents").map(Cents))
        .transpose()?;
    Ok(Some(EquipmentItem { name, value }))
}

fn normalize_accident(input: AccidentInput) -> Result<Option<AccidentRecord>, ValidationError> {
    let count = non_negative(input.count, "accident.count")?;
    let severity = optional_text(input.severity.as_deref())
        .map(|raw| raw.parse::<AccidentSeverity>())
        .transpose()?;
    if count == 0 {
        return Ok(None);
    }
    let severity = severity.ok_or(ValidationError::MissingField("accident.severity"))?;

    Ok(Some(AccidentRecord {
        count: u32::try_from(count).unwrap_or(u32::MAX),
        severity,
        description: optional_text(input.description.as_deref()),
    }))
}
