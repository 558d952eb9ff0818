//! Age and mileage depreciation applied to a new-vehicle base price.

use serde::{Deserialize, Serialize};

use super::domain::{Cents, ValidationError};

pub const EARLIEST_MODEL_YEAR: i32 = 1900;
pub const EXPECTED_MILES_PER_YEAR: u32 = 12_000;

const EARLY_YEARS: i32 = 5;
const EARLY_RATE: f64 = 0.10;
const LATE_RATE: f64 = 0.05;
const AGE_FLOOR: f64 = 0.1;

/// Age at which the age multiplier bottoms out. Expected mileage stops
/// accruing here so the low-mileage credit cannot outgrow depreciation.
pub const DEPRECIATION_HORIZON_YEARS: i32 = 13;

const EXCESS_RATE_PER_100K: f64 = 0.20;
const MILEAGE_FLOOR: f64 = 0.25;
const MILEAGE_CEILING: f64 = 1.10;

/// Intermediate values of a depreciation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Depreciation {
    pub age_years: i32,
    pub expected_mileage: u32,
    pub age_multiplier: f64,
    pub mileage_multiplier: f64,
    pub value: Cents,
}

impl Depreciation {
    pub fn combined_multiplier(&self) -> f64 {
        self.age_multiplier * self.mileage_multiplier
    }
}

/// Model years from 1900 through next year's lineup are accepted.
pub fn validate_model_year(year: i64, reference_year: i32) -> Result<i32, ValidationError> {
    let max = reference_year.saturating_add(1);
    if year < EARLIEST_MODEL_YEAR as i64 || year > max as i64 {
        return Err(ValidationError::InvalidYear {
            year,
            min: EARLIEST_MODEL_YEAR,
            max,
        });
    }
    Ok(year as i32)
}

/// 10% per year for the first five years, 5% per year after, floored at 10%.
pub fn age_multiplier(age_years: i32) -> f64 {
    let age = age_years.max(0);
    let raw = if age <= EARLY_YEARS {
        1.0 - EARLY_RATE * age as f64
    } else {
        1.0 - EARLY_RATE * EARLY_YEARS as f64 - LATE_RATE * (age - EARLY_YEARS) as f64
    };
    raw.max(AGE_FLOOR)
}

pub fn expected_mileage(age_years: i32) -> u32 {
    age_years.clamp(0, DEPRECIATION_HORIZON_YEARS) as u32 * EXPECTED_MILES_PER_YEAR
}

/// 20% per 100,000 miles over the expected baseline; under-driven vehicles
/// earn the same rate back, up to the ceiling.
pub fn mileage_multiplier(mileage: u32, age_years: i32) -> f64 {
    let excess = mileage as f64 - expected_mileage(age_years) as f64;
    (1.0 - EXCESS_RATE_PER_100K * excess / 100_000.0).clamp(MILEAGE_FLOOR, MILEAGE_CEILING)
}

pub fn depreciation_breakdown(
    base: Cents,
    year: i32,
    mileage: u32,
    reference_year: i32,
) -> Result<Depreciation, ValidationError> {
    if base.is_negative() {
        return Err(ValidationError::NegativeValue {
            field: "base_value",
            value: base.0.to_string(),
        });
    }
    let year = validate_model_year(year as i64, reference_year)?;

    let age_years = reference_year.saturating_sub(year).max(0);
    let age = age_multiplier(age_years);
    let miles = mileage_multiplier(mileage, age_years);

    Ok(Depreciation {
        age_years,
        expected_mileage: expected_mileage(age_years),
        age_multiplier: age,
        mileage_multiplier: miles,
        value: base.scale(age * miles),
    })
}

/// Depreciated value of `base` for a vehicle of the given model year and odometer.
pub fn depreciate(
    base: Cents,
    year: i32,
    mileage: u32,
    reference_year: i32,
) -> Result<Cents, ValidationError> {
    depreciation_breakdown(base, year, mileage, reference_year).map(|run| run.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Cents = Cents(4_000_000);

    #[test]
    fn age_multiplier_follows_two_rates_and_floor() {
        assert_eq!(age_multiplier(0), 1.0);
        assert!((age_multiplier(3) - 0.7).abs() < 1e-9);
        assert!((age_multiplier(5) - 0.5).abs() < 1e-9);
        assert!((age_multiplier(7) - 0.4).abs() < 1e-9);
        assert_eq!(age_multiplier(DEPRECIATION_HORIZON_YEARS), 0.1);
        assert_eq!(age_multiplier(60), 0.1);
    }

    #[test]
    fn future_model_year_is_not_appreciated_by_age() {
        assert_eq!(age_multiplier(-1), 1.0);
        let run = depreciation_breakdown(BASE, 2026, 0, 2025).expect("next model year accepted");
        assert_eq!(run.age_years, 0);
        assert_eq!(run.age_multiplier, 1.0);
        assert_eq!(run.value, BASE);
    }

    #[test]
    fn expected_mileage_matches_baseline() {
        let run = depreciation_breakdown(BASE, 2020, 60_000, 2025).expect("valid");
        assert_eq!(run.expected_mileage, 60_000);
        assert_eq!(run.mileage_multiplier, 1.0);
        assert_eq!(run.value, Cents(2_000_000));
    }

    #[test]
    fn excess_mileage_costs_twenty_percent_per_hundred_thousand() {
        let run = depreciation_breakdown(BASE, 2020, 160_000, 2025).expect("valid");
        assert!((run.mileage_multiplier - 0.8).abs() < 1e-9);
        assert_eq!(run.value, Cents(1_600_000));
    }

    #[test]
    fn low_mileage_bonus_is_capped() {
        assert_eq!(mileage_multiplier(0, 10), 1.1);
        assert!((mileage_multiplier(25_000, 5) - 1.07).abs() < 1e-9);
    }

    #[test]
    fn zero_mileage_new_vehicle_keeps_base_value() {
        assert_eq!(depreciate(BASE, 2025, 0, 2025), Ok(BASE));
    }

    #[test]
    fn rejects_out_of_range_years() {
        assert!(matches!(
            depreciate(BASE, 1899, 0, 2025),
            Err(ValidationError::InvalidYear { year: 1899, .. })
        ));
        assert!(matches!(
            depreciate(BASE, 2027, 0, 2025),
            Err(ValidationError::InvalidYear { max: 2026, .. })
        ));
        assert!(depreciate(BASE, 1900, 0, 2025).is_ok());
    }

    #[test]
    fn rejects_negative_base_value() {
        assert!(matches!(
            depreciate(Cents(-1), 2020, 0, 2025),
            Err(ValidationError::NegativeValue {
                field: "base_value",
                ..
            })
        ));
    }

    #[test]
    fn extreme_mileage_stays_positive() {
        let value = depreciate(BASE, 1990, u32::MAX, 2025).expect("valid");
        assert!(value > Cents::ZERO);
        assert_eq!(value, BASE.scale(0.1 * 0.25));
    }
}
