//! Accident history impact on value.
//!
//! Each accident removes a severity-weighted share of the remaining value, so
//! repeated accidents compound with diminishing effect and the total impact
//! never reaches the full value.

use serde::{Deserialize, Serialize};

use super::domain::{AccidentRecord, AccidentSeverity, Cents};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentImpact {
    /// Zero or negative fraction of the base value.
    pub percent_impact: f64,
    /// Zero or negative amount; `base * percent_impact`, rounded.
    pub dollar_impact: Cents,
    pub description: String,
}

impl AccidentImpact {
    pub fn clean(description: impl Into<String>) -> Self {
        Self {
            percent_impact: 0.0,
            dollar_impact: Cents::ZERO,
            description: description.into(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.percent_impact == 0.0
    }
}

pub fn severity_weight(severity: AccidentSeverity) -> f64 {
    match severity {
        AccidentSeverity::Minor => 0.05,
        AccidentSeverity::Moderate => 0.12,
        AccidentSeverity::Severe => 0.25,
    }
}

pub fn accident_impact(base: Cents, count: u32, severity: AccidentSeverity) -> AccidentImpact {
    if count == 0 {
        return AccidentImpact::clean("Clean accident history");
    }

    let weight = severity_weight(severity);
    let exponent = count.min(i32::MAX as u32) as i32;
    let percent_impact = -(1.0 - (1.0 - weight).powi(exponent));

    AccidentImpact {
        percent_impact,
        dollar_impact: base.scale(percent_impact),
        description: format!(
            "{count} {} accident{} reported ({:.1}%)",
            severity.label(),
            if count == 1 { "" } else { "s" },
            percent_impact * 100.0
        ),
    }
}

/// Impact of an optional accident record; no record is a clean history.
pub fn record_impact(base: Cents, record: Option<&AccidentRecord>) -> AccidentImpact {
    match record {
        Some(record) => accident_impact(base, record.count, record.severity),
        None => AccidentImpact::clean("No accidents reported"),
    }
}
