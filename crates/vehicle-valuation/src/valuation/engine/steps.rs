use super::super::accident::{record_impact, AccidentImpact};
use super::super::catalog;
use super::super::condition::condition_adjustment;
use super::super::depreciation::depreciation_breakdown;
use super::super::domain::{
    relative_change, AdjustmentFactor, Cents, ValidationError, ValuationAdjustment, VehicleFacts,
};
use super::super::market::{market_adjustment, MarketAdjustment, RegionClassifier};
use super::config::EngineConfig;

/// Running totals produced by the pricing steps.
pub(crate) struct PipelineOutput {
    pub base_value: Cents,
    pub estimated_value: Cents,
    pub adjustments: Vec<ValuationAdjustment>,
    pub accident: AccidentImpact,
    pub market: MarketAdjustment,
}

pub(crate) fn run_pipeline(
    facts: &VehicleFacts,
    base_value: Cents,
    reference_year: i32,
    config: &EngineConfig,
    classifier: Option<&dyn RegionClassifier>,
) -> Result<PipelineOutput, ValidationError> {
    let mut adjustments = Vec::new();

    let depreciation =
        depreciation_breakdown(base_value, facts.year, facts.mileage, reference_year)?;
    let depreciated = depreciation.value;
    adjustments.push(ValuationAdjustment {
        factor: AdjustmentFactor::Depreciation,
        percent: relative_change(base_value, depreciated),
        amount: depreciated - base_value,
        description: format!(
            "{} year(s), {} miles against {} expected (age x{:.2}, mileage x{:.2})",
            depreciation.age_years,
            facts.mileage,
            depreciation.expected_mileage,
            depreciation.age_multiplier,
            depreciation.mileage_multiplier
        ),
    });

    let condition = condition_adjustment(facts.condition)?;
    let after_condition = depreciated.scale(1.0 + condition.percent);
    adjustments.push(ValuationAdjustment {
        factor: AdjustmentFactor::Condition,
        percent: condition.percent,
        amount: after_condition - depreciated,
        description: condition.description,
    });

    let accident = record_impact(after_condition, facts.accident.as_ref());
    let after_accident = after_condition.scale(1.0 + accident.percent_impact);
    adjustments.push(ValuationAdjustment {
        factor: AdjustmentFactor::Accident,
        percent: accident.percent_impact,
        amount: after_accident - after_condition,
        description: accident.description.clone(),
    });

    let market = market_adjustment(facts.zip.as_deref(), classifier);
    let after_market = after_accident.scale(1.0 + market.fraction());
    adjustments.push(ValuationAdjustment {
        factor: AdjustmentFactor::Market,
        percent: market.fraction(),
        amount: after_market - after_accident,
        description: market.description(),
    });

    let mut estimated_value = after_market;
    if !facts.equipment.is_empty() {
        let listed = facts
            .equipment
            .iter()
            .map(|item| {
                item.value
                    .or_else(|| catalog::equipment_value(&item.name))
                    .unwrap_or(Cents::ZERO)
            })
            .fold(Cents::ZERO, |total, value| total + value);
        let cap = after_market.scale(config.equipment_cap.max(0.0));
        let value_add = listed.min(cap);
        estimated_value = after_market + value_add;

        let names: Vec<&str> = facts
            .equipment
            .iter()
            .map(|item| item.name.as_str())
            .collect();
        adjustments.push(ValuationAdjustment {
            factor: AdjustmentFactor::Equipment,
            percent: relative_change(after_market, estimated_value),
            amount: value_add,
            description: if value_add < listed {
                format!("{} (capped at {})", names.join(", "), cap)
            } else {
                names.join(", ")
            },
        });
    }

    Ok(PipelineOutput {
        base_value,
        estimated_value,
        adjustments,
        accident,
        market,
    })
}
