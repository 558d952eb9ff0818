use crate::infra::InMemoryValuationRepository;
use clap::Args;
use std::fmt::Write as _;
use std::sync::Arc;
use vehicle_valuation::config::AppConfig;
use vehicle_valuation::error::AppError;
use vehicle_valuation::valuation::providers::Unlimited;
use vehicle_valuation::valuation::{
    AccidentInput, Cents, ConditionInput, EquipmentInput, HistoryReport, HistoryReportProvider,
    ProviderError, ValuationResult, ValuationService, VehicleSubmission,
};

#[derive(Args, Debug, Default)]
pub(crate) struct AppraiseArgs {
    /// Manufacturer, e.g. "Toyota"
    #[arg(long)]
    pub(crate) make: String,
    /// Model name, e.g. "Camry"
    #[arg(long)]
    pub(crate) model: String,
    /// Model year
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) year: i64,
    /// Odometer reading in miles
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) mileage: f64,
    /// Condition label (excellent, good, fair, poor) or a 0-100 score
    #[arg(long)]
    pub(crate) condition: Option<String>,
    /// Five-digit ZIP code for the local market adjustment
    #[arg(long)]
    pub(crate) zip: Option<String>,
    /// 17-character VIN
    #[arg(long)]
    pub(crate) vin: Option<String>,
    /// Base value in whole dollars (defaults to the make's catalog price)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) base_value: Option<i64>,
    /// Number of reported accidents
    #[arg(long)]
    pub(crate) accidents: Option<i64>,
    /// Worst accident severity (minor, moderate, severe)
    #[arg(long)]
    pub(crate) severity: Option<String>,
    /// Installed option; repeat for several
    #[arg(long)]
    pub(crate) equipment: Vec<String>,
    /// Print the stored valuation as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl AppraiseArgs {
    fn into_submission(self) -> VehicleSubmission {
        let condition = self.condition.map(|raw| match raw.trim().parse::<f64>() {
            Ok(score) => ConditionInput::Score(score),
            Err(_) => ConditionInput::Label(raw),
        });
        let accident = if self.accidents.is_some() || self.severity.is_some() {
            Some(AccidentInput {
                count: self.accidents.unwrap_or(1),
                severity: self.severity,
                description: None,
            })
        } else {
            None
        };

        VehicleSubmission {
            make: self.make,
            model: self.model,
            year: Some(self.year),
            mileage: Some(self.mileage),
            condition,
            vin: self.vin,
            zip: self.zip,
            base_value_cents: self
                .base_value
                .map(|dollars| Cents::from_dollars(dollars).0),
            equipment: self.equipment.into_iter().map(EquipmentInput::Name).collect(),
            accident,
            ..VehicleSubmission::default()
        }
    }
}

pub(crate) fn run_appraisal(args: AppraiseArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = ValuationService::new(
        Arc::new(InMemoryValuationRepository::default()),
        Arc::new(Unlimited),
        &config.valuation,
    );

    let json = args.json;
    let result = service.appraise("cli", args.into_submission())?;
    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Valuation payload unavailable: {err}"),
        }
    } else {
        print!("{}", render_valuation(&result));
    }
    Ok(())
}

/// Clean report for the demo VIN, standing in for a paid history lookup.
struct DemoHistory;

const DEMO_VIN: &str = "WBA5R1C50KA123456";

impl HistoryReportProvider for DemoHistory {
    fn lookup(&self, vin: &str) -> Result<Option<HistoryReport>, ProviderError> {
        Ok((vin == DEMO_VIN).then_some(HistoryReport {
            accident_count: 0,
            worst_severity: None,
            title_status: None,
            open_recalls: 0,
        }))
    }
}

fn demo_submission() -> VehicleSubmission {
    VehicleSubmission {
        make: "BMW".to_string(),
        model: "3 Series".to_string(),
        year: Some(2019),
        mileage: Some(25_000.0),
        condition: Some(ConditionInput::Label("excellent".to_string())),
        vin: Some(DEMO_VIN.to_string()),
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

pub(crate) fn run_demo() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let repository = Arc::new(InMemoryValuationRepository::default());
    let service = ValuationService::new(repository, Arc::new(Unlimited), &config.valuation)
        .with_history_provider(Arc::new(DemoHistory));

    println!("Vehicle valuation demo (reference year {})", service.reference_year());

    println!("\nFully described vehicle");
    let full = service.appraise("demo", demo_submission())?;
    print!("{}", render_valuation(&full));

    println!("\nSame vehicle, no VIN, ZIP or photos; title record and open recall on file");
    let sparse = VehicleSubmission {
        vin: None,
        zip: None,
        photo_score: None,
        title_status: Some("clean".to_string()),
        open_recalls: Some(1),
        ..demo_submission()
    };
    let degraded = service.appraise("demo", sparse)?;
    print!("{}", render_valuation(&degraded));

    println!(
        "\nConfidence moved from {} to {} points",
        full.appraisal.confidence_score, degraded.appraisal.confidence_score
    );

    match service.recent(5) {
        Ok(stored) => println!("Stored valuations: {}", stored.len()),
        Err(err) => println!("Stored valuations unavailable: {err}"),
    }

    Ok(())
}

pub(crate) fn render_valuation(result: &ValuationResult) -> String {
    let appraisal = &result.appraisal;
    let vehicle = &appraisal.vehicle;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "- {} {} {} {} ({} miles)",
        result.id, vehicle.year, vehicle.make, vehicle.model, vehicle.mileage
    );
    let _ = writeln!(
        out,
        "  Estimated value: {} (range {} - {})",
        appraisal.estimated_value, appraisal.price_range.low, appraisal.price_range.high
    );
    let _ = writeln!(
        out,
        "  Confidence: {} ({})",
        appraisal.confidence_score,
        appraisal.confidence_level.label()
    );
    let _ = writeln!(out, "  Base value: {}", appraisal.base_value);
    for adjustment in &appraisal.adjustments {
        let _ = writeln!(
            out,
            "    - {}: {:+.1}% ({}) {}",
            adjustment.factor.label(),
            adjustment.percent * 100.0,
            adjustment.amount,
            adjustment.description
        );
    }
    if result.history_report {
        let _ = writeln!(out, "  History report: applied");
    }
    if let Some(summary) = &result.market_summary {
        let _ = writeln!(
            out,
            "  Comparables: {} listings averaging {}",
            summary.sample_size, summary.average
        );
    }
    out
}
