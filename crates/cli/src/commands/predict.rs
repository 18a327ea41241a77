//! Price band prediction command

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use tabled::Tabled;
use tracing::debug;
use valuation_lib::{
    CarListing, FuelType, PowerFigures, PredictionPipeline, PredictionResult, Transmission, ValuationContext,
};

use crate::output::{format_eur, print_error, print_json, print_table, print_warning, OutputFormat};

/// Listing to value
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Brand, e.g. "Volkswagen"
    #[arg(long)]
    pub brand: String,

    /// Model, with or without the brand prefix
    #[arg(long)]
    pub model: String,

    /// Year of manufacture
    #[arg(long)]
    pub year: i32,

    /// Odometer reading in km
    #[arg(long)]
    pub mileage: u32,

    /// petrol, diesel, hybrid, electric, cng, lpg or other
    #[arg(long)]
    pub fuel: FuelType,

    /// manual or automatic
    #[arg(long)]
    pub transmission: Transmission,

    /// Engine displacement in cc
    #[arg(long)]
    pub displacement: Option<u32>,

    /// Power in kW
    #[arg(long)]
    pub kw: Option<f64>,

    /// Power in HP
    #[arg(long)]
    pub hp: Option<f64>,

    /// Condition factor between 0.1 and 1.0
    #[arg(long)]
    pub condition: Option<f64>,

    /// Band half-width in EUR (overrides configuration)
    #[arg(long)]
    pub band_width: Option<u32>,
}

impl PredictArgs {
    fn to_listing(&self) -> CarListing {
        CarListing {
            brand: self.brand.clone(),
            model: self.model.clone(),
            year: self.year,
            mileage_km: self.mileage,
            fuel: self.fuel,
            transmission: self.transmission,
            displacement_cc: self.displacement,
            power: PowerFigures {
                kw: self.kw,
                hp: self.hp,
            },
            condition: self.condition,
        }
    }
}

/// Row for the detail table
#[derive(Tabled, serde::Serialize)]
struct DetailRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(field: &str, value: impl ToString) -> DetailRow {
    DetailRow {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Run a single prediction and print the band
pub fn run(context: Arc<ValuationContext>, args: &PredictArgs, format: OutputFormat) -> Result<()> {
    let mut pipeline = PredictionPipeline::new(context)?;
    if let Some(width) = args.band_width {
        debug!(band_width_eur = width, "Overriding configured band width");
        pipeline = pipeline.with_band_width(width)?;
    }

    let result = match pipeline.predict(&args.to_listing()) {
        Ok(result) => result,
        Err(err) => {
            if let Some(validation) = err.validation() {
                for field in &validation.fields {
                    print_error(&format!("{}: {}", field.field, field.message));
                }
            }
            return Err(err.into());
        }
    };

    for warning in &result.details.warnings {
        print_warning(&format!(
            "unknown {} '{}', estimate uses the generic bucket",
            warning.field, warning.value
        ));
    }

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Table => print_band(&result),
    }
}

fn print_band(result: &PredictionResult) -> Result<()> {
    println!(
        "{} {}  ({} - {})",
        "Estimated price:".bold(),
        format_eur(result.point_eur).green().bold(),
        format_eur(result.lower_eur),
        format_eur(result.upper_eur)
    );
    println!();

    let details = &result.details;
    let rows = vec![
        row("Age (years)", details.age_years),
        row("Power", format!("{:.0} kW / {:.0} HP", details.power.kw, details.power.hp)),
        row("Power source", format!("{:?}", details.power.source)),
        row("Technical estimate", format!("{:.0}", details.base_estimate_eur)),
        row("Brand-adjusted estimate", format!("{:.0}", details.adjusted_estimate_eur)),
        row("Technical model", &details.technical_model_version),
        row("Brand model", &details.brand_model_version),
    ];
    print_table(&rows, OutputFormat::Table)
}
