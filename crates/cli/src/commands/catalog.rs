//! Catalogue browsing commands

use anyhow::{bail, Result};
use serde::Serialize;
use tabled::Tabled;
use valuation_lib::{CategoryField, ValuationContext};

use crate::output::{color_tier, print_json, print_table, OutputFormat};

/// Row for the brands table
#[derive(Tabled, Serialize)]
struct BrandRow {
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Models")]
    models: usize,
}

#[derive(Serialize)]
struct BrandEntry<'a> {
    brand: &'a str,
    id: u32,
    tier: u32,
    models: Vec<&'a str>,
}

/// Row for the models table
#[derive(Tabled, Serialize)]
struct ModelRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "ID")]
    id: u32,
}

/// List every brand in the mapping table
pub fn list_brands(context: &ValuationContext, format: OutputFormat) -> Result<()> {
    let mapping = context.mapping();
    let brands = mapping.brands();

    match format {
        OutputFormat::Json => {
            let entries: Vec<BrandEntry> = brands
                .iter()
                .map(|&brand| BrandEntry {
                    brand,
                    id: mapping.lookup(CategoryField::Brand, brand).id,
                    tier: mapping.brand_tier(brand),
                    models: mapping.models_for_brand(brand),
                })
                .collect();
            print_json(&entries)
        }
        OutputFormat::Table => {
            let rows: Vec<BrandRow> = brands
                .iter()
                .map(|&brand| BrandRow {
                    brand: brand.to_string(),
                    tier: color_tier(mapping.brand_tier(brand)),
                    models: mapping.models_for_brand(brand).len(),
                })
                .collect();
            print_table(&rows, format)
        }
    }
}

/// List the models of one brand
pub fn list_models(context: &ValuationContext, brand: &str, format: OutputFormat) -> Result<()> {
    let mapping = context.mapping();
    if !mapping.lookup(CategoryField::Brand, brand).known {
        bail!("unknown brand '{}', run `carval brands` for the list", brand);
    }

    let rows: Vec<ModelRow> = mapping
        .models_for_brand(brand)
        .into_iter()
        .map(|model| ModelRow {
            model: model.to_string(),
            id: mapping.lookup_model(brand, model).id,
        })
        .collect();
    print_table(&rows, format)
}
