//! Immutable valuation context
//!
//! Everything a prediction reads besides the listing itself: configuration,
//! the mapping table and both models. Built once at startup and shared
//! behind an `Arc`; nothing in it is mutated afterwards.

use crate::artifacts::{ArtifactLoader, LoadedArtifacts};
use crate::config::ValuationConfig;
use crate::error::{Result, ValuationError};
use crate::mapping::MappingTable;
use crate::predictor::{BrandInfluenceModel, TechnicalSpecModel, FEATURE_LAYOUT};

pub struct ValuationContext {
    config: ValuationConfig,
    mapping: MappingTable,
    technical: TechnicalSpecModel,
    brand: BrandInfluenceModel,
}

impl ValuationContext {
    /// Load artifacts from `config.artifact_dir` and build the context
    pub fn load(config: ValuationConfig) -> Result<Self> {
        config.validate()?;
        let LoadedArtifacts {
            mapping,
            technical,
            brand,
        } = ArtifactLoader::new(&config.artifact_dir)
            .verify_manifest(config.verify_manifest)
            .load()?;
        Self::new(config, mapping, technical, brand)
    }

    pub fn new(
        config: ValuationConfig,
        mapping: MappingTable,
        technical: TechnicalSpecModel,
        brand: BrandInfluenceModel,
    ) -> Result<Self> {
        config.validate()?;
        if mapping.layout() != FEATURE_LAYOUT {
            return Err(ValuationError::artifact(
                "mappings.json",
                format!("layout '{}' does not match '{}'", mapping.layout(), FEATURE_LAYOUT),
            ));
        }
        if mapping.max_tier() as usize >= brand.tier_count() {
            return Err(ValuationError::artifact(
                "brand_model.json",
                format!(
                    "mapping uses tier {} but only {} tier offsets are defined",
                    mapping.max_tier(),
                    brand.tier_count()
                ),
            ));
        }

        Ok(Self {
            config,
            mapping,
            technical,
            brand,
        })
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    pub fn technical(&self) -> &TechnicalSpecModel {
        &self.technical
    }

    pub fn brand(&self) -> &BrandInfluenceModel {
        &self.brand
    }
}
