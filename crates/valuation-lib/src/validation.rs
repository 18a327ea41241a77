//! Listing validation at the system boundary

use crate::config::ValuationConfig;
use crate::error::{FieldError, ValidationError};
use crate::models::CarListing;

/// Largest accepted displacement (10 L)
pub const MAX_DISPLACEMENT_CC: u32 = 10_000;

/// Accepted condition factor range
pub const CONDITION_RANGE: (f64, f64) = (0.1, 1.0);

/// Bounds applied to incoming listings
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub min_year: i32,
    /// Model years run slightly ahead of the calendar
    pub max_year: i32,
    pub max_mileage_km: u32,
    pub max_displacement_cc: u32,
}

impl ValidationRules {
    pub fn from_config(config: &ValuationConfig, reference_year: i32) -> Self {
        Self {
            min_year: config.min_year,
            max_year: reference_year + 1,
            max_mileage_km: config.max_mileage_km,
            max_displacement_cc: MAX_DISPLACEMENT_CC,
        }
    }

    pub fn for_reference_year(reference_year: i32) -> Self {
        Self::from_config(&ValuationConfig::default(), reference_year)
    }
}

/// A listing that passed every boundary check
#[derive(Debug, Clone)]
pub struct ValidatedListing {
    listing: CarListing,
}

impl ValidatedListing {
    pub fn listing(&self) -> &CarListing {
        &self.listing
    }

    /// Condition factor, 1.0 when not given
    pub fn condition(&self) -> f64 {
        self.listing.condition.unwrap_or(1.0)
    }
}

/// Check a listing and collect every offending field
pub fn validate(
    listing: &CarListing,
    rules: &ValidationRules,
) -> Result<ValidatedListing, ValidationError> {
    let mut fields = Vec::new();
    let mut reject = |field: &'static str, message: String| {
        fields.push(FieldError { field, message });
    };

    if listing.brand.trim().is_empty() {
        reject("brand", "must not be empty".to_string());
    }
    if listing.model.trim().is_empty() {
        reject("model", "must not be empty".to_string());
    }
    if listing.year < rules.min_year {
        reject("year", format!("must be at least {}", rules.min_year));
    } else if listing.year > rules.max_year {
        reject("year", format!("must be at most {}", rules.max_year));
    }
    if listing.mileage_km > rules.max_mileage_km {
        reject(
            "mileage_km",
            format!("must be at most {}", rules.max_mileage_km),
        );
    }
    if let Some(cc) = listing.displacement_cc {
        if cc == 0 {
            reject("displacement_cc", "must be positive".to_string());
        } else if cc > rules.max_displacement_cc {
            reject(
                "displacement_cc",
                format!("must be at most {}", rules.max_displacement_cc),
            );
        }
    }
    if let Some(kw) = listing.power.kw {
        if !(kw.is_finite() && kw > 0.0) {
            reject("power.kw", "must be a positive number".to_string());
        }
    }
    if let Some(hp) = listing.power.hp {
        if !(hp.is_finite() && hp > 0.0) {
            reject("power.hp", "must be a positive number".to_string());
        }
    }
    if let Some(condition) = listing.condition {
        let (min, max) = CONDITION_RANGE;
        if !(condition.is_finite() && (min..=max).contains(&condition)) {
            reject("condition", format!("must be between {} and {}", min, max));
        }
    }

    if fields.is_empty() {
        Ok(ValidatedListing {
            listing: listing.clone(),
        })
    } else {
        Err(ValidationError { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FuelType, Transmission};

    fn rules() -> ValidationRules {
        ValidationRules::for_reference_year(2026)
    }

    fn listing() -> CarListing {
        CarListing::new("Ford", "Focus", 2019, 60_000, FuelType::Petrol, Transmission::Manual)
    }

    #[test]
    fn test_valid_listing_passes() {
        let v = validate(&listing().with_displacement(1600), &rules()).unwrap();
        assert_eq!(v.listing().brand, "Ford");
        assert_eq!(v.condition(), 1.0);
    }

    #[test]
    fn test_year_bounds() {
        let old = CarListing { year: 1949, ..listing() };
        assert!(validate(&old, &rules()).unwrap_err().has_field("year"));

        let future = CarListing { year: 2028, ..listing() };
        assert!(validate(&future, &rules()).unwrap_err().has_field("year"));

        let next_model_year = CarListing { year: 2027, ..listing() };
        assert!(validate(&next_model_year, &rules()).is_ok());
    }

    #[test]
    fn test_reports_all_offending_fields() {
        let bad = CarListing {
            brand: "  ".to_string(),
            year: 1900,
            mileage_km: 2_000_000,
            displacement_cc: Some(0),
            condition: Some(1.5),
            ..listing()
        };
        let err = validate(&bad, &rules()).unwrap_err();
        assert_eq!(
            err.field_names(),
            vec!["brand", "year", "mileage_km", "displacement_cc", "condition"]
        );
    }

    #[test]
    fn test_power_must_be_positive() {
        let err = validate(&listing().with_kw(0.0).with_hp(f64::NAN), &rules()).unwrap_err();
        assert_eq!(err.field_names(), vec!["power.kw", "power.hp"]);
    }

    #[test]
    fn test_displacement_upper_bound() {
        let err = validate(&listing().with_displacement(12_000), &rules()).unwrap_err();
        assert!(err.has_field("displacement_cc"));
    }

    #[test]
    fn test_condition_in_range_accepted() {
        let v = validate(&listing().with_condition(0.85), &rules()).unwrap();
        assert_eq!(v.condition(), 0.85);
    }
}
