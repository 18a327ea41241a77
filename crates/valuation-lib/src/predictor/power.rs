//! Power estimation from engine displacement
//!
//! Listings often omit power figures. When neither kW nor HP is given the
//! estimator derives kW from displacement with a fuel-tiered piecewise
//! linear table, and falls back to a per-fuel default when displacement is
//! missing too. Supplied figures are never overridden.

use crate::models::{FuelType, PowerFigures};
use serde::{Deserialize, Serialize};

/// Metric horsepower per kilowatt
pub const KW_TO_HP: f64 = 1.36;

/// Lower clamp for estimated power
pub const MIN_ESTIMATED_KW: f64 = 20.0;

/// Upper clamp for estimated power
pub const MAX_ESTIMATED_KW: f64 = 500.0;

/// One row of the coefficient table: `kW = slope * litres + intercept`
/// for displacements up to `max_litres`
#[derive(Debug, Clone, Copy)]
pub struct PowerTier {
    pub max_litres: f64,
    pub slope: f64,
    pub intercept: f64,
}

/// Diesel rows pass through 1.5 L -> 75 kW, 2.0 L -> 110 kW, 3.0 L -> 140 kW
pub const DIESEL_TIERS: &[PowerTier] = &[
    PowerTier { max_litres: 1.5, slope: 50.0, intercept: 0.0 },
    PowerTier { max_litres: 2.0, slope: 70.0, intercept: -30.0 },
    PowerTier { max_litres: f64::INFINITY, slope: 30.0, intercept: 50.0 },
];

/// Petrol rows pass through 1.2 L -> 60 kW, 1.6 L -> 92 kW, 2.0 L -> 132 kW, 3.0 L -> 184 kW
pub const PETROL_TIERS: &[PowerTier] = &[
    PowerTier { max_litres: 1.2, slope: 50.0, intercept: 0.0 },
    PowerTier { max_litres: 1.6, slope: 80.0, intercept: -36.0 },
    PowerTier { max_litres: 2.0, slope: 100.0, intercept: -68.0 },
    PowerTier { max_litres: f64::INFINITY, slope: 52.0, intercept: 28.0 },
];

/// Where the resolved figures came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSource {
    /// Both kW and HP supplied
    Supplied,
    /// kW supplied, HP derived
    DerivedFromKw,
    /// HP supplied, kW derived
    DerivedFromHp,
    /// Estimated from displacement
    Displacement,
    /// No displacement, per-fuel default
    CategoryDefault,
}

/// Power figures after estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPower {
    pub kw: f64,
    pub hp: f64,
    pub source: PowerSource,
}

/// Typical power of a listing when nothing but the fuel type is known
pub fn category_default_kw(fuel: FuelType) -> f64 {
    match fuel {
        FuelType::Diesel => 85.0,
        FuelType::Petrol => 90.0,
        FuelType::Hybrid => 100.0,
        FuelType::Electric => 110.0,
        FuelType::Cng => 70.0,
        FuelType::Lpg => 80.0,
        FuelType::Other => 90.0,
    }
}

fn tiers_for(fuel: FuelType) -> Option<&'static [PowerTier]> {
    match fuel {
        FuelType::Diesel => Some(DIESEL_TIERS),
        FuelType::Electric => None,
        FuelType::Petrol | FuelType::Hybrid | FuelType::Cng | FuelType::Lpg | FuelType::Other => {
            Some(PETROL_TIERS)
        }
    }
}

/// Resolves missing power figures
pub struct PowerEstimator;

impl PowerEstimator {
    /// Resolve kW and HP for a listing
    pub fn resolve(
        displacement_cc: Option<u32>,
        fuel: FuelType,
        supplied: &PowerFigures,
    ) -> ResolvedPower {
        match (supplied.kw, supplied.hp) {
            (Some(kw), Some(hp)) => ResolvedPower {
                kw,
                hp,
                source: PowerSource::Supplied,
            },
            (Some(kw), None) => ResolvedPower {
                kw,
                hp: kw * KW_TO_HP,
                source: PowerSource::DerivedFromKw,
            },
            (None, Some(hp)) => ResolvedPower {
                kw: hp / KW_TO_HP,
                hp,
                source: PowerSource::DerivedFromHp,
            },
            (None, None) => {
                let (kw, source) = Self::estimate_kw(displacement_cc, fuel);
                ResolvedPower {
                    kw,
                    hp: kw * KW_TO_HP,
                    source,
                }
            }
        }
    }

    /// Estimate kW from displacement alone
    pub fn estimate_kw(displacement_cc: Option<u32>, fuel: FuelType) -> (f64, PowerSource) {
        let tiers = match (displacement_cc, tiers_for(fuel)) {
            (Some(cc), Some(tiers)) if cc > 0 => Some((cc, tiers)),
            _ => None,
        };

        match tiers {
            Some((cc, tiers)) => {
                let litres = cc as f64 / 1000.0;
                let kw = tiers
                    .iter()
                    .find(|t| litres <= t.max_litres)
                    .map(|t| t.slope * litres + t.intercept)
                    .unwrap_or(MAX_ESTIMATED_KW);
                (
                    kw.round().clamp(MIN_ESTIMATED_KW, MAX_ESTIMATED_KW),
                    PowerSource::Displacement,
                )
            }
            None => (category_default_kw(fuel), PowerSource::CategoryDefault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> PowerFigures {
        PowerFigures::default()
    }

    #[test]
    fn test_supplied_kw_preserved_exactly() {
        let supplied = PowerFigures { kw: Some(81.3), hp: None };
        let p = PowerEstimator::resolve(Some(2000), FuelType::Diesel, &supplied);
        assert_eq!(p.kw, 81.3);
        assert_eq!(p.source, PowerSource::DerivedFromKw);
        assert!((p.hp - 81.3 * KW_TO_HP).abs() < 1e-9);
    }

    #[test]
    fn test_supplied_hp_preserved_exactly() {
        let supplied = PowerFigures { kw: None, hp: Some(150.0) };
        let p = PowerEstimator::resolve(None, FuelType::Petrol, &supplied);
        assert_eq!(p.hp, 150.0);
        assert!((p.kw - 150.0 / KW_TO_HP).abs() < 1e-9);
        assert_eq!(p.source, PowerSource::DerivedFromHp);
    }

    #[test]
    fn test_both_supplied_untouched() {
        let supplied = PowerFigures { kw: Some(100.0), hp: Some(140.0) };
        let p = PowerEstimator::resolve(Some(1600), FuelType::Petrol, &supplied);
        assert_eq!((p.kw, p.hp), (100.0, 140.0));
        assert_eq!(p.source, PowerSource::Supplied);
    }

    #[test]
    fn test_diesel_anchor_points() {
        for (cc, kw) in [(1500, 75.0), (2000, 110.0), (3000, 140.0)] {
            let (estimated, source) = PowerEstimator::estimate_kw(Some(cc), FuelType::Diesel);
            assert_eq!(estimated, kw, "diesel {}cc", cc);
            assert_eq!(source, PowerSource::Displacement);
        }
    }

    #[test]
    fn test_petrol_anchor_points() {
        for (cc, kw) in [(1200, 60.0), (1600, 92.0), (2000, 132.0), (3000, 184.0)] {
            let (estimated, _) = PowerEstimator::estimate_kw(Some(cc), FuelType::Petrol);
            assert_eq!(estimated, kw, "petrol {}cc", cc);
        }
    }

    #[test]
    fn test_tiers_are_continuous() {
        for tiers in [DIESEL_TIERS, PETROL_TIERS] {
            for pair in tiers.windows(2) {
                let x = pair[0].max_litres;
                let left = pair[0].slope * x + pair[0].intercept;
                let right = pair[1].slope * x + pair[1].intercept;
                assert!((left - right).abs() < 1e-9, "gap at {} L", x);
            }
        }
    }

    #[test]
    fn test_estimate_is_monotone_in_displacement() {
        for fuel in [FuelType::Diesel, FuelType::Petrol, FuelType::Lpg] {
            let mut previous = 0.0;
            for cc in (600..=6000).step_by(100) {
                let (kw, _) = PowerEstimator::estimate_kw(Some(cc), fuel);
                assert!(kw >= previous, "{} at {}cc dropped", fuel, cc);
                previous = kw;
            }
        }
    }

    #[test]
    fn test_estimate_clamped() {
        let (small, _) = PowerEstimator::estimate_kw(Some(100), FuelType::Petrol);
        assert_eq!(small, MIN_ESTIMATED_KW);
        let (huge, _) = PowerEstimator::estimate_kw(Some(9999), FuelType::Petrol);
        assert!(huge <= MAX_ESTIMATED_KW);
    }

    #[test]
    fn test_missing_displacement_uses_category_default() {
        let p = PowerEstimator::resolve(None, FuelType::Diesel, &none());
        assert_eq!(p.kw, category_default_kw(FuelType::Diesel));
        assert_eq!(p.source, PowerSource::CategoryDefault);
    }

    #[test]
    fn test_electric_ignores_displacement() {
        let p = PowerEstimator::resolve(Some(1), FuelType::Electric, &none());
        assert_eq!(p.kw, category_default_kw(FuelType::Electric));
        assert_eq!(p.source, PowerSource::CategoryDefault);
    }

    #[test]
    fn test_estimation_is_deterministic() {
        let a = PowerEstimator::resolve(Some(1968), FuelType::Diesel, &none());
        let b = PowerEstimator::resolve(Some(1968), FuelType::Diesel, &none());
        assert_eq!(a, b);
        assert_eq!(a.hp, a.kw * KW_TO_HP);
    }
}
