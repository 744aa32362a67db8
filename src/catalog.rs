//! Crop Catalog
//!
//! Immutable table of crop profiles: the ideal and tolerable climate/soil
//! envelopes each crop is scored against, plus display metadata that is
//! passed through untouched. The catalog is an explicitly constructed value
//! injected into the engine and HTTP state at startup, never a hidden
//! global, so tests can substitute their own crop sets.
//!
//! Profile invariants (ideal range inside bounds, non-negative weights
//! summing to the score ceiling, unique names) are configuration contracts
//! and are enforced once at construction. A violated invariant is a defect
//! in the shipped data, so `Catalog::new` rejects it up front instead of
//! masking it per-request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Total score ceiling: per-crop factor weights must sum to this, and every
/// engine score lands in `[0, SCORE_CEILING]`.
pub const SCORE_CEILING: f64 = 100.0;

/// One scored factor's envelope: full score on `[ideal_low, ideal_high]`,
/// zero at or beyond `[min, max]`, linear in between.
#[derive(Debug, Clone, Copy)]
pub struct FactorRange {
    pub ideal_low: f64,
    pub ideal_high: f64,
    pub min: f64,
    pub max: f64,
}

impl FactorRange {
    pub const fn new(ideal_low: f64, ideal_high: f64, min: f64, max: f64) -> Self {
        Self {
            ideal_low,
            ideal_high,
            min,
            max,
        }
    }

    fn validate(&self, crop: &str, factor: &'static str) -> Result<(), CatalogError> {
        let ordered = self.min <= self.ideal_low
            && self.ideal_low <= self.ideal_high
            && self.ideal_high <= self.max;
        if ordered {
            Ok(())
        } else {
            Err(CatalogError::RangeOutsideBounds {
                crop: crop.to_string(),
                factor,
                ideal_low: self.ideal_low,
                ideal_high: self.ideal_high,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Per-factor contribution weights. Non-negative, summing to
/// [`SCORE_CEILING`].
#[derive(Debug, Clone, Copy)]
pub struct FactorWeights {
    pub temperature: f64,
    pub rainfall: f64,
    pub ph: f64,
    pub soc: f64,
    pub texture: f64,
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.temperature + self.rainfall + self.ph + self.soc + self.texture
    }

    fn validate(&self, crop: &str) -> Result<(), CatalogError> {
        let named = [
            ("temperature", self.temperature),
            ("rainfall", self.rainfall),
            ("ph", self.ph),
            ("soc", self.soc),
            ("texture", self.texture),
        ];
        for (factor, w) in named {
            if w < 0.0 {
                return Err(CatalogError::NegativeWeight {
                    crop: crop.to_string(),
                    factor,
                });
            }
        }
        let sum = self.sum();
        if (sum - SCORE_CEILING).abs() > 1e-6 {
            return Err(CatalogError::WeightSum {
                crop: crop.to_string(),
                sum,
                expected: SCORE_CEILING,
            });
        }
        Ok(())
    }
}

/// Descriptive fields carried alongside scores, never scored themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropMetadata {
    pub display_name: String,
    pub category: String,
}

/// One crop's complete scoring profile.
#[derive(Debug, Clone)]
pub struct CropProfile {
    /// Unique identifier within the catalog
    pub name: String,
    /// Temperature envelope (°C)
    pub temp: FactorRange,
    /// Rainfall envelope (mm)
    pub rain: FactorRange,
    /// Soil pH envelope
    pub ph: FactorRange,
    /// Soil organic carbon envelope (%)
    pub soc: FactorRange,
    /// Accepted soil texture classes, matched case-insensitively
    pub ideal_textures: Vec<String>,
    pub weights: FactorWeights,
    pub metadata: CropMetadata,
}

/// Malformed catalog data. Raised at load time, never per-request.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(
        "crop '{crop}': {factor} ideal range {ideal_low}..{ideal_high} \
         not inside bounds {min}..{max}"
    )]
    RangeOutsideBounds {
        crop: String,
        factor: &'static str,
        ideal_low: f64,
        ideal_high: f64,
        min: f64,
        max: f64,
    },

    #[error("crop '{crop}': negative weight for {factor}")]
    NegativeWeight { crop: String, factor: &'static str },

    #[error("crop '{crop}': weights sum to {sum}, expected {expected}")]
    WeightSum {
        crop: String,
        sum: f64,
        expected: f64,
    },

    #[error("duplicate crop name '{0}'")]
    DuplicateName(String),
}

/// Read-only crop profile table, safe to share by reference across
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Catalog {
    crops: Vec<CropProfile>,
}

impl Catalog {
    /// Build a catalog, validating every profile.
    pub fn new(crops: Vec<CropProfile>) -> Result<Self, CatalogError> {
        let mut seen: Vec<&str> = Vec::with_capacity(crops.len());
        for crop in &crops {
            if seen.contains(&crop.name.as_str()) {
                return Err(CatalogError::DuplicateName(crop.name.clone()));
            }
            seen.push(&crop.name);
            crop.temp.validate(&crop.name, "temperature")?;
            crop.rain.validate(&crop.name, "rainfall")?;
            crop.ph.validate(&crop.name, "ph")?;
            crop.soc.validate(&crop.name, "soc")?;
            crop.weights.validate(&crop.name)?;
        }
        Ok(Self { crops })
    }

    /// The production crop set: warm-subtropical field and vegetable crops.
    /// Envelopes follow FAO Ecocrop-style tolerances; rainfall is mm over
    /// the scored window (daily-mean forecast or monthly climatology).
    pub fn builtin() -> Result<Self, CatalogError> {
        let weights = FactorWeights {
            temperature: 30.0,
            rainfall: 25.0,
            ph: 20.0,
            soc: 10.0,
            texture: 15.0,
        };

        let crop = |name: &str,
                    display: &str,
                    category: &str,
                    temp: FactorRange,
                    rain: FactorRange,
                    ph: FactorRange,
                    soc: FactorRange,
                    textures: &[&str]| CropProfile {
            name: name.to_string(),
            temp,
            rain,
            ph,
            soc,
            ideal_textures: textures.iter().map(|t| t.to_string()).collect(),
            weights,
            metadata: CropMetadata {
                display_name: display.to_string(),
                category: category.to_string(),
            },
        };

        Self::new(vec![
            crop(
                "wheat",
                "Wheat",
                "cereal",
                FactorRange::new(15.0, 24.0, 5.0, 32.0),
                FactorRange::new(10.0, 60.0, 0.0, 150.0),
                FactorRange::new(6.0, 7.5, 5.0, 8.5),
                FactorRange::new(0.8, 2.5, 0.2, 5.0),
                &["loam", "clay loam"],
            ),
            crop(
                "rice",
                "Rice",
                "cereal",
                FactorRange::new(22.0, 32.0, 15.0, 40.0),
                FactorRange::new(40.0, 150.0, 5.0, 300.0),
                FactorRange::new(5.5, 7.0, 4.5, 8.0),
                FactorRange::new(1.0, 3.0, 0.3, 6.0),
                &["clay", "clay loam", "silty clay"],
            ),
            crop(
                "maize",
                "Maize",
                "cereal",
                FactorRange::new(20.0, 30.0, 10.0, 38.0),
                FactorRange::new(20.0, 90.0, 0.0, 200.0),
                FactorRange::new(5.8, 7.0, 5.0, 8.0),
                FactorRange::new(0.8, 2.5, 0.2, 5.0),
                &["loam", "sandy loam", "silt loam"],
            ),
            crop(
                "sorghum",
                "Sorghum",
                "cereal",
                FactorRange::new(24.0, 33.0, 12.0, 42.0),
                FactorRange::new(10.0, 60.0, 0.0, 140.0),
                FactorRange::new(5.5, 7.5, 4.8, 8.5),
                FactorRange::new(0.5, 2.0, 0.1, 4.0),
                &["sandy loam", "loam"],
            ),
            crop(
                "soybean",
                "Soybean",
                "legume",
                FactorRange::new(20.0, 30.0, 10.0, 38.0),
                FactorRange::new(25.0, 90.0, 0.0, 180.0),
                FactorRange::new(6.0, 7.0, 5.2, 8.0),
                FactorRange::new(1.0, 2.5, 0.3, 5.0),
                &["loam", "clay loam"],
            ),
            crop(
                "potato",
                "Potato",
                "vegetable",
                FactorRange::new(15.0, 22.0, 7.0, 30.0),
                FactorRange::new(20.0, 75.0, 0.0, 160.0),
                FactorRange::new(5.0, 6.5, 4.2, 7.5),
                FactorRange::new(1.2, 3.0, 0.4, 6.0),
                &["sandy loam", "loam"],
            ),
            crop(
                "tomato",
                "Tomato",
                "vegetable",
                FactorRange::new(18.0, 27.0, 10.0, 35.0),
                FactorRange::new(15.0, 70.0, 0.0, 150.0),
                FactorRange::new(6.0, 7.0, 5.0, 8.0),
                FactorRange::new(1.0, 2.5, 0.3, 5.0),
                &["loam", "sandy loam"],
            ),
            crop(
                "cotton",
                "Cotton",
                "fibre",
                FactorRange::new(21.0, 32.0, 14.0, 40.0),
                FactorRange::new(15.0, 80.0, 0.0, 180.0),
                FactorRange::new(6.0, 8.0, 5.2, 9.0),
                FactorRange::new(0.6, 2.0, 0.2, 4.0),
                &["clay loam", "loam", "sandy loam"],
            ),
        ])
    }

    pub fn crops(&self) -> &[CropProfile] {
        &self.crops
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}
