//! Suitability Engine
//!
//! Produces one crop's total suitability score from a location snapshot and
//! a crop profile. Each scored factor (temperature, rainfall, pH, soil
//! organic carbon, texture) contributes via the scoring primitives, weighted
//! per the profile; the weighted partials are summed and rescaled to the
//! catalog ceiling.
//!
//! Missing-data policy: a factor absent from the snapshot (SOC is the only
//! optional one) is excluded from both the earned score and the denominator,
//! so results stay on a comparable 0-100 scale. An unmeasured factor is not
//! the same as a zero-scoring one.
//!
//! The engine never fails: out-of-range inputs degrade to a zero
//! contribution through the primitives' own clamping.

use serde::{Deserialize, Serialize};

use crate::catalog::{CropProfile, SCORE_CEILING};
use crate::scoring::{score_linear, score_texture};

/// Topsoil properties for one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilProperties {
    pub ph: f64,
    /// Soil organic carbon (%). Optional: some sources omit it, which
    /// triggers the engine's renormalization policy.
    pub soc_pct: Option<f64>,
    pub texture: String,
}

/// Ephemeral per-request view of one location's conditions. Built fresh
/// from upstream weather/soil payloads, never cached or mutated.
#[derive(Debug, Clone)]
pub struct LocationSnapshot {
    /// Mean of the daily forecast temperatures (°C)
    pub avg_temp: f64,
    /// Mean of the daily forecast rainfall (mm)
    pub avg_rain: f64,
    pub soil: SoilProperties,
}

impl LocationSnapshot {
    pub fn new(avg_temp: f64, avg_rain: f64, soil: SoilProperties) -> Self {
        Self {
            avg_temp,
            avg_rain,
            soil,
        }
    }

    /// Arithmetic means over paired daily (temp, rain) readings. An empty
    /// sequence yields zeros rather than NaN.
    pub fn from_daily(readings: &[(f64, f64)], soil: SoilProperties) -> Self {
        if readings.is_empty() {
            return Self::new(0.0, 0.0, soil);
        }
        let n = readings.len() as f64;
        let (temp_sum, rain_sum) = readings
            .iter()
            .fold((0.0, 0.0), |(t, r), (dt, dr)| (t + dt, r + dr));
        Self::new(temp_sum / n, rain_sum / n, soil)
    }
}

/// Score one crop against a snapshot. Always in `[0, SCORE_CEILING]`.
pub fn score_crop(profile: &CropProfile, snapshot: &LocationSnapshot) -> f64 {
    let w = &profile.weights;
    let mut earned = 0.0;
    let mut applicable = 0.0;

    let range = |value: f64, r: &crate::catalog::FactorRange, weight: f64| {
        score_linear(value, r.ideal_low, r.ideal_high, r.min, r.max, weight)
    };

    earned += range(snapshot.avg_temp, &profile.temp, w.temperature);
    applicable += w.temperature;

    earned += range(snapshot.avg_rain, &profile.rain, w.rainfall);
    applicable += w.rainfall;

    earned += range(snapshot.soil.ph, &profile.ph, w.ph);
    applicable += w.ph;

    if let Some(soc) = snapshot.soil.soc_pct {
        earned += range(soc, &profile.soc, w.soc);
        applicable += w.soc;
    }

    earned += score_texture(&snapshot.soil.texture, &profile.ideal_textures, w.texture);
    applicable += w.texture;

    if applicable <= 0.0 {
        return 0.0;
    }
    (earned / applicable * SCORE_CEILING).clamp(0.0, SCORE_CEILING)
}
