//! Monthly Calendar Projector
//!
//! Projects suitability across the twelve calendar months by substituting
//! each month's climatological (temp, rain) for the live daily averages —
//! soil does not vary monthly — and bucketing the best catalog score into a
//! coarse planting status. Months are always emitted in calendar order
//! 1..=12 and exactly 12 entries are produced; months missing from the
//! input climatology fall back to neutral defaults rather than being
//! omitted.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::engine::{score_crop, LocationSnapshot, SoilProperties};

/// Scores at or above this are "favorable".
pub const STATUS_FAVORABLE_MIN: f64 = 70.0;
/// Scores at or above this (and below favorable) are "moderate".
pub const STATUS_MODERATE_MIN: f64 = 40.0;

/// Neutral stand-in for a month absent from the climatology, matching the
/// weather provider's own missing-month default.
pub const NEUTRAL_TEMP: f64 = 20.0;
pub const NEUTRAL_RAIN: f64 = 50.0;

/// One month's long-run average conditions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MonthlyNormal {
    pub month: u32,
    pub temp: f64,
    pub rain: f64,
}

impl MonthlyNormal {
    pub fn neutral(month: u32) -> Self {
        Self {
            month,
            temp: NEUTRAL_TEMP,
            rain: NEUTRAL_RAIN,
        }
    }
}

/// Coarse planting status derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantingStatus {
    Favorable,
    Moderate,
    Unfavorable,
}

impl PlantingStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= STATUS_FAVORABLE_MIN {
            PlantingStatus::Favorable
        } else if score >= STATUS_MODERATE_MIN {
            PlantingStatus::Moderate
        } else {
            PlantingStatus::Unfavorable
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            PlantingStatus::Favorable => "favorable",
            PlantingStatus::Moderate => "moderate",
            PlantingStatus::Unfavorable => "unfavorable",
        }
    }
}

/// One month's projected suitability.
#[derive(Debug, Clone, Serialize)]
pub struct MonthStatus {
    pub month: u32,
    pub score: f64,
    pub status: PlantingStatus,
}

/// Projector output wire shape: derived statuses plus the raw climatology
/// they were derived from, for display side by side.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarProjection {
    pub months: Vec<MonthStatus>,
    pub climatology_months: Vec<MonthlyNormal>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Project the catalog's best-available suitability across all 12 months.
///
/// The per-month score is the maximum over the catalog (the signal a
/// planting calendar needs: "is anything worth planting now"), classified
/// with the fixed status thresholds. Input normals may arrive in any order
/// and with gaps; output is always months 1..=12 in order.
pub fn month_statuses(
    catalog: &Catalog,
    climatology: &[MonthlyNormal],
    soil: &SoilProperties,
) -> CalendarProjection {
    let mut by_month: [Option<MonthlyNormal>; 12] = [None; 12];
    for normal in climatology {
        if (1..=12).contains(&normal.month) {
            by_month[(normal.month - 1) as usize] = Some(*normal);
        }
    }

    let mut months = Vec::with_capacity(12);
    let mut climatology_months = Vec::with_capacity(12);

    for m in 1..=12u32 {
        let normal = by_month[(m - 1) as usize].unwrap_or_else(|| MonthlyNormal::neutral(m));
        let snapshot = LocationSnapshot::new(normal.temp, normal.rain, soil.clone());
        let best = catalog
            .crops()
            .iter()
            .map(|crop| score_crop(crop, &snapshot))
            .fold(0.0, f64::max);
        months.push(MonthStatus {
            month: m,
            score: round1(best),
            status: PlantingStatus::from_score(best),
        });
        climatology_months.push(normal);
    }

    CalendarProjection {
        months,
        climatology_months,
    }
}
