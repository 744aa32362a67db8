//! Soil Provider
//!
//! Resolves topsoil properties (pH, organic carbon, texture class) from the
//! ISRIC SoilGrids REST API. SoilGrids reports scaled integer units
//! (pH × 10, SOC in dg/kg, clay/sand in g/kg); this provider maps them to
//! the engine's units and derives a USDA-style texture class from the
//! clay/sand fractions. Failures fall back to a static loam profile.

use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;
use serde::Deserialize;

use crate::engine::SoilProperties;
use crate::providers::{coord_key, get_with_retry, ProviderError, Sourced};

const SOILGRIDS_URL: &str = "https://rest.isric.org/soilgrids/v2.0/properties/query";

/// Topsoil layer queried for every property.
const TOPSOIL_DEPTH: &str = "0-5cm";

const SOIL_TTL: Duration = Duration::from_secs(86_400);
const SOIL_FALLBACK_TTL: Duration = Duration::from_secs(3600);

fn fallback_soil() -> SoilProperties {
    SoilProperties {
        ph: 6.5,
        soc_pct: Some(1.2),
        texture: "loam".to_string(),
    }
}

// ============================================================================
// SoilGrids response payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct SoilGridsResponse {
    properties: SoilGridsProperties,
}

#[derive(Debug, Deserialize)]
struct SoilGridsProperties {
    #[serde(default)]
    layers: Vec<SoilGridsLayer>,
}

#[derive(Debug, Deserialize)]
struct SoilGridsLayer {
    name: String,
    #[serde(default)]
    depths: Vec<SoilGridsDepth>,
}

#[derive(Debug, Deserialize)]
struct SoilGridsDepth {
    label: String,
    values: SoilGridsValues,
}

#[derive(Debug, Deserialize)]
struct SoilGridsValues {
    mean: Option<f64>,
}

impl SoilGridsResponse {
    /// Topsoil mean for one property, in SoilGrids' scaled units.
    fn topsoil_mean(&self, property: &str) -> Option<f64> {
        self.properties
            .layers
            .iter()
            .find(|layer| layer.name == property)?
            .depths
            .iter()
            .find(|depth| depth.label == TOPSOIL_DEPTH)?
            .values
            .mean
    }
}

/// Classify clay/sand percentages into a coarse USDA texture class.
///
/// Threshold approximation of the USDA texture triangle, restricted to the
/// classes the crop catalog distinguishes.
pub fn classify_texture(clay_pct: f64, sand_pct: f64) -> &'static str {
    let silt_pct = (100.0 - clay_pct - sand_pct).max(0.0);
    if clay_pct >= 40.0 {
        if silt_pct >= 40.0 {
            "silty clay"
        } else {
            "clay"
        }
    } else if clay_pct >= 27.0 {
        "clay loam"
    } else if sand_pct >= 70.0 {
        "sand"
    } else if sand_pct >= 52.0 {
        "sandy loam"
    } else if silt_pct >= 50.0 {
        "silt loam"
    } else {
        "loam"
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Fetched soil data is effectively static; fallbacks retry within the hour.
struct SoilExpiry;

impl Expiry<String, Sourced<SoilProperties>> for SoilExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Sourced<SoilProperties>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(if value.is_fallback() {
            SOIL_FALLBACK_TTL
        } else {
            SOIL_TTL
        })
    }
}

pub struct SoilProvider {
    client: reqwest::Client,
    cache: Cache<String, Sourced<SoilProperties>>,
}

impl Default for SoilProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SoilProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: Cache::builder()
                .max_capacity(10_000)
                .expire_after(SoilExpiry)
                .build(),
        }
    }

    /// Topsoil properties for a point. Never fails: a dead upstream yields
    /// the static loam fallback.
    pub async fn get_soil(&self, lat: f64, lon: f64) -> Sourced<SoilProperties> {
        let key = coord_key("soil", lat, lon);
        if let Some(hit) = self.cache.get(&key).await {
            return hit;
        }

        let sourced = match self.fetch_soil(lat, lon).await {
            Ok(soil) => Sourced::fetched(soil),
            Err(err) => {
                tracing::warn!("soil fetch failed for {}: {}", key, err);
                Sourced::fallback(fallback_soil(), err.to_string())
            }
        };

        self.cache.insert(key, sourced.clone()).await;
        sourced
    }

    async fn fetch_soil(&self, lat: f64, lon: f64) -> Result<SoilProperties, ProviderError> {
        let params = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("property", "phh2o".to_string()),
            ("property", "soc".to_string()),
            ("property", "clay".to_string()),
            ("property", "sand".to_string()),
            ("depth", TOPSOIL_DEPTH.to_string()),
            ("value", "mean".to_string()),
        ];
        let response = get_with_retry(&self.client, SOILGRIDS_URL, &params).await?;
        let payload: SoilGridsResponse = response.json().await?;

        // pH is mandatory; SOC is optional (the engine renormalizes);
        // missing texture fractions default to loam
        let ph = payload
            .topsoil_mean("phh2o")
            .map(|v| v / 10.0)
            .ok_or_else(|| ProviderError::Payload("soilgrids response missing phh2o".to_string()))?;
        let soc_pct = payload.topsoil_mean("soc").map(|v| v / 100.0);
        let texture = match (payload.topsoil_mean("clay"), payload.topsoil_mean("sand")) {
            (Some(clay), Some(sand)) => classify_texture(clay / 10.0, sand / 10.0),
            _ => "loam",
        };

        Ok(SoilProperties {
            ph,
            soc_pct,
            texture: texture.to_string(),
        })
    }
}
