//! Weather Provider
//!
//! Resolves current weather, a daily-mean forecast, long-run monthly
//! climatology and place-name geocoding from the Open-Meteo APIs. Results
//! are TTL-cached per coordinate; any upstream failure degrades to static
//! fallback data tagged with the failure reason, so the core always
//! receives a complete report.

use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;
use serde::{Deserialize, Serialize};

use crate::calendar::MonthlyNormal;
use crate::providers::{coord_key, get_with_retry, ProviderError, Sourced};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const CLIMATE_URL: &str = "https://climate-api.open-meteo.com/v1/climate";
const GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Climate normals reference period and model.
const CLIMATE_START: &str = "1991-01-01";
const CLIMATE_END: &str = "2020-12-31";
const CLIMATE_MODEL: &str = "EC_Earth3_Veg";

const WEATHER_TTL: Duration = Duration::from_secs(600);
const GEOCODE_TTL: Duration = Duration::from_secs(3600);
/// Fetched climatology barely changes; keep it a week. A fallback entry
/// still caches for a day so a dead upstream is not hammered.
const CLIMATOLOGY_TTL: Duration = Duration::from_secs(86_400 * 7);
const CLIMATOLOGY_FALLBACK_TTL: Duration = Duration::from_secs(86_400);

// ============================================================================
// Wire types (shapes the HTTP layer forwards verbatim)
// ============================================================================

/// Rainfall over the last hour, kept under its upstream key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RainGauge {
    #[serde(rename = "1h")]
    pub one_hour: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub rain: RainGauge,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayTemp {
    pub day: f64,
}

/// One forecast day: daily-mean temperature and precipitation sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DailyReading {
    pub dt: u32,
    pub temp: DayTemp,
    pub rain: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Climatology {
    pub monthly: Vec<MonthlyNormal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub lat: f64,
    pub lon: f64,
    pub current: CurrentConditions,
    pub daily: Vec<DailyReading>,
    pub climatology: Climatology,
}

impl WeatherReport {
    /// Arithmetic means over the daily readings, the inputs the suitability
    /// engine scores against.
    pub fn daily_means(&self) -> (f64, f64) {
        if self.daily.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.daily.len() as f64;
        let (t, r) = self
            .daily
            .iter()
            .fold((0.0, 0.0), |(t, r), d| (t + d.temp.day, r + d.rain));
        (t / n, r / n)
    }

    /// Static report used when the forecast API is unreachable.
    fn fallback(lat: f64, lon: f64) -> Self {
        let days = [
            (26.0, 5.0),
            (27.0, 12.0),
            (25.0, 8.0),
            (24.0, 2.0),
            (26.0, 15.0),
            (28.0, 0.0),
            (27.0, 10.0),
        ];
        Self {
            lat,
            lon,
            current: CurrentConditions {
                temp: 26.0,
                humidity: 60.0,
                wind_speed: 3.2,
                rain: RainGauge { one_hour: 0.0 },
            },
            daily: days
                .iter()
                .enumerate()
                .map(|(i, &(temp, rain))| DailyReading {
                    dt: i as u32,
                    temp: DayTemp { day: temp },
                    rain,
                })
                .collect(),
            climatology: Climatology { monthly: vec![] },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodePlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResults {
    pub results: Vec<GeocodePlace>,
}

/// Static climatology used when the climate API is unreachable
/// (warm-subtropical monthly normals).
fn fallback_climatology() -> Climatology {
    let table = [
        (1, 18.0, 25.0),
        (2, 20.0, 30.0),
        (3, 24.0, 35.0),
        (4, 28.0, 45.0),
        (5, 32.0, 60.0),
        (6, 34.0, 80.0),
        (7, 33.0, 90.0),
        (8, 32.0, 85.0),
        (9, 30.0, 70.0),
        (10, 26.0, 50.0),
        (11, 22.0, 35.0),
        (12, 19.0, 28.0),
    ];
    Climatology {
        monthly: table
            .iter()
            .map(|&(month, temp, rain)| MonthlyNormal { month, temp, rain })
            .collect(),
    }
}

// ============================================================================
// Open-Meteo response payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<ForecastCurrent>,
    daily: Option<ForecastDaily>,
}

#[derive(Debug, Deserialize)]
struct ForecastCurrent {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    rain: Option<f64>,
    wind_speed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastDaily {
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ClimateResponse {
    daily: Option<ClimateDaily>,
}

#[derive(Debug, Deserialize)]
struct ClimateDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

// ============================================================================
// Provider
// ============================================================================

/// Per-entry TTL: fetched climatology lives long, fallbacks expire sooner
/// so a recovered upstream is picked up within a day.
struct ClimatologyExpiry;

impl Expiry<String, Sourced<Climatology>> for ClimatologyExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Sourced<Climatology>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(if value.is_fallback() {
            CLIMATOLOGY_FALLBACK_TTL
        } else {
            CLIMATOLOGY_TTL
        })
    }
}

pub struct WeatherProvider {
    client: reqwest::Client,
    weather_cache: Cache<String, Sourced<WeatherReport>>,
    climatology_cache: Cache<String, Sourced<Climatology>>,
    geocode_cache: Cache<String, Sourced<GeocodeResults>>,
}

impl Default for WeatherProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            weather_cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(WEATHER_TTL)
                .build(),
            climatology_cache: Cache::builder()
                .max_capacity(10_000)
                .expire_after(ClimatologyExpiry)
                .build(),
            geocode_cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(GEOCODE_TTL)
                .build(),
        }
    }

    /// Current conditions + daily forecast + climatology for a point.
    /// Never fails: a dead upstream yields the static fallback report.
    pub async fn get_weather(&self, lat: f64, lon: f64) -> Sourced<WeatherReport> {
        let key = coord_key("weather", lat, lon);
        if let Some(hit) = self.weather_cache.get(&key).await {
            return hit;
        }

        let climatology = self.get_climatology(lat, lon).await;
        let sourced = match self.fetch_forecast(lat, lon).await {
            Ok(mut report) => {
                report.climatology = climatology.data;
                Sourced::fetched(report)
            }
            Err(err) => {
                tracing::warn!("forecast fetch failed for {}: {}", key, err);
                let mut report = WeatherReport::fallback(lat, lon);
                report.climatology = climatology.data;
                Sourced::fallback(report, err.to_string())
            }
        };

        self.weather_cache.insert(key, sourced.clone()).await;
        sourced
    }

    /// Monthly climate normals for a point, grouped from 30 years of daily
    /// model output.
    pub async fn get_climatology(&self, lat: f64, lon: f64) -> Sourced<Climatology> {
        let key = coord_key("climatology", lat, lon);
        if let Some(hit) = self.climatology_cache.get(&key).await {
            return hit;
        }

        let sourced = match self.fetch_climatology(lat, lon).await {
            Ok(climatology) => Sourced::fetched(climatology),
            Err(err) => {
                tracing::warn!("climatology fetch failed for {}: {}", key, err);
                Sourced::fallback(fallback_climatology(), err.to_string())
            }
        };

        self.climatology_cache.insert(key, sourced.clone()).await;
        sourced
    }

    /// Top place-name matches for a free-text query. An empty query
    /// short-circuits to an empty result without touching the network.
    pub async fn geocode(&self, query: &str) -> Sourced<GeocodeResults> {
        let query = query.trim();
        if query.is_empty() {
            return Sourced::fetched(GeocodeResults { results: vec![] });
        }

        let key = format!("geo:{}", query);
        if let Some(hit) = self.geocode_cache.get(&key).await {
            return hit;
        }

        let sourced = match self.fetch_geocode(query).await {
            Ok(results) => Sourced::fetched(results),
            Err(err) => {
                tracing::warn!("geocode fetch failed for '{}': {}", query, err);
                let sample = GeocodeResults {
                    results: vec![GeocodePlace {
                        name: "Sample".to_string(),
                        lat: 28.6139,
                        lon: 77.2090,
                    }],
                };
                Sourced::fallback(sample, err.to_string())
            }
        };

        self.geocode_cache.insert(key, sourced.clone()).await;
        sourced
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<WeatherReport, ProviderError> {
        let params = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("timezone", "auto".to_string()),
            (
                "current",
                "temperature_2m,relative_humidity_2m,rain,wind_speed_10m".to_string(),
            ),
            ("daily", "temperature_2m_mean,precipitation_sum".to_string()),
        ];
        let response = get_with_retry(&self.client, FORECAST_URL, &params).await?;
        let payload: ForecastResponse = response.json().await?;

        let current = payload.current.unwrap_or(ForecastCurrent {
            temperature_2m: None,
            relative_humidity_2m: None,
            rain: None,
            wind_speed_10m: None,
        });
        let daily = payload.daily.unwrap_or(ForecastDaily {
            temperature_2m_mean: vec![],
            precipitation_sum: vec![],
        });

        let readings = daily
            .temperature_2m_mean
            .iter()
            .zip(daily.precipitation_sum.iter())
            .enumerate()
            .map(|(i, (temp, rain))| DailyReading {
                dt: i as u32,
                temp: DayTemp {
                    day: temp.unwrap_or(0.0),
                },
                rain: rain.unwrap_or(0.0),
            })
            .collect();

        Ok(WeatherReport {
            lat,
            lon,
            current: CurrentConditions {
                temp: current.temperature_2m.unwrap_or(0.0),
                humidity: current.relative_humidity_2m.unwrap_or(0.0),
                wind_speed: current.wind_speed_10m.unwrap_or(0.0),
                rain: RainGauge {
                    one_hour: current.rain.unwrap_or(0.0),
                },
            },
            daily: readings,
            climatology: Climatology { monthly: vec![] },
        })
    }

    async fn fetch_climatology(&self, lat: f64, lon: f64) -> Result<Climatology, ProviderError> {
        let params = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("start_date", CLIMATE_START.to_string()),
            ("end_date", CLIMATE_END.to_string()),
            ("models", CLIMATE_MODEL.to_string()),
            ("daily", "temperature_2m_mean,precipitation_sum".to_string()),
            ("timezone", "auto".to_string()),
        ];
        let response = get_with_retry(&self.client, CLIMATE_URL, &params).await?;
        let payload: ClimateResponse = response.json().await?;

        let daily = payload
            .daily
            .ok_or_else(|| ProviderError::Payload("climate response missing daily".to_string()))?;

        Ok(group_monthly(
            &daily.time,
            &daily.temperature_2m_mean,
            &daily.precipitation_sum,
        ))
    }

    async fn fetch_geocode(&self, query: &str) -> Result<GeocodeResults, ProviderError> {
        let params = [
            ("name", query.to_string()),
            ("count", "5".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];
        let response = get_with_retry(&self.client, GEOCODE_URL, &params).await?;
        let payload: GeocodeResponse = response.json().await?;

        let results = payload
            .results
            .into_iter()
            .filter_map(|hit| match (hit.name, hit.latitude, hit.longitude) {
                (Some(name), Some(lat), Some(lon)) => Some(GeocodePlace { name, lat, lon }),
                _ => None,
            })
            .collect();
        Ok(GeocodeResults { results })
    }
}

/// Group 30 years of daily normals into 12 monthly means, one decimal.
/// Months with no samples (truncated upstream data) get the neutral
/// default; the output always covers months 1..=12 in order.
fn group_monthly(
    dates: &[String],
    temps: &[Option<f64>],
    rains: &[Option<f64>],
) -> Climatology {
    let mut temp_sum = [0.0f64; 12];
    let mut rain_sum = [0.0f64; 12];
    let mut count = [0u32; 12];

    for ((date, temp), rain) in dates.iter().zip(temps.iter()).zip(rains.iter()) {
        let month = date
            .split('-')
            .nth(1)
            .and_then(|m| m.parse::<usize>().ok());
        if let Some(month @ 1..=12) = month {
            temp_sum[month - 1] += temp.unwrap_or(0.0);
            rain_sum[month - 1] += rain.unwrap_or(0.0);
            count[month - 1] += 1;
        }
    }

    let round1 = |v: f64| (v * 10.0).round() / 10.0;
    let monthly = (1..=12u32)
        .map(|m| {
            let i = (m - 1) as usize;
            if count[i] > 0 {
                MonthlyNormal {
                    month: m,
                    temp: round1(temp_sum[i] / count[i] as f64),
                    rain: round1(rain_sum[i] / count[i] as f64),
                }
            } else {
                MonthlyNormal::neutral(m)
            }
        })
        .collect();

    Climatology { monthly }
}
