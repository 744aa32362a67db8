// Axum API server module
//
// JSON endpoints over the recommendation core plus the weather/soil
// providers: recommend, calendar, catalog listing, raw weather/soil,
// geocoding and CSV export.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use serde::Deserialize;
use std::sync::Arc;

use crate::calendar::{month_statuses, CalendarProjection};
use crate::catalog::{Catalog, CropMetadata};
use crate::engine::{LocationSnapshot, SoilProperties};
use crate::providers::soil::SoilProvider;
use crate::providers::weather::{GeocodeResults, WeatherProvider, WeatherReport};
use crate::recommend::{recommend_for_location, Recommendations};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub weather: Arc<WeatherProvider>,
    pub soil: Arc<SoilProvider>,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        tracing::info!("Loading crop catalog...");
        let catalog = Arc::new(Catalog::builtin()?);
        tracing::info!("Catalog loaded ({} crops)", catalog.len());

        Ok(Self {
            catalog,
            weather: Arc::new(WeatherProvider::new()),
            soil: Arc::new(SoilProvider::new()),
        })
    }

    /// State over an arbitrary catalog, for tests.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            weather: Arc::new(WeatherProvider::new()),
            soil: Arc::new(SoilProvider::new()),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Provider passthrough (JSON)
        .route("/api/weather", get(get_weather))
        .route("/api/soil", get(get_soil))
        .route("/api/geocode", get(geocode))
        // Recommendation core (JSON)
        .route("/api/recommend", post(recommend))
        .route("/api/calendar", get(calendar))
        .route("/api/crops", get(list_crops))
        // CSV export
        .route("/api/export/csv", post(export_csv))
        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request validation
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoordQuery {
    lat: Option<String>,
    lon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeQuery {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExportRequest {
    #[serde(default)]
    recs: Vec<serde_json::Value>,
    #[serde(default)]
    fields: Vec<String>,
}

fn validate_coords(lat: f64, lon: f64) -> Result<(f64, f64), AppError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::BadRequest(
            "out of range coordinates".to_string(),
        ));
    }
    Ok((lat, lon))
}

fn parse_coords(query: &CoordQuery) -> Result<(f64, f64), AppError> {
    let (lat, lon) = match (&query.lat, &query.lon) {
        (Some(lat), Some(lon)) if !lat.is_empty() && !lon.is_empty() => (lat, lon),
        _ => return Err(AppError::BadRequest("lat and lon required".to_string())),
    };
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("invalid coordinates".to_string()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("invalid coordinates".to_string()))?;
    validate_coords(lat, lon)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<CoordQuery>,
) -> Result<Json<WeatherReport>, AppError> {
    let (lat, lon) = parse_coords(&query)?;
    let report = state.weather.get_weather(lat, lon).await;
    Ok(Json(report.data))
}

async fn get_soil(
    State(state): State<AppState>,
    Query(query): Query<CoordQuery>,
) -> Result<Json<SoilProperties>, AppError> {
    let (lat, lon) = parse_coords(&query)?;
    let soil = state.soil.get_soil(lat, lon).await;
    Ok(Json(soil.data))
}

async fn geocode(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Json<GeocodeResults> {
    Json(state.weather.geocode(&query.query).await.data)
}

async fn recommend(
    State(state): State<AppState>,
    Json(body): Json<RecommendRequest>,
) -> Result<Json<Recommendations>, AppError> {
    let (lat, lon) = match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => validate_coords(lat, lon)?,
        _ => return Err(AppError::BadRequest("lat and lon required".to_string())),
    };

    let (weather, soil) = tokio::join!(
        state.weather.get_weather(lat, lon),
        state.soil.get_soil(lat, lon)
    );

    let (avg_temp, avg_rain) = weather.data.daily_means();
    let snapshot = LocationSnapshot::new(avg_temp, avg_rain, soil.data);
    Ok(Json(recommend_for_location(&state.catalog, &snapshot)))
}

async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CoordQuery>,
) -> Result<Json<CalendarProjection>, AppError> {
    let (lat, lon) = parse_coords(&query)?;

    let (climatology, soil) = tokio::join!(
        state.weather.get_climatology(lat, lon),
        state.soil.get_soil(lat, lon)
    );

    let projection = month_statuses(&state.catalog, &climatology.data.monthly, &soil.data);
    Ok(Json(projection))
}

/// Catalog listing entry: name and metadata only, no scoring.
#[derive(Debug, serde::Serialize)]
struct CropSummary {
    name: String,
    metadata: CropMetadata,
}

#[derive(Debug, serde::Serialize)]
struct CropsListing {
    crops: Vec<CropSummary>,
}

async fn list_crops(State(state): State<AppState>) -> Json<CropsListing> {
    let crops = state
        .catalog
        .crops()
        .iter()
        .map(|crop| CropSummary {
            name: crop.name.clone(),
            metadata: crop.metadata.clone(),
        })
        .collect();
    Json(CropsListing { crops })
}

async fn export_csv(
    Json(body): Json<ExportRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.recs.is_empty() || body.fields.is_empty() {
        return Err(AppError::BadRequest("recs and fields required".to_string()));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&body.fields)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    for rec in &body.recs {
        let row: Vec<String> = body
            .fields
            .iter()
            .map(|field| match rec.get(field) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=crop_recommendations.csv",
            ),
        ],
        bytes,
    ))
}

// ============================================================================
// Error Handling
// ============================================================================

enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
