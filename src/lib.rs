//! Cropcast
//!
//! Crop suitability recommendation service: scores a catalog of crop
//! profiles against a location's current weather, long-run climatology and
//! topsoil properties.
//!
//! Module layout:
//! - `scoring`: pure piecewise-linear and categorical scoring primitives
//! - `catalog`: validated, immutable crop profile table
//! - `engine`: per-crop weighted suitability score over a location snapshot
//! - `recommend`: full-catalog ranking for one location
//! - `calendar`: 12-month suitability projection from monthly climatology
//! - `providers`: Open-Meteo weather/climatology/geocoding and SoilGrids
//!   soil collaborators, with retry, TTL caching and static fallbacks
//! - `api_server`: axum routes exposing the above as JSON

pub mod api_server;
pub mod calendar;
pub mod catalog;
pub mod engine;
pub mod providers;
pub mod recommend;
pub mod scoring;

// Re-export commonly used types
pub use api_server::{create_router, AppState};
pub use calendar::{month_statuses, CalendarProjection, MonthStatus, MonthlyNormal, PlantingStatus};
pub use catalog::{Catalog, CatalogError, CropMetadata, CropProfile, FactorRange, FactorWeights};
pub use engine::{score_crop, LocationSnapshot, SoilProperties};
pub use providers::{Provenance, Sourced};
pub use recommend::{recommend_for_location, Recommendations, ScoreResult};
pub use scoring::{score_linear, score_texture};
