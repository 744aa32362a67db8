//! Data Providers
//!
//! Outbound collaborators that resolve live weather, climatology, soil and
//! geocoding data before the core ever sees it. Every provider call
//! succeeds: upstream failures demote to static fallback data, and the
//! chosen path is recorded explicitly in [`Provenance`] so callers and
//! tests can assert which branch ran instead of guessing.

pub mod soil;
pub mod weather;

use std::time::Duration;

use thiserror::Error;

/// Upstream fetch failure. Never escapes a provider; it becomes the
/// fallback reason instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    Payload(String),
}

/// Which path produced a provider result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Live data from the upstream API
    Fetched,
    /// Static fallback data, with the upstream failure that caused it
    Fallback(String),
}

/// A provider result tagged with its origin.
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub data: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn fetched(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Fetched,
        }
    }

    pub fn fallback(data: T, reason: impl Into<String>) -> Self {
        Self {
            data,
            provenance: Provenance::Fallback(reason.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.provenance, Provenance::Fallback(_))
    }
}

const RETRIES: u32 = 2;
const BACKOFF_BASE: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// GET with retry and exponential backoff (0.5 s doubling), returning the
/// response once upstream answers with a success status.
pub(crate) async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<reqwest::Response, ProviderError> {
    let mut delay = BACKOFF_BASE;
    let mut attempt = 0;
    loop {
        let result = client
            .get(url)
            .query(params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => {
                if response.status().is_success() {
                    return Ok(response);
                }
                return Err(ProviderError::Status(response.status()));
            }
            Err(err) if attempt < RETRIES => {
                tracing::debug!("retrying {} after error: {}", url, err);
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(ProviderError::Http(err)),
        }
    }
}

/// Cache key for coordinates, rounded to 4 decimals like the upstream APIs
/// expect (~11 m resolution, close enough for climate data).
pub(crate) fn coord_key(prefix: &str, lat: f64, lon: f64) -> String {
    format!("{}:{:.4},{:.4}", prefix, lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sourced_constructors() {
        let ok = Sourced::fetched(1);
        assert!(!ok.is_fallback());
        assert_eq!(ok.provenance, Provenance::Fetched);

        let fb = Sourced::fallback(2, "upstream down");
        assert!(fb.is_fallback());
        assert_eq!(fb.provenance, Provenance::Fallback("upstream down".to_string()));
    }

    #[test]
    fn test_coord_key_rounding() {
        assert_eq!(coord_key("weather", 28.61391, 77.20902), "weather:28.6139,77.2090");
        assert_eq!(coord_key("soil", -1.0, 2.0), "soil:-1.0000,2.0000");
    }
}
