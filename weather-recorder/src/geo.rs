use std::time::Duration;

use async_trait::async_trait;
use common::errors::WeatherError;
use common::models::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;

const IP_GEO_URL: &str = "http://ip-api.com/json";
const GEO_TIMEOUT_SECS: u64 = 10;

/// Where the cycle gets its coordinates from. Any failure collapses into
/// [`WeatherError::Coordinates`]; the caller never sees transport details.
#[async_trait]
pub trait CoordinatesSource: Send + Sync {
    async fn resolve(&self) -> Result<Coordinates, WeatherError>;
}

/// A pair that is already known. Used when the caller resolved the location
/// itself and in tests.
pub struct FixedCoordinates(pub Coordinates);

#[async_trait]
impl CoordinatesSource for FixedCoordinates {
    async fn resolve(&self) -> Result<Coordinates, WeatherError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct IpGeoResponse {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Default source: a static override from configuration when both values
/// are present, otherwise IP-based geolocation.
pub struct CoordinatesResolver {
    override_latitude: Option<String>,
    override_longitude: Option<String>,
    geo_url: String,
    http: Client,
}

impl CoordinatesResolver {
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.latitude.clone(), config.longitude.clone())
    }

    pub fn new(override_latitude: Option<String>, override_longitude: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(GEO_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            override_latitude,
            override_longitude,
            geo_url: IP_GEO_URL.to_string(),
            http,
        }
    }

    fn from_override(latitude: &str, longitude: &str) -> Result<Coordinates, WeatherError> {
        let latitude = latitude
            .parse::<f64>()
            .map_err(|_| WeatherError::Coordinates)?;
        let longitude = longitude
            .parse::<f64>()
            .map_err(|_| WeatherError::Coordinates)?;
        Ok(Coordinates {
            latitude,
            longitude,
        })
    }

    async fn lookup(&self) -> Result<Coordinates, WeatherError> {
        let response = self.http.get(&self.geo_url).send().await.map_err(|err| {
            debug!(error = %err, "geolocation request failed");
            WeatherError::Coordinates
        })?;
        if !response.status().is_success() {
            return Err(WeatherError::Coordinates);
        }
        let body: IpGeoResponse = response.json().await.map_err(|err| {
            debug!(error = %err, "geolocation response is not usable");
            WeatherError::Coordinates
        })?;
        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(WeatherError::Coordinates),
        }
    }
}

#[async_trait]
impl CoordinatesSource for CoordinatesResolver {
    async fn resolve(&self) -> Result<Coordinates, WeatherError> {
        match (&self.override_latitude, &self.override_longitude) {
            (Some(latitude), Some(longitude)) => Self::from_override(latitude, longitude),
            _ => self.lookup().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn override_pair_is_parsed() {
        let resolver = CoordinatesResolver::new(Some("57.3".into()), Some("49.4".into()));
        let coordinates = resolver.resolve().await.unwrap();
        assert_eq!(coordinates.latitude, 57.3);
        assert_eq!(coordinates.longitude, 49.4);
    }

    #[tokio::test]
    async fn malformed_override_is_a_coordinate_failure() {
        let resolver = CoordinatesResolver::new(Some("north".into()), Some("49.4".into()));
        assert!(matches!(
            resolver.resolve().await.unwrap_err(),
            WeatherError::Coordinates
        ));
    }

    #[tokio::test]
    async fn fixed_coordinates_resolve_to_themselves() {
        let source = FixedCoordinates(Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        });
        assert_eq!(source.resolve().await.unwrap().latitude, 1.0);
    }
}
