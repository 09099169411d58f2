use crate::config::toml_config::MapsConfig;
use crate::domain::model::{GeoPoint, Place};
use crate::domain::ports::MapsClient;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Geometry {
    location: GeoPoint,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    name: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct TravelDuration {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    duration: Option<TravelDuration>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

/// Google Maps Web Service 用戶端
pub struct GoogleMapsClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
    region: String,
    timeout: Duration,
}

impl GoogleMapsClient {
    /// 缺少 API key 時回傳設定錯誤，不送出任何請求
    pub fn from_config(config: &MapsConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            language: config.language.clone(),
            region: config.region.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}/json", self.base_url, endpoint);
        tracing::debug!("Maps request: {} {:?}", endpoint, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<T>().await?)
    }
}

/// OK 與 ZERO_RESULTS 以外的狀態一律視為錯誤
fn check_status(endpoint: &str, status: &str, error_message: Option<String>) -> Result<()> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(EtlError::MapsApiError {
            endpoint: endpoint.to_string(),
            status: other.to_string(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl MapsClient for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        tracing::debug!("address: {}", address);

        let response: GeocodeResponse = self
            .get_json(
                "geocode",
                &[
                    ("address", address.to_string()),
                    ("language", self.language.clone()),
                    ("region", self.region.clone()),
                ],
            )
            .await?;
        check_status("geocode", &response.status, response.error_message)?;

        let location = response
            .results
            .into_iter()
            .next()
            .map(|result| result.geometry.location);
        if location.is_none() {
            tracing::debug!("No geocode results");
        }
        Ok(location)
    }

    async fn nearest_place(
        &self,
        origin: GeoPoint,
        place_type: Option<&str>,
        keyword: Option<&str>,
    ) -> Result<Option<Place>> {
        let mut query = vec![
            ("location", origin.as_query()),
            ("rankby", "distance".to_string()),
        ];
        if let Some(place_type) = place_type {
            query.push(("type", place_type.to_string()));
        }
        if let Some(keyword) = keyword {
            query.push(("keyword", keyword.to_string()));
        }

        let response: NearbySearchResponse = self.get_json("place/nearbysearch", &query).await?;
        check_status("place/nearbysearch", &response.status, response.error_message)?;

        Ok(response.results.into_iter().next().map(|result| Place {
            name: result.name,
            location: result.geometry.location,
        }))
    }

    async fn walking_time_seconds(&self, origin: GeoPoint, dest: GeoPoint) -> Result<Option<u64>> {
        let response: DistanceMatrixResponse = self
            .get_json(
                "distancematrix",
                &[
                    ("origins", origin.as_query()),
                    ("destinations", dest.as_query()),
                    ("mode", "walking".to_string()),
                ],
            )
            .await?;
        check_status("distancematrix", &response.status, response.error_message)?;

        let element = response
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next());

        Ok(match element {
            Some(element) if element.status == "OK" => element.duration.map(|d| d.value),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status("geocode", "OK", None).is_ok());
        assert!(check_status("geocode", "ZERO_RESULTS", None).is_ok());

        let err = check_status(
            "geocode",
            "REQUEST_DENIED",
            Some("The provided API key is invalid.".to_string()),
        )
        .unwrap_err();
        match err {
            EtlError::MapsApiError { status, message, .. } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "The provided API key is invalid.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let mut config = MapsConfig::default();
        config.api_key = Some("key".to_string());
        config.base_url = "http://localhost:9999/maps/api/".to_string();

        let client = GoogleMapsClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/maps/api");
    }
}
