use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::GeocodeConfig;
use crate::error::GeocodeError;
use crate::types::{LocationRecord, LookupOutcome, LookupPath, Place, ResolvedLocation};

/// Client for the OpenWeatherMap Geocoding API.
///
/// Cheap to clone; the underlying HTTP client is reference-counted, so one
/// instance can be shared across tasks or handlers.
#[derive(Clone)]
pub struct GeocodeClient {
    http_client: Client,
    config: GeocodeConfig,
}

impl GeocodeClient {
    pub fn new(config: GeocodeConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Build a client from `OPENWEATHER_API_KEY` (and optional
    /// `OPENWEATHER_GEO_URL`)
    pub fn from_env() -> Result<Self> {
        Self::new(GeocodeConfig::from_env()?)
    }

    /// Resolve a free-text "City, State" query via the direct-search
    /// endpoint.
    ///
    /// A fixed ", US" suffix is appended and a single candidate is
    /// requested. An empty candidate list is `Ok(None)`, distinct from
    /// provider and transport failures.
    pub async fn lookup_city(
        &self,
        location: &str,
    ) -> Result<Option<LocationRecord>, GeocodeError> {
        let url = format!("{}/direct", self.config.base_url);
        let query = format!("{}, US", location);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("limit", "1"),
                ("appid", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let candidates: Vec<Place> = read_json(response).await?;
        match candidates.into_iter().next() {
            Some(place) => Ok(Some(LocationRecord::from_place(place))),
            None => {
                debug!(location, "direct search returned no candidates");
                Ok(None)
            }
        }
    }

    /// Resolve a five-digit ZIP code via the postal-code endpoint.
    ///
    /// The provider signals an unknown ZIP as HTTP 404; that is reported as
    /// `Ok(None)`, the same not-found shape the city path uses. Any other
    /// non-success status is a provider error.
    pub async fn lookup_zip(&self, zip: &str) -> Result<Option<LocationRecord>, GeocodeError> {
        let url = format!("{}/zip", self.config.base_url);
        let query = format!("{},US", zip);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("zip", query.as_str()),
                ("appid", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(zip, "zip lookup returned no match");
            return Ok(None);
        }

        let place: Place = read_json(response).await?;
        Ok(Some(LocationRecord::from_place(place)))
    }

    /// Classify one input and dispatch it down the matching lookup path
    pub async fn lookup(&self, raw: &str) -> Result<Option<LocationRecord>, GeocodeError> {
        match LookupPath::for_input(raw) {
            LookupPath::Zip => self.lookup_zip(raw).await,
            LookupPath::City => self.lookup_city(raw).await,
        }
    }

    /// Resolve an ordered batch of location inputs, strictly sequentially.
    ///
    /// Every input produces exactly one entry, in input order, carrying its
    /// outcome; nothing is silently dropped. Use
    /// [`found_records`](crate::types::found_records) to project the batch
    /// down to the successfully resolved records.
    pub async fn resolve_many(&self, locations: &[String]) -> Vec<ResolvedLocation> {
        let mut resolved = Vec::with_capacity(locations.len());

        for raw in locations {
            let path = LookupPath::for_input(raw);
            let result = match path {
                LookupPath::Zip => self.lookup_zip(raw).await,
                LookupPath::City => self.lookup_city(raw).await,
            };

            let outcome = match result {
                Ok(Some(record)) => LookupOutcome::Found(record),
                Ok(None) => {
                    info!(query = %raw, %path, "location not found");
                    LookupOutcome::NotFound
                }
                Err(e) => {
                    warn!(query = %raw, %path, error = %e, "lookup failed");
                    LookupOutcome::Failed(e)
                }
            };

            resolved.push(ResolvedLocation {
                query: raw.clone(),
                path,
                outcome,
            });
        }

        resolved
    }
}

/// Check the status and deserialize the body, preserving the provider's
/// error text on non-success responses
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GeocodeError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(GeocodeError::Provider { status, message });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::found_records;

    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::Json;
    use axum::routing::get;
    use axum::Router;
    use serde_json::{Value, json};

    const TEST_KEY: &str = "test-key";

    /// Per-endpoint hit counters for the stand-in provider
    #[derive(Clone, Default)]
    struct ProviderState {
        direct_hits: Arc<AtomicU32>,
        zip_hits: Arc<AtomicU32>,
    }

    async fn direct(
        State(state): State<ProviderState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        state.direct_hits.fetch_add(1, Ordering::SeqCst);

        if params.get("appid").map(String::as_str) != Some(TEST_KEY) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"cod": 401, "message": "Invalid API key"})),
            );
        }

        let body = match params.get("q").map(String::as_str) {
            Some("Savannah, GA, US") => json!([{
                "name": "Savannah",
                "local_names": {"en": "Savannah"},
                "lat": 32.0809,
                "lon": -81.0912,
                "country": "US",
                "state": "Georgia"
            }]),
            Some("Charlotte, NC, US") => json!([{
                "name": "Charlotte",
                "lat": 35.2271,
                "lon": -80.8431,
                "country": "US",
                "state": "North Carolina"
            }]),
            Some("Los Angeles, CA, US") => json!([{
                "name": "Los Angeles",
                "lat": 34.05,
                "lon": -118.24,
                "country": "US",
                "state": "California"
            }]),
            _ => json!([]),
        };
        (StatusCode::OK, Json(body))
    }

    async fn zip(
        State(state): State<ProviderState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        state.zip_hits.fetch_add(1, Ordering::SeqCst);

        match params.get("zip").map(String::as_str) {
            Some("31419,US") => (
                StatusCode::OK,
                Json(json!({
                    "zip": "31419",
                    "name": "Savannah",
                    "lat": 31.9947,
                    "lon": -81.2274,
                    "country": "US"
                })),
            ),
            Some("28277,US") => (
                StatusCode::OK,
                Json(json!({
                    "zip": "28277",
                    "name": "Charlotte",
                    "lat": 35.0513,
                    "lon": -80.8104,
                    "country": "US"
                })),
            ),
            _ => (
                StatusCode::NOT_FOUND,
                Json(json!({"cod": "404", "message": "not found"})),
            ),
        }
    }

    /// Serve the stand-in provider on a loopback port
    async fn spawn_provider() -> (String, ProviderState) {
        let state = ProviderState::default();
        let app = Router::new()
            .route("/direct", get(direct))
            .route("/zip", get(zip))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), state)
    }

    fn client_for(base_url: &str, api_key: &str) -> GeocodeClient {
        GeocodeClient::new(GeocodeConfig::new(api_key).with_base_url(base_url)).unwrap()
    }

    #[tokio::test]
    async fn city_lookup_maps_first_candidate() {
        let (base_url, _) = spawn_provider().await;
        let client = client_for(&base_url, TEST_KEY);

        let record = client
            .lookup_city("Los Angeles, CA")
            .await
            .unwrap()
            .expect("should resolve");

        assert_eq!(record.name, "Los Angeles");
        assert_eq!(record.state, "California");
        assert_eq!(record.country, "US");
        assert_eq!(record.latitude, 34.05);
        assert_eq!(record.longitude, -118.24);
    }

    #[tokio::test]
    async fn city_lookup_empty_result_is_not_found() {
        let (base_url, _) = spawn_provider().await;
        let client = client_for(&base_url, TEST_KEY);

        let result = client.lookup_city("NonExistentCity, ZZ").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn zip_lookup_maps_single_object() {
        let (base_url, _) = spawn_provider().await;
        let client = client_for(&base_url, TEST_KEY);

        let record = client
            .lookup_zip("31419")
            .await
            .unwrap()
            .expect("should resolve");

        assert_eq!(record.name, "Savannah");
        assert_eq!(record.state, "N/A");
        assert_eq!(record.country, "US");
    }

    #[tokio::test]
    async fn zip_lookup_404_is_not_found() {
        let (base_url, _) = spawn_provider().await;
        let client = client_for(&base_url, TEST_KEY);

        let result = client.lookup_zip("00000").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn bad_credential_is_a_provider_error() {
        let (base_url, _) = spawn_provider().await;
        let client = client_for(&base_url, "wrong-key");

        let err = client.lookup_city("Savannah, GA").await.unwrap_err();
        match err {
            GeocodeError::Provider { status, .. } => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
            }
            other => panic!("expected provider error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn mixed_batch_routes_each_input_once() {
        let (base_url, state) = spawn_provider().await;
        let client = client_for(&base_url, TEST_KEY);

        let inputs: Vec<String> = ["Savannah, GA", "31419", "Charlotte, NC", "28277"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let resolved = client.resolve_many(&inputs).await;

        assert_eq!(state.direct_hits.load(Ordering::SeqCst), 2);
        assert_eq!(state.zip_hits.load(Ordering::SeqCst), 2);

        let paths: Vec<LookupPath> = resolved.iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                LookupPath::City,
                LookupPath::Zip,
                LookupPath::City,
                LookupPath::Zip
            ]
        );

        let records = found_records(&resolved);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].name, "Savannah");
        assert_eq!(records[0].state, "Georgia");
        assert_eq!(records[1].name, "Savannah");
        assert_eq!(records[2].name, "Charlotte");
        assert_eq!(records[2].state, "North Carolina");
        assert_eq!(records[3].name, "Charlotte");
    }

    #[tokio::test]
    async fn batch_keeps_per_input_outcomes_and_drops_misses_from_records() {
        let (base_url, _) = spawn_provider().await;
        let client = client_for(&base_url, TEST_KEY);

        let inputs: Vec<String> = ["Savannah, GA", "NonExistentCity, ZZ", "00000", "28277"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let resolved = client.resolve_many(&inputs).await;

        assert_eq!(resolved.len(), 4);
        assert!(resolved[0].outcome.is_found());
        assert!(matches!(resolved[1].outcome, LookupOutcome::NotFound));
        assert!(matches!(resolved[2].outcome, LookupOutcome::NotFound));
        assert!(resolved[3].outcome.is_found());

        let records = found_records(&resolved);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Savannah");
        assert_eq!(records[1].name, "Charlotte");
    }

    #[tokio::test]
    async fn repeated_lookup_is_idempotent() {
        let (base_url, _) = spawn_provider().await;
        let client = client_for(&base_url, TEST_KEY);

        let first = client.lookup("31419").await.unwrap();
        let second = client.lookup("31419").await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_some());
    }
}
