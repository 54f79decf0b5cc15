//! Simulator backend HTTP client

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Result, SimClientError};
use crate::types::*;

/// Default request timeout
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse a base URL so that relative endpoint paths append to it.
///
/// `http://host/api` and `http://host/api/` both resolve `simulation/start`
/// to `http://host/api/simulation/start`.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Percent-encode a path segment
pub(crate) fn encode_path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

/// Simulator backend REST client
///
/// Covers the simulation lifecycle, statistics, the per-device data type
/// catalog and ad-hoc sensor generation.
#[derive(Debug, Clone)]
pub struct SimulatorClient {
    client: Client,
    base_url: Url,
}

impl SimulatorClient {
    /// Create a new simulator client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the backend API (e.g., "http://localhost:3000/api")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new simulator client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = parse_base_url(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    // =========================================================================
    // Simulation Lifecycle
    // =========================================================================

    /// Start a simulation for a person.
    ///
    /// An empty `device_ids` asks the backend to simulate every device the
    /// person owns.
    #[instrument(skip(self))]
    pub async fn start_simulation(
        &self,
        person_id: &str,
        device_ids: &[String],
    ) -> Result<SimulationResponse> {
        let url = self.endpoint("simulation/start")?;
        let request = StartSimulationRequest {
            elderly_person_id: person_id.to_string(),
            device_ids: device_ids.to_vec(),
        };
        debug!(devices = device_ids.len(), "Starting simulation via {}", url);

        let response = self.client.post(url).json(&request).send().await?;
        let body: SimulationResponse = self.handle_response(response).await?;

        if body.simulation_id.is_none() {
            return Err(SimClientError::ParseError(
                "start response carried no simulationId".to_string(),
            ));
        }
        Ok(body)
    }

    /// Stop a running simulation
    #[instrument(skip(self))]
    pub async fn stop_simulation(&self, simulation_id: &str) -> Result<SimulationResponse> {
        let mut url = self.endpoint("simulation/stop")?;
        url.query_pairs_mut()
            .append_pair("simulationId", simulation_id);

        let response = self.client.post(url).send().await?;
        self.handle_response(response).await
    }

    /// Query whether a simulation is still running
    #[instrument(skip(self))]
    pub async fn simulation_status(&self, simulation_id: &str) -> Result<SimulationResponse> {
        let url = self.endpoint(&format!(
            "simulation/status/{}",
            encode_path_segment(simulation_id)
        ))?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Fetch live statistics of a simulation
    #[instrument(skip(self))]
    pub async fn simulation_statistics(&self, simulation_id: &str) -> Result<StatisticsSnapshot> {
        let url = self.endpoint(&format!(
            "simulation/statistics/{}",
            encode_path_segment(simulation_id)
        ))?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Devices & Data Types
    // =========================================================================

    /// List devices of a person, resolved server-side
    #[instrument(skip(self))]
    pub async fn list_devices(&self, person_id: &str) -> Result<Vec<Device>> {
        let url = self.endpoint(&format!("devices/{}", encode_path_segment(person_id)))?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// List the sensor data types a device supports
    #[instrument(skip(self))]
    pub async fn list_data_types(&self, device_id: &str) -> Result<Vec<DataTypeCatalogEntry>> {
        let url = self.endpoint(&format!("data-types/{}", encode_path_segment(device_id)))?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// List geofence places of a person
    #[instrument(skip(self))]
    pub async fn list_geofence_places(&self, person_id: &str) -> Result<Vec<GeofencePlace>> {
        let url = self.endpoint(&format!(
            "geofence-places/{}",
            encode_path_segment(person_id)
        ))?;

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Ad-hoc Generation
    // =========================================================================

    /// Generate a single sensor value for a device
    #[instrument(skip(self, request), fields(device = %request.device_id, data_type = %request.data_type))]
    pub async fn generate_sensor_data(
        &self,
        request: &SensorGenerateRequest,
    ) -> Result<SensorGenerateResponse> {
        let url = self.endpoint("sensor/generate")?;

        let response = self.client.post(url).json(request).send().await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Handle response and deserialize JSON
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| SimClientError::ParseError(e.to_string()))
        } else {
            Err(error_from_response(response, status).await)
        }
    }
}

/// Build an error from a failed response, preferring the body's message
pub(crate) async fn error_from_response(
    response: reqwest::Response,
    status: StatusCode,
) -> SimClientError {
    let message = match response.json::<ErrorResponse>().await {
        Ok(err) => err
            .into_message()
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    };

    match status {
        StatusCode::NOT_FOUND => SimClientError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => SimClientError::Timeout,
        _ => SimClientError::server_error(status.as_u16(), message),
    }
}
