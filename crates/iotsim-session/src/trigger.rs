//! One-off sensor generation for a single device

use std::collections::HashMap;
use std::sync::Arc;

use iotsim_client::{Device, SensorGenerateRequest, SensorGenerateResponse};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::SimulationApi;

const GENERATION_FAILED: &str = "Failed to generate sensor data";

/// Result of an ad-hoc generation, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub data_type: String,
    pub success: bool,
    pub message: String,
}

/// Issues ad-hoc generation requests and tracks which data types are in flight
#[derive(Clone)]
pub struct SensorTrigger {
    api: Arc<dyn SimulationApi>,
    in_flight: Arc<Mutex<HashMap<String, usize>>>,
}

/// Counts one outstanding request for a data type until dropped
struct InFlight {
    counts: Arc<Mutex<HashMap<String, usize>>>,
    data_type: String,
}

impl InFlight {
    fn enter(counts: &Arc<Mutex<HashMap<String, usize>>>, data_type: &str) -> Self {
        *counts.lock().entry(data_type.to_string()).or_insert(0) += 1;
        Self {
            counts: counts.clone(),
            data_type: data_type.to_string(),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut counts = self.counts.lock();
        if let Some(n) = counts.get_mut(&self.data_type) {
            *n -= 1;
            if *n == 0 {
                counts.remove(&self.data_type);
            }
        }
    }
}

impl SensorTrigger {
    pub fn new(api: Arc<dyn SimulationApi>) -> Self {
        Self {
            api,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a request for `data_type` is outstanding
    pub fn is_in_flight(&self, data_type: &str) -> bool {
        self.in_flight.lock().contains_key(data_type)
    }

    /// Generate one data point of `data_type` for `device`.
    ///
    /// Never fails: transport and server failures become an unsuccessful
    /// outcome carrying a displayable message.
    pub async fn generate(&self, device: &Device, data_type: &str) -> GenerationOutcome {
        let _marker = InFlight::enter(&self.in_flight, data_type);

        let request = SensorGenerateRequest {
            device_id: device.id.clone(),
            data_type: data_type.to_string(),
            location: device.location.clone(),
        };

        match self.api.generate_sensor_data(&request).await {
            Ok(response) => {
                let outcome = describe(data_type, response);
                if outcome.success {
                    info!(device = %device.id, data_type, "{}", outcome.message);
                } else {
                    warn!(device = %device.id, data_type, "Generation rejected: {}", outcome.message);
                }
                outcome
            }
            Err(e) => {
                warn!(device = %device.id, data_type, error = %e, "Generation request failed");
                GenerationOutcome {
                    data_type: data_type.to_string(),
                    success: false,
                    message: e.detail().unwrap_or(GENERATION_FAILED).to_string(),
                }
            }
        }
    }
}

fn describe(data_type: &str, response: SensorGenerateResponse) -> GenerationOutcome {
    let data_type = response.data_type.clone().unwrap_or_else(|| data_type.to_string());

    if !response.success {
        let message = response
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERATION_FAILED.to_string());
        return GenerationOutcome {
            data_type,
            success: false,
            message,
        };
    }

    let message = match response.locations.as_deref() {
        Some(locations) if !locations.is_empty() => {
            let names: Vec<&str> = locations.iter().map(|l| l.geofence_name.as_str()).collect();
            format!(
                "Generated {} location(s): {}",
                locations.len(),
                names.join(", ")
            )
        }
        _ => {
            let label = response.display_name.as_deref().unwrap_or(&data_type);
            describe_value(label, response.value.as_ref(), response.unit.as_deref())
        }
    };

    GenerationOutcome {
        data_type,
        success: true,
        message,
    }
}

fn describe_value(label: &str, value: Option<&Value>, unit: Option<&str>) -> String {
    let value = match value {
        None | Some(Value::Null) => return format!("{}: generated", label),
        Some(v) => v,
    };

    if let Value::Object(map) = value {
        let lat = map.get("latitude").and_then(Value::as_f64);
        let lon = map.get("longitude").and_then(Value::as_f64);
        return match (lat, lon) {
            (Some(lat), Some(lon)) => format!("{}: lat {:.6}, lon {:.6}", label, lat, lon),
            _ => format!("{}: {}", label, value),
        };
    }
    if value.is_array() {
        return format!("{}: {}", label, value);
    }

    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match unit.filter(|u| !u.is_empty()) {
        Some(unit) => format!("{}: {} {}", label, text, unit),
        None => format!("{}: {}", label, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSimulation;
    use crate::selection::device;
    use iotsim_client::GeneratedLocation;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn success(value: Value, unit: Option<&str>) -> SensorGenerateResponse {
        SensorGenerateResponse {
            success: true,
            message: None,
            data_type: None,
            display_name: Some("Heart Rate".to_string()),
            value: Some(value),
            unit: unit.map(str::to_string),
            locations: None,
        }
    }

    fn location(name: &str) -> GeneratedLocation {
        GeneratedLocation {
            geofence_name: name.to_string(),
            latitude: 1.0,
            longitude: 2.0,
            radius: None,
        }
    }

    #[test]
    fn test_scalar_with_unit() {
        let outcome = describe("heart_rate", success(json!(72), Some("bpm")));
        assert!(outcome.success);
        assert_eq!(outcome.message, "Heart Rate: 72 bpm");
        assert_eq!(outcome.data_type, "heart_rate");
    }

    #[test]
    fn test_string_value_without_unit() {
        let outcome = describe("mood", success(json!("calm"), None));
        assert_eq!(outcome.message, "Heart Rate: calm");
    }

    #[test]
    fn test_coordinates() {
        let outcome = describe(
            "gps",
            success(json!({"latitude": 12.3456789, "longitude": 98.7654321}), None),
        );
        assert_eq!(outcome.message, "Heart Rate: lat 12.345679, lon 98.765432");
    }

    #[test]
    fn test_other_structured_value_is_json() {
        let outcome = describe("bp", success(json!({"systolic": 120}), Some("mmHg")));
        assert_eq!(outcome.message, r#"Heart Rate: {"systolic":120}"#);
    }

    #[test]
    fn test_locations() {
        let mut response = success(Value::Null, None);
        response.locations = Some(vec![location("Home"), location("Park")]);
        let outcome = describe("location", response);
        assert_eq!(outcome.message, "Generated 2 location(s): Home, Park");
    }

    #[test]
    fn test_logical_failure_echoes_server() {
        let response = SensorGenerateResponse {
            success: false,
            message: Some("Unsupported data type".to_string()),
            data_type: None,
            display_name: None,
            value: None,
            unit: None,
            locations: None,
        };
        let outcome = describe("x", response);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Unsupported data type");
    }

    #[tokio::test]
    async fn test_request_carries_device_location() {
        let api = Arc::new(MockSimulation::new());
        let trigger = SensorTrigger::new(api.clone());

        let mut d = device("d1");
        d.location = Some("kitchen".to_string());
        let outcome = trigger.generate(&d, "temperature").await;
        assert!(outcome.success);

        let requests = api.generate_requests.lock();
        assert_eq!(requests[0].device_id, "d1");
        assert_eq!(requests[0].data_type, "temperature");
        assert_eq!(requests[0].location.as_deref(), Some("kitchen"));
    }

    #[tokio::test]
    async fn test_transport_failure_uses_detail() {
        let api = Arc::new(MockSimulation::new());
        api.fail_generate(500, "Device offline");
        let trigger = SensorTrigger::new(api.clone());

        let outcome = trigger.generate(&device("d1"), "heart_rate").await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Device offline");
        assert!(!trigger.is_in_flight("heart_rate"));
    }

    #[test]
    fn test_overlapping_requests_keep_marker() {
        let trigger = SensorTrigger::new(Arc::new(MockSimulation::new()));

        let first = InFlight::enter(&trigger.in_flight, "heart_rate");
        let second = InFlight::enter(&trigger.in_flight, "heart_rate");
        let other = InFlight::enter(&trigger.in_flight, "steps");

        drop(first);
        assert!(trigger.is_in_flight("heart_rate"));

        drop(second);
        assert!(!trigger.is_in_flight("heart_rate"));
        assert!(trigger.is_in_flight("steps"));

        drop(other);
        assert!(trigger.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_without_detail() {
        let api = Arc::new(MockSimulation::new());
        api.fail_generate(500, "");
        let trigger = SensorTrigger::new(api);

        let outcome = trigger.generate(&device("d1"), "heart_rate").await;
        assert_eq!(outcome.message, "Failed to generate sensor data");
    }
}
