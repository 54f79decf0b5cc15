//! Request and response types for the simulator backend and directory

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Directory Types
// =============================================================================

/// A monitored person (a row of the `profiles` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub email: String,
    /// Human-readable name
    #[serde(
        default,
        rename = "full_name",
        alias = "fullName",
        alias = "displayName"
    )]
    pub display_name: Option<String>,
}

impl Person {
    /// Name to show to the operator, falling back to the email
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Subject record resolved from a person (a row of `elderly_persons`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A simulated IoT device.
///
/// The simulator backend speaks camelCase while the directory returns
/// snake_case rows, so both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(rename = "deviceName", alias = "device_name")]
    pub name: String,
    /// Hardware identifier (e.g. "KT001")
    #[serde(rename = "deviceId", alias = "device_id")]
    pub external_device_id: String,
    /// Ingest credential of the device
    #[serde(default, rename = "apiKey", alias = "api_key")]
    pub credential_key: String,
    #[serde(
        default,
        rename = "deviceType",
        alias = "device_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "elderlyPersonId",
        alias = "elderly_person_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A geofenced place a person visits (home, hospital, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofencePlace {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub radius_meters: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// =============================================================================
// Data Type Catalog
// =============================================================================

/// Descriptive metadata for one sensor kind supported by a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeCatalogEntry {
    /// Data type key (e.g. "heart_rate")
    pub data_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// "number", "string", "boolean" or "object"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// "range" or "enum"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_type: Option<String>,
    /// Raw generation config (e.g. `{"min": 60, "max": 100}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_per_day: Option<u32>,
}

impl DataTypeCatalogEntry {
    /// Lower bound, from the flat field or the generation config
    pub fn min(&self) -> Option<f64> {
        self.min_value.or_else(|| self.config_number("min"))
    }

    /// Upper bound, from the flat field or the generation config
    pub fn max(&self) -> Option<f64> {
        self.max_value.or_else(|| self.config_number("max"))
    }

    fn config_number(&self, key: &str) -> Option<f64> {
        self.config.as_ref()?.get(key)?.as_f64()
    }
}

// =============================================================================
// Simulation Types
// =============================================================================

/// Start request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSimulationRequest {
    pub elderly_person_id: String,
    /// Empty means "all devices owned by the person"
    pub device_ids: Vec<String>,
}

/// Response of start, stop and status calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    #[serde(default)]
    pub simulation_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elderly_person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type_count: Option<u32>,
}

impl SimulationResponse {
    /// Whether the server reports the simulation as running
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }
}

/// Live statistics for a running simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub simulation_id: String,
    /// Epoch millis of the simulation start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Epoch millis of the last recorded data point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<i64>,
    #[serde(default, rename = "totalDataPointsGenerated", alias = "totalGenerated")]
    pub total_generated: u64,
    #[serde(default, rename = "totalDataPointsSuccessful", alias = "totalSuccessful")]
    pub total_successful: u64,
    #[serde(default, rename = "totalDataPointsFailed", alias = "totalFailed")]
    pub total_failed: u64,
    #[serde(default, rename = "elapsedTimeSeconds", alias = "elapsedSeconds")]
    pub elapsed_seconds: u64,
    /// Percentage of successful data points (0-100)
    #[serde(default)]
    pub success_rate: f64,
    /// Successful data points per minute
    #[serde(default, rename = "dataPointsPerMinute", alias = "ratePerMinute")]
    pub rate_per_minute: f64,
    #[serde(
        default,
        rename = "deviceStats",
        alias = "perDeviceBreakdown",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_device: Option<BTreeMap<String, DeviceStatistics>>,
    #[serde(
        default,
        rename = "dataTypeStats",
        alias = "perDataTypeBreakdown",
        skip_serializing_if = "Option::is_none"
    )]
    pub per_data_type: Option<BTreeMap<String, DataTypeStatistics>>,
}

/// Per-device counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatistics {
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub total_count: u64,
}

/// Per-data-type counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeStatistics {
    pub data_type: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub total_count: u64,
}

// =============================================================================
// Ad-hoc Generation Types
// =============================================================================

/// One-off sensor generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorGenerateRequest {
    pub device_id: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Response of an ad-hoc generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorGenerateResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Scalar or structured value (e.g. `{"latitude": .., "longitude": ..}`)
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Present for multi-location generation
    #[serde(default)]
    pub locations: Option<Vec<GeneratedLocation>>,
}

fn default_true() -> bool {
    true
}

/// A generated location record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLocation {
    #[serde(default, alias = "name", alias = "geofence")]
    pub geofence_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "radiusMeters")]
    pub radius: Option<f64>,
}

// =============================================================================
// Error Types
// =============================================================================

/// Error response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.is_empty())
    }
}
