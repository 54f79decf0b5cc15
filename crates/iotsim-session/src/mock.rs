//! In-memory collaborators for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use iotsim_client::{
    DataTypeCatalogEntry, Device, Person, Result, SensorGenerateRequest, SensorGenerateResponse,
    SimClientError, SimulationResponse, StatisticsSnapshot, Subject,
};
use parking_lot::Mutex;

use crate::api::{DirectoryApi, SimulationApi};
use crate::selection::device;

pub(crate) fn person(id: &str, email: &str) -> Person {
    Person {
        id: id.to_string(),
        email: email.to_string(),
        display_name: None,
    }
}

fn unavailable() -> SimClientError {
    SimClientError::server_error(503, "Service unavailable")
}

// =============================================================================
// Directory
// =============================================================================

#[derive(Default)]
pub(crate) struct MockDirectory {
    people: Mutex<Vec<Person>>,
    subjects: Mutex<HashMap<String, Vec<Subject>>>,
    devices: Mutex<HashMap<String, Vec<Device>>>,
    fail_people: AtomicBool,
    fail_subjects: AtomicBool,
    fail_devices: AtomicBool,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_person(self, id: &str, email: &str) -> Self {
        self.people.lock().push(person(id, email));
        self
    }

    pub fn with_subject(self, person_id: &str, subject_id: &str) -> Self {
        self.subjects
            .lock()
            .entry(person_id.to_string())
            .or_default()
            .push(Subject {
                id: subject_id.to_string(),
                user_id: Some(person_id.to_string()),
            });
        self
    }

    pub fn with_devices(self, subject_id: &str, ids: &[&str]) -> Self {
        self.set_devices(subject_id, ids);
        self
    }

    pub fn set_devices(&self, subject_id: &str, ids: &[&str]) {
        let devices = ids.iter().map(|id| device(id)).collect();
        self.devices.lock().insert(subject_id.to_string(), devices);
    }

    pub fn set_device_list(&self, subject_id: &str, devices: Vec<Device>) {
        self.devices.lock().insert(subject_id.to_string(), devices);
    }

    pub fn fail_people(&self, fail: bool) {
        self.fail_people.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subjects(&self, fail: bool) {
        self.fail_subjects.store(fail, Ordering::SeqCst);
    }

    pub fn fail_devices(&self, fail: bool) {
        self.fail_devices.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DirectoryApi for MockDirectory {
    async fn list_people(&self) -> Result<Vec<Person>> {
        self.calls.lock().push("list_people".to_string());
        if self.fail_people.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.people.lock().clone())
    }

    async fn find_subjects(&self, person_id: &str) -> Result<Vec<Subject>> {
        self.calls.lock().push(format!("find_subjects:{}", person_id));
        if self.fail_subjects.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .subjects
            .lock()
            .get(person_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_devices(&self, subject_id: &str) -> Result<Vec<Device>> {
        self.calls.lock().push(format!("list_devices:{}", subject_id));
        if self.fail_devices.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .devices
            .lock()
            .get(subject_id)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Simulation backend
// =============================================================================

#[derive(Default)]
pub(crate) struct MockSimulation {
    started: AtomicUsize,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
    hang_stop: AtomicBool,
    fail_stats: AtomicBool,
    fail_catalog: AtomicBool,
    stopped_remotely: AtomicBool,
    catalogs: Mutex<HashMap<String, Vec<DataTypeCatalogEntry>>>,
    generate_response: Mutex<Option<SensorGenerateResponse>>,
    generate_error: Mutex<Option<(u16, String)>>,
    pub start_requests: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    pub stop_requests: Arc<Mutex<Vec<String>>>,
    pub stats_calls: Arc<AtomicUsize>,
    pub catalog_calls: Arc<Mutex<Vec<String>>>,
    pub generate_requests: Arc<Mutex<Vec<SensorGenerateRequest>>>,
}

impl MockSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(self, device_id: &str, data_types: &[&str]) -> Self {
        let entries = data_types
            .iter()
            .map(|dt| DataTypeCatalogEntry {
                data_type: dt.to_string(),
                display_name: dt.replace('_', " "),
                unit: String::new(),
                min_value: None,
                max_value: None,
                value_type: None,
                config_type: None,
                config: None,
                frequency_per_day: None,
            })
            .collect();
        self.catalogs.lock().insert(device_id.to_string(), entries);
        self
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    /// Make stop requests never complete
    pub fn hang_stop(&self, hang: bool) {
        self.hang_stop.store(hang, Ordering::SeqCst);
    }

    pub fn fail_stats(&self, fail: bool) {
        self.fail_stats.store(fail, Ordering::SeqCst);
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    /// Make status queries report every simulation as stopped
    pub fn stop_remotely(&self) {
        self.stopped_remotely.store(true, Ordering::SeqCst);
    }

    pub fn respond_to_generate(&self, response: SensorGenerateResponse) {
        *self.generate_response.lock() = Some(response);
    }

    pub fn fail_generate(&self, status: u16, message: &str) {
        *self.generate_error.lock() = Some((status, message.to_string()));
    }

    pub fn stats_count(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimulationApi for MockSimulation {
    async fn start_simulation(
        &self,
        person_id: &str,
        device_ids: &[String],
    ) -> Result<SimulationResponse> {
        self.start_requests
            .lock()
            .push((person_id.to_string(), device_ids.to_vec()));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(SimClientError::server_error(
                400,
                "No devices found for simulation",
            ));
        }
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SimulationResponse {
            simulation_id: Some(format!("sim-{}", n)),
            status: "running".to_string(),
            message: "Simulation started successfully".to_string(),
            elderly_person_id: Some(person_id.to_string()),
            device_count: Some(device_ids.len() as u32),
            data_type_count: Some(0),
        })
    }

    async fn stop_simulation(&self, simulation_id: &str) -> Result<SimulationResponse> {
        self.stop_requests.lock().push(simulation_id.to_string());
        if self.hang_stop.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(SimulationResponse {
            simulation_id: Some(simulation_id.to_string()),
            status: "stopped".to_string(),
            message: "Simulation stopped successfully".to_string(),
            elderly_person_id: None,
            device_count: None,
            data_type_count: None,
        })
    }

    async fn simulation_status(&self, simulation_id: &str) -> Result<SimulationResponse> {
        let status = if self.stopped_remotely.load(Ordering::SeqCst) {
            "stopped"
        } else {
            "running"
        };
        Ok(SimulationResponse {
            simulation_id: Some(simulation_id.to_string()),
            status: status.to_string(),
            message: String::new(),
            elderly_person_id: None,
            device_count: None,
            data_type_count: None,
        })
    }

    async fn simulation_statistics(&self, simulation_id: &str) -> Result<StatisticsSnapshot> {
        let n = self.stats_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_stats.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(snapshot(simulation_id, n as u64))
    }

    async fn list_data_types(&self, device_id: &str) -> Result<Vec<DataTypeCatalogEntry>> {
        self.catalog_calls.lock().push(device_id.to_string());
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .catalogs
            .lock()
            .get(device_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn generate_sensor_data(
        &self,
        request: &SensorGenerateRequest,
    ) -> Result<SensorGenerateResponse> {
        self.generate_requests.lock().push(request.clone());
        if let Some((status, message)) = self.generate_error.lock().clone() {
            return Err(SimClientError::server_error(status, message));
        }
        Ok(self
            .generate_response
            .lock()
            .clone()
            .unwrap_or_else(|| SensorGenerateResponse {
                success: true,
                message: None,
                data_type: Some(request.data_type.clone()),
                display_name: None,
                value: Some(serde_json::json!(1)),
                unit: None,
                locations: None,
            }))
    }
}

pub(crate) fn snapshot(simulation_id: &str, generated: u64) -> StatisticsSnapshot {
    StatisticsSnapshot {
        simulation_id: simulation_id.to_string(),
        start_time: None,
        last_updated_time: None,
        total_generated: generated,
        total_successful: generated,
        total_failed: 0,
        elapsed_seconds: generated * 2,
        success_rate: 100.0,
        rate_per_minute: 30.0,
        per_device: None,
        per_data_type: None,
    }
}
