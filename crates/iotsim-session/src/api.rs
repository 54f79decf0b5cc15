//! Collaborator traits for the remote services the session drives
//!
//! The session logic only talks to these traits. The HTTP clients from
//! `iotsim-client` implement them; tests substitute in-memory mocks.

use async_trait::async_trait;
use iotsim_client::{
    DataTypeCatalogEntry, Device, DirectoryClient, Person, Result, SensorGenerateRequest,
    SensorGenerateResponse, SimulationResponse, SimulatorClient, StatisticsSnapshot, Subject,
};

/// Simulator backend operations
#[async_trait]
pub trait SimulationApi: Send + Sync {
    /// Start a simulation; empty `device_ids` means all devices of the person
    async fn start_simulation(
        &self,
        person_id: &str,
        device_ids: &[String],
    ) -> Result<SimulationResponse>;

    async fn stop_simulation(&self, simulation_id: &str) -> Result<SimulationResponse>;

    async fn simulation_status(&self, simulation_id: &str) -> Result<SimulationResponse>;

    async fn simulation_statistics(&self, simulation_id: &str) -> Result<StatisticsSnapshot>;

    async fn list_data_types(&self, device_id: &str) -> Result<Vec<DataTypeCatalogEntry>>;

    async fn generate_sensor_data(
        &self,
        request: &SensorGenerateRequest,
    ) -> Result<SensorGenerateResponse>;
}

/// Read-only person/device directory
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn list_people(&self) -> Result<Vec<Person>>;

    /// Subject records linked to a person identity
    async fn find_subjects(&self, person_id: &str) -> Result<Vec<Subject>>;

    /// Devices owned by a subject
    async fn list_devices(&self, subject_id: &str) -> Result<Vec<Device>>;
}

#[async_trait]
impl SimulationApi for SimulatorClient {
    async fn start_simulation(
        &self,
        person_id: &str,
        device_ids: &[String],
    ) -> Result<SimulationResponse> {
        SimulatorClient::start_simulation(self, person_id, device_ids).await
    }

    async fn stop_simulation(&self, simulation_id: &str) -> Result<SimulationResponse> {
        SimulatorClient::stop_simulation(self, simulation_id).await
    }

    async fn simulation_status(&self, simulation_id: &str) -> Result<SimulationResponse> {
        SimulatorClient::simulation_status(self, simulation_id).await
    }

    async fn simulation_statistics(&self, simulation_id: &str) -> Result<StatisticsSnapshot> {
        SimulatorClient::simulation_statistics(self, simulation_id).await
    }

    async fn list_data_types(&self, device_id: &str) -> Result<Vec<DataTypeCatalogEntry>> {
        SimulatorClient::list_data_types(self, device_id).await
    }

    async fn generate_sensor_data(
        &self,
        request: &SensorGenerateRequest,
    ) -> Result<SensorGenerateResponse> {
        SimulatorClient::generate_sensor_data(self, request).await
    }
}

#[async_trait]
impl DirectoryApi for DirectoryClient {
    async fn list_people(&self) -> Result<Vec<Person>> {
        DirectoryClient::list_people(self).await
    }

    async fn find_subjects(&self, person_id: &str) -> Result<Vec<Subject>> {
        DirectoryClient::find_subjects(self, person_id).await
    }

    async fn list_devices(&self, subject_id: &str) -> Result<Vec<Device>> {
        DirectoryClient::list_devices(self, subject_id).await
    }
}
