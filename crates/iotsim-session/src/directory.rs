//! Directory loading: person → subject → devices, and per-device catalogs

use std::sync::Arc;

use iotsim_client::{DataTypeCatalogEntry, Device, Person, SimClientError};
use tracing::{debug, info, warn};

use crate::api::{DirectoryApi, SimulationApi};
use crate::error::remote_detail;

/// Result of a list fetch.
///
/// Failures never propagate: `items` is empty and `error` carries the
/// failure signal for the caller to show out of band.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub error: Option<String>,
}

impl<T> Listing<T> {
    fn ok(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    fn failed(error: SimClientError) -> Self {
        Self {
            items: Vec::new(),
            error: Some(remote_detail(&error)),
        }
    }
}

/// Resolves persons to devices and devices to data type catalogs
#[derive(Clone)]
pub struct DirectoryLoader {
    directory: Arc<dyn DirectoryApi>,
    catalog: Arc<dyn SimulationApi>,
}

impl DirectoryLoader {
    pub fn new(directory: Arc<dyn DirectoryApi>, catalog: Arc<dyn SimulationApi>) -> Self {
        Self { directory, catalog }
    }

    /// Load every known person
    pub async fn list_people(&self) -> Listing<Person> {
        match self.directory.list_people().await {
            Ok(people) => {
                debug!(count = people.len(), "People loaded");
                Listing::ok(people)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load people");
                Listing::failed(e)
            }
        }
    }

    /// Two-phase device lookup for `person`.
    ///
    /// The person is first resolved to its subject records; the devices of
    /// the first subject are then fetched. No subject means no devices.
    pub async fn load_devices(&self, person: &Person) -> Listing<Device> {
        let subjects = match self.directory.find_subjects(&person.id).await {
            Ok(subjects) => subjects,
            Err(e) => {
                warn!(person = %person.id, error = %e, "Failed to resolve subject");
                return Listing::failed(e);
            }
        };

        let Some(subject) = subjects.first() else {
            info!(person = %person.id, "No subject record for person");
            return Listing::ok(Vec::new());
        };

        match self.directory.list_devices(&subject.id).await {
            Ok(devices) => {
                info!(
                    person = %person.id,
                    subject = %subject.id,
                    count = devices.len(),
                    "Devices loaded"
                );
                Listing::ok(devices)
            }
            Err(e) => {
                warn!(subject = %subject.id, error = %e, "Failed to load devices");
                Listing::failed(e)
            }
        }
    }

    /// Data types supported by a device; empty on failure
    pub async fn load_data_types(&self, device_id: &str) -> Vec<DataTypeCatalogEntry> {
        match self.catalog.list_data_types(device_id).await {
            Ok(catalog) => {
                debug!(device = device_id, count = catalog.len(), "Catalog loaded");
                catalog
            }
            Err(e) => {
                warn!(device = device_id, error = %e, "Failed to load data types");
                Vec::new()
            }
        }
    }
}
