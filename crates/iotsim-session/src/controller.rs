//! The session facade
//!
//! [`SessionController`] owns the selection, the persisted preferences, the
//! simulation session and the ad-hoc trigger, and keeps them consistent:
//! every selection change is persisted and re-evaluates the single-device
//! catalog.

use std::sync::Arc;

use iotsim_client::{DataTypeCatalogEntry, Device, Person, StatisticsSnapshot};
use tracing::{debug, info, instrument};

use crate::api::{DirectoryApi, SimulationApi};
use crate::config::SessionConfig;
use crate::directory::DirectoryLoader;
use crate::error::SessionError;
use crate::preferences::{restore_selection, PreferenceStore, Preferences, PreferencesAdapter};
use crate::selection::SelectionStore;
use crate::simulation::{SimulationController, SimulationSession, SimulationStatus};
use crate::trigger::{GenerationOutcome, SensorTrigger};

/// Operator session state for one person at a time
pub struct SessionController {
    loader: DirectoryLoader,
    preferences: PreferencesAdapter,
    simulation: SimulationController,
    trigger: SensorTrigger,

    people: Vec<Person>,
    people_error: Option<String>,
    person: Option<Person>,
    selection: SelectionStore,
    directory_error: Option<String>,
    saved: Option<Preferences>,

    catalog: Vec<DataTypeCatalogEntry>,
    catalog_device: Option<String>,
    generation: Option<GenerationOutcome>,
    message: Option<String>,
}

impl SessionController {
    pub fn new(
        directory: Arc<dyn DirectoryApi>,
        simulation: Arc<dyn SimulationApi>,
        store: Arc<dyn PreferenceStore>,
        config: SessionConfig,
    ) -> Self {
        let preferences = PreferencesAdapter::new(store);
        let saved = preferences.load();
        if let Some(prefs) = &saved {
            debug!(email = %prefs.email, "Loaded saved preferences");
        }

        Self {
            loader: DirectoryLoader::new(directory, simulation.clone()),
            preferences,
            simulation: SimulationController::new(simulation.clone(), &config),
            trigger: SensorTrigger::new(simulation),
            people: Vec::new(),
            people_error: None,
            person: None,
            selection: SelectionStore::new(),
            directory_error: None,
            saved,
            catalog: Vec::new(),
            catalog_device: None,
            generation: None,
            message: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Failure of the last people fetch
    pub fn people_error(&self) -> Option<&str> {
        self.people_error.as_deref()
    }

    pub fn active_person(&self) -> Option<&Person> {
        self.person.as_ref()
    }

    pub fn devices(&self) -> &[Device] {
        self.selection.devices()
    }

    /// Failure of the last device fetch
    pub fn directory_error(&self) -> Option<&str> {
        self.directory_error.as_deref()
    }

    pub fn is_selected(&self, device_id: &str) -> bool {
        self.selection.is_selected(device_id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.selected_ids()
    }

    pub fn single_selected_device(&self) -> Option<&Device> {
        self.selection.single_selected_device()
    }

    /// Catalog of the single selected device; empty otherwise
    pub fn catalog(&self) -> &[DataTypeCatalogEntry] {
        &self.catalog
    }

    /// Result of the last ad-hoc generation for the single selected device
    pub fn last_generation(&self) -> Option<&GenerationOutcome> {
        self.generation.as_ref()
    }

    pub fn is_generating(&self, data_type: &str) -> bool {
        self.trigger.is_in_flight(data_type)
    }

    /// The saved preferences record as last read or written
    pub fn saved_preferences(&self) -> Option<&Preferences> {
        self.saved.as_ref()
    }

    pub fn session(&self) -> SimulationSession {
        self.simulation.session()
    }

    pub fn is_simulating(&self) -> bool {
        self.simulation.is_running()
    }

    pub fn statistics(&self) -> Option<StatisticsSnapshot> {
        self.simulation.statistics()
    }

    /// Number of failed statistics fetches of the current session
    pub fn poll_failures(&self) -> u64 {
        self.simulation.poll_failures()
    }

    /// Status line of the last action
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// Load all people.
    ///
    /// With no active person, the person named by the saved preferences is
    /// selected and its devices loaded.
    pub async fn load_people(&mut self) -> &[Person] {
        let listing = self.loader.list_people().await;
        self.people = listing.items;
        self.people_error = listing.error;

        if self.person.is_none() {
            let remembered = self.saved.as_ref().and_then(|saved| {
                self.people
                    .iter()
                    .find(|p| p.email == saved.email)
                    .cloned()
            });
            if let Some(person) = remembered {
                info!(email = %person.email, "Restoring last selected person");
                self.select_person(Some(person)).await;
            }
        }

        &self.people
    }

    /// Switch the active person.
    ///
    /// Devices, selection, catalog and generation result are reset before the
    /// devices of the new person are fetched.
    #[instrument(skip(self))]
    pub async fn select_person(&mut self, person: Option<Person>) {
        self.selection.clear();
        self.directory_error = None;
        self.clear_catalog();
        self.person = person;

        if self.person.is_some() {
            self.reload_devices().await;
        }
    }

    /// Switch to the person with `email`, loading people first if needed.
    ///
    /// The remembered person is not restored on this path. A failed people
    /// load is reported as `Remote` rather than as an unknown person.
    #[instrument(skip(self))]
    pub async fn select_person_by_email(&mut self, email: &str) -> Result<(), SessionError> {
        if self.person.as_ref().is_some_and(|p| p.email == email) {
            return Ok(());
        }
        if self.people.is_empty() {
            let listing = self.loader.list_people().await;
            self.people = listing.items;
            self.people_error = listing.error;
        }

        let Some(person) = self.people.iter().find(|p| p.email == email).cloned() else {
            return Err(match &self.people_error {
                Some(error) => SessionError::Remote(error.clone()),
                None => SessionError::PersonNotFound(email.to_string()),
            });
        };
        self.select_person(Some(person)).await;
        Ok(())
    }

    /// Re-fetch the devices of the active person.
    ///
    /// All devices start selected; the saved selection replaces that when it
    /// belongs to this person and still names loaded devices.
    pub async fn reload_devices(&mut self) {
        let Some(person) = self.person.clone() else {
            return;
        };

        let listing = self.loader.load_devices(&person).await;
        if let Some(error) = listing.error {
            self.selection.clear();
            self.directory_error = Some(error);
            self.clear_catalog();
            return;
        }

        self.directory_error = None;
        self.selection.set_devices(listing.items);
        self.selection.select_all();
        if let Some(ids) = restore_selection(
            self.saved.as_ref(),
            &person.email,
            self.selection.devices(),
        ) {
            debug!(count = ids.len(), "Restoring saved device selection");
            self.selection.select_only(ids);
        }
        self.selection.prune();
        self.selection_changed().await;
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Flip selection of a loaded device; unknown ids are ignored
    pub async fn toggle(&mut self, device_id: &str) {
        if self.selection.toggle(device_id) {
            self.selection_changed().await;
        }
    }

    pub async fn select_all(&mut self) {
        self.selection.select_all();
        self.selection_changed().await;
    }

    pub async fn select_none(&mut self) {
        self.selection.select_none();
        self.selection_changed().await;
    }

    async fn selection_changed(&mut self) {
        let email = self.person.as_ref().map(|p| p.email.as_str());
        if let Some(saved) = self
            .preferences
            .save(email, &self.selection.selected_ids())
        {
            self.saved = Some(saved);
        }

        let single = self.selection.single_selected_device().map(|d| d.id.clone());
        match single {
            Some(id) if self.catalog_device.as_deref() == Some(id.as_str()) => {}
            Some(id) => {
                self.generation = None;
                self.catalog = self.loader.load_data_types(&id).await;
                self.catalog_device = Some(id);
            }
            None => self.clear_catalog(),
        }
    }

    fn clear_catalog(&mut self) {
        self.catalog.clear();
        self.catalog_device = None;
        self.generation = None;
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Start a simulation for the active person and the selected devices.
    ///
    /// No selection means all devices of the person.
    #[instrument(skip(self))]
    pub async fn start_simulation(&mut self) -> Result<String, SessionError> {
        let person_id = self.person.as_ref().map(|p| p.id.clone());
        let device_ids = self.selection.selected_ids();
        let count = match self.selection.selected_count() {
            0 => self.selection.devices().len(),
            n => n,
        };

        match self.simulation.start(person_id.as_deref(), &device_ids).await {
            Ok(_) => Ok(self.report(format!(
                "Simulation started! Generating data for {} device(s)",
                count
            ))),
            Err(SessionError::Remote(detail)) => {
                self.report(format!("Error: {}", detail));
                Err(SessionError::Remote(detail))
            }
            Err(e) => {
                self.report(e.to_string());
                Err(e)
            }
        }
    }

    /// Stop the running simulation. The session is Idle afterwards either way.
    #[instrument(skip(self))]
    pub async fn stop_simulation(&mut self) -> Result<String, SessionError> {
        match self.simulation.stop().await {
            Ok(_) => Ok(self.report("Simulation stopped successfully".to_string())),
            Err(SessionError::Remote(detail)) => {
                self.report(format!("Error stopping simulation: {}", detail));
                Err(SessionError::Remote(detail))
            }
            Err(e) => {
                self.report(e.to_string());
                Err(e)
            }
        }
    }

    /// Reconcile the local session with the server's view
    pub async fn refresh_status(&mut self) -> Result<SimulationStatus, SessionError> {
        self.simulation.refresh_status().await
    }

    // =========================================================================
    // Ad-hoc generation
    // =========================================================================

    /// Generate one data point for the single selected device
    pub async fn generate(&mut self, data_type: &str) -> Result<GenerationOutcome, SessionError> {
        let Some(device) = self.selection.single_selected_device().cloned() else {
            let err = SessionError::NoSingleDevice;
            self.report(err.to_string());
            return Err(err);
        };

        let outcome = self.trigger.generate(&device, data_type).await;
        self.generation = Some(outcome.clone());
        self.report(outcome.message.clone());
        Ok(outcome)
    }

    // =========================================================================
    // Preferences & teardown
    // =========================================================================

    /// Forget the saved preferences and the active person; a running
    /// simulation is stopped.
    pub async fn reset_preferences(&mut self) -> String {
        self.preferences.clear();
        self.saved = None;
        self.person = None;
        self.selection.clear();
        self.directory_error = None;
        self.clear_catalog();

        if self.simulation.is_running() {
            let _ = self.stop_simulation().await;
        }
        info!("Preferences reset");
        self.report("Settings reset.".to_string())
    }

    /// Stop any running simulation and release the poll task
    pub async fn dispose(self) {
        self.simulation.dispose().await;
    }

    fn report(&mut self, message: String) -> String {
        self.message = Some(message.clone());
        message
    }
}
