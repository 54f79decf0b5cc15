//! Simulation session lifecycle and statistics polling

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use iotsim_client::{SimulationResponse, StatisticsSnapshot};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::SimulationApi;
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Lifecycle state of the remote simulation as seen by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationStatus {
    #[default]
    Idle,
    Running,
    /// A stop request is in flight
    Stopping,
}

/// The current simulation session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationSession {
    pub id: Option<String>,
    pub status: SimulationStatus,
}

impl SimulationSession {
    fn running(id: String) -> Self {
        Self {
            id: Some(id),
            status: SimulationStatus::Running,
        }
    }

    fn is_current(&self, simulation_id: &str) -> bool {
        self.status == SimulationStatus::Running && self.id.as_deref() == Some(simulation_id)
    }
}

/// Owns the simulation session and its statistics poll loop.
///
/// At most one poll task exists per controller. The task is started on a
/// successful start, aborted before a stop request is sent, and aborted when
/// the controller is dropped.
pub struct SimulationController {
    api: Arc<dyn SimulationApi>,
    poll_interval: Duration,
    session: Arc<RwLock<SimulationSession>>,
    statistics: Arc<RwLock<Option<StatisticsSnapshot>>>,
    poll_failures: Arc<AtomicU64>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SimulationController {
    pub fn new(api: Arc<dyn SimulationApi>, config: &SessionConfig) -> Self {
        Self {
            api,
            poll_interval: config.poll_interval(),
            session: Arc::new(RwLock::new(SimulationSession::default())),
            statistics: Arc::new(RwLock::new(None)),
            poll_failures: Arc::new(AtomicU64::new(0)),
            poll_handle: Mutex::new(None),
        }
    }

    /// Get the current session
    pub fn session(&self) -> SimulationSession {
        self.session.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.session.read().status == SimulationStatus::Running
    }

    /// Latest statistics snapshot of the running session
    pub fn statistics(&self) -> Option<StatisticsSnapshot> {
        self.statistics.read().clone()
    }

    /// Number of failed statistics fetches since the last start
    pub fn poll_failures(&self) -> u64 {
        self.poll_failures.load(Ordering::Relaxed)
    }

    /// Whether a poll task is currently scheduled
    pub async fn is_polling(&self) -> bool {
        self.poll_handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Start a simulation for `person_id`.
    ///
    /// Refuses without a person. An empty `device_ids` asks for every device
    /// of the person. A running session is stopped first.
    pub async fn start(
        &self,
        person_id: Option<&str>,
        device_ids: &[String],
    ) -> Result<SimulationResponse, SessionError> {
        let person_id = person_id.ok_or(SessionError::NoPersonSelected)?;

        if self.session.read().id.is_some() {
            info!("Stopping current simulation before starting a new one");
            if let Err(e) = self.stop().await {
                warn!(error = %e, "Previous simulation did not stop cleanly");
            }
        }

        let response = self.api.start_simulation(person_id, device_ids).await?;
        let simulation_id = response.simulation_id.clone().ok_or_else(|| {
            SessionError::Remote("start response carried no simulation id".to_string())
        })?;

        *self.statistics.write() = None;
        self.poll_failures.store(0, Ordering::Relaxed);
        *self.session.write() = SimulationSession::running(simulation_id.clone());
        info!(
            simulation = %simulation_id,
            person = person_id,
            devices = device_ids.len(),
            "Simulation started"
        );

        self.start_polling(simulation_id).await;
        Ok(response)
    }

    /// Stop the running simulation.
    ///
    /// Polling is cancelled before the request goes out. Once the request
    /// has been attempted the session is Idle whatever the outcome. A stop
    /// dropped before the request completes leaves the session Running.
    pub async fn stop(&self) -> Result<SimulationResponse, SessionError> {
        let simulation_id = {
            let mut session = self.session.write();
            if session.status == SimulationStatus::Stopping {
                return Err(SessionError::StopInProgress);
            }
            let Some(id) = session.id.clone() else {
                return Err(SessionError::NoActiveSimulation);
            };
            session.status = SimulationStatus::Stopping;
            id
        };

        let attempt = StopAttempt {
            session: &self.session,
            simulation_id: &simulation_id,
            done: false,
        };

        self.stop_polling().await;

        let result = self.api.stop_simulation(&simulation_id).await;

        attempt.finish();
        *self.session.write() = SimulationSession::default();
        *self.statistics.write() = None;

        match result {
            Ok(response) => {
                info!(simulation = %simulation_id, "Simulation stopped");
                Ok(response)
            }
            Err(e) => {
                warn!(simulation = %simulation_id, error = %e, "Stop request failed; session cleared locally");
                Err(e.into())
            }
        }
    }

    /// Ask the backend whether the session is still running.
    ///
    /// A session the backend no longer runs is cleared locally.
    pub async fn refresh_status(&self) -> Result<SimulationStatus, SessionError> {
        let simulation_id = self
            .session
            .read()
            .id
            .clone()
            .ok_or(SessionError::NoActiveSimulation)?;

        let response = self.api.simulation_status(&simulation_id).await?;
        if response.is_running() {
            return Ok(self.session.read().status);
        }

        if self.session.read().is_current(&simulation_id) {
            info!(simulation = %simulation_id, "Simulation no longer running on the server");
            self.stop_polling().await;
            *self.session.write() = SimulationSession::default();
            *self.statistics.write() = None;
        }
        Ok(self.session.read().status)
    }

    /// Best-effort stop for teardown; failures are only logged
    pub async fn dispose(&self) {
        if self.session.read().status == SimulationStatus::Running {
            if let Err(e) = self.stop().await {
                warn!(error = %e, "Stop on teardown failed");
            }
        } else {
            self.stop_polling().await;
        }
    }

    async fn start_polling(&self, simulation_id: String) {
        self.stop_polling().await;

        let api = self.api.clone();
        let session = self.session.clone();
        let statistics = self.statistics.clone();
        let failures = self.poll_failures.clone();
        let interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match api.simulation_statistics(&simulation_id).await {
                    Ok(snapshot) => {
                        if !apply_snapshot(&session, &statistics, &simulation_id, snapshot) {
                            debug!(simulation = %simulation_id, "Discarding stale statistics");
                        }
                    }
                    Err(e) => {
                        failures.fetch_add(1, Ordering::Relaxed);
                        warn!(simulation = %simulation_id, error = %e, "Statistics fetch failed");
                    }
                }
            }
        });

        *self.poll_handle.lock().await = Some(handle);
        debug!(interval_ms = self.poll_interval.as_millis() as u64, "Statistics polling started");
    }

    async fn stop_polling(&self) {
        let mut handle = self.poll_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
            debug!("Statistics polling stopped");
        }
    }
}

/// Puts a session back to Running when its stop is abandoned midway, so a
/// later stop or dispose still reaches the backend
struct StopAttempt<'a> {
    session: &'a RwLock<SimulationSession>,
    simulation_id: &'a str,
    done: bool,
}

impl StopAttempt<'_> {
    fn finish(mut self) {
        self.done = true;
    }
}

impl Drop for StopAttempt<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut session = self.session.write();
        if session.status == SimulationStatus::Stopping
            && session.id.as_deref() == Some(self.simulation_id)
        {
            warn!(simulation = %self.simulation_id, "Stop abandoned; session still running");
            session.status = SimulationStatus::Running;
        }
    }
}

/// Store `snapshot` if it belongs to the session that is still running
fn apply_snapshot(
    session: &RwLock<SimulationSession>,
    statistics: &RwLock<Option<StatisticsSnapshot>>,
    simulation_id: &str,
    snapshot: StatisticsSnapshot,
) -> bool {
    let session = session.read();
    if !session.is_current(simulation_id) {
        return false;
    }
    *statistics.write() = Some(snapshot);
    true
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        if let Some(handle) = self.poll_handle.get_mut().take() {
            handle.abort();
        }

        // Fire-and-forget stop for a session nobody stopped explicitly
        let session = self.session.read().clone();
        if let (Some(id), SimulationStatus::Running) = (session.id, session.status) {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                let api = self.api.clone();
                runtime.spawn(async move {
                    if let Err(e) = api.stop_simulation(&id).await {
                        warn!(simulation = %id, error = %e, "Stop on drop failed");
                    }
                });
            }
        }
    }
}
