//! Operator session state machine for the IoT simulator
//!
//! This crate holds the client-side logic that sits between an operator and
//! the simulator backend:
//!
//! - picking a person and loading their devices from the directory
//! - selecting devices, with the selection remembered across restarts
//! - starting and stopping a simulation and polling its statistics
//! - ad-hoc sensor generation for a single selected device
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use iotsim_client::{DirectoryClient, SimulatorClient};
//! use iotsim_session::{MemoryStore, SessionConfig, SessionController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = SimulatorClient::new("http://localhost:3000/api")?;
//!     let directory = DirectoryClient::with_api_key("http://localhost:54321/rest/v1", "key")?;
//!
//!     let mut session = SessionController::new(
//!         Arc::new(directory),
//!         Arc::new(backend),
//!         Arc::new(MemoryStore::new()),
//!         SessionConfig::default(),
//!     );
//!
//!     session.select_person_by_email("alice@example.com").await?;
//!     println!("{}", session.start_simulation().await?);
//!
//!     session.dispose().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod preferences;
pub mod selection;
pub mod simulation;
pub mod trigger;

#[cfg(test)]
mod mock;

pub use api::{DirectoryApi, SimulationApi};
pub use config::SessionConfig;
pub use controller::SessionController;
pub use directory::{DirectoryLoader, Listing};
pub use error::SessionError;
pub use preferences::{
    restore_selection, FileStore, MemoryStore, PreferenceStore, Preferences, PreferencesAdapter,
    PREFERENCES_KEY,
};
pub use selection::SelectionStore;
pub use simulation::{SimulationController, SimulationSession, SimulationStatus};
pub use trigger::{GenerationOutcome, SensorTrigger};
