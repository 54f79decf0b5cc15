//! IoT Simulator Client Library
//!
//! Typed HTTP clients for the simulator backend and for the device
//! directory that the simulator reads persons and devices from.
//!
//! # Example
//!
//! ```rust,no_run
//! use iotsim_client::{DirectoryClient, SimulatorClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let directory = DirectoryClient::with_api_key("http://localhost:54321/rest/v1", "anon")?;
//!     let simulator = SimulatorClient::new("http://localhost:3000/api")?;
//!
//!     let people = directory.list_people().await?;
//!     if let Some(person) = people.first() {
//!         // Empty device list: simulate every device of the person
//!         let started = simulator.start_simulation(&person.id, &[]).await?;
//!         println!("{:?}", started.simulation_id);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod directory;
mod error;
pub mod testing;
mod types;

pub use client::SimulatorClient;
pub use directory::DirectoryClient;
pub use error::{Result, SimClientError};
pub use types::*;
