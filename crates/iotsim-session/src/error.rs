//! Session errors

use iotsim_client::SimClientError;

/// Outcome of a refused or failed session action.
///
/// Precondition variants are raised before any request is made; `Remote`
/// carries the detail of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Please select an elderly person")]
    NoPersonSelected,

    #[error("No active simulation to stop")]
    NoActiveSimulation,

    #[error("A stop request is already in progress")]
    StopInProgress,

    #[error("Select exactly one device to generate sensor data")]
    NoSingleDevice,

    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("{0}")]
    Remote(String),
}

impl From<SimClientError> for SessionError {
    fn from(err: SimClientError) -> Self {
        Self::Remote(remote_detail(&err))
    }
}

/// The server-supplied message of `err`, or its display text
pub(crate) fn remote_detail(err: &SimClientError) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}
