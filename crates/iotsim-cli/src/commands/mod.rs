//! Command implementations for iotsim

pub mod devices;
pub mod generate;
pub mod people;
pub mod places;
pub mod reset;
pub mod run;
pub mod simulation;
pub mod types;

pub use devices::{backend_devices, devices, select, toggle};
pub use generate::generate;
pub use people::people;
pub use places::places;
pub use reset::reset;
pub use run::run;
pub use simulation::{status, stop};
pub use types::types;

use anyhow::{bail, Context, Result};
use iotsim_client::{DirectoryClient, Person};
use iotsim_session::SessionController;

/// Make `email` the active person and fail if its devices could not be loaded
pub(crate) async fn activate(session: &mut SessionController, email: &str) -> Result<()> {
    session.select_person_by_email(email).await?;
    if let Some(error) = session.directory_error() {
        bail!("Failed to load devices for {}: {}", email, error);
    }
    Ok(())
}

/// Look up a person by email in the directory
pub(crate) async fn find_person(directory: &DirectoryClient, email: &str) -> Result<Person> {
    let people = directory.list_people().await?;
    people
        .into_iter()
        .find(|p| p.email == email)
        .with_context(|| format!("Person not found: {}", email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use iotsim_client::testing::TestServer;
    use serde_json::{json, Value};

    async fn profiles() -> Json<Value> {
        Json(json!([{"id": "p1", "email": "a@x.com", "full_name": "Alice"}]))
    }

    #[tokio::test]
    async fn test_find_person() {
        let server = TestServer::start(Router::new().route("/profiles", get(profiles)))
            .await
            .unwrap();

        let person = find_person(&server.directory, "a@x.com").await.unwrap();
        assert_eq!(person.id, "p1");

        let err = find_person(&server.directory, "z@x.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Person not found: z@x.com");
    }
}
