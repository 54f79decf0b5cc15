//! Device listing and selection commands

use anyhow::{bail, Result};
use iotsim_client::{Device, DirectoryClient, SimulatorClient};
use iotsim_session::SessionController;

use super::{activate, find_person};
use crate::output::{or_dash, DeviceRow, OutputContext};

/// Show the devices of a person with their selection marks
pub async fn devices(session: &mut SessionController, email: &str, ctx: &OutputContext) -> Result<()> {
    activate(session, email).await?;
    print_devices(session, ctx);
    Ok(())
}

/// Show the devices of a person as the simulator backend resolves them
pub async fn backend_devices(
    client: &SimulatorClient,
    directory: &DirectoryClient,
    email: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let person = find_person(directory, email).await?;
    let devices = client.list_devices(&person.id).await?;

    let rows: Vec<DeviceRow> = devices.iter().map(|d| device_row(d, false)).collect();
    ctx.print(&rows);
    Ok(())
}

/// Flip the selection of one or more devices
pub async fn toggle(
    session: &mut SessionController,
    email: &str,
    device_ids: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    activate(session, email).await?;

    for id in device_ids {
        if !session.devices().iter().any(|d| &d.id == id) {
            ctx.warn(&format!("Unknown device: {}", id));
            continue;
        }
        session.toggle(id).await;
    }

    print_devices(session, ctx);
    Ok(())
}

/// Select all or none of the devices of a person
pub async fn select(
    session: &mut SessionController,
    email: &str,
    all: bool,
    none: bool,
    ctx: &OutputContext,
) -> Result<()> {
    activate(session, email).await?;

    match (all, none) {
        (true, false) => session.select_all().await,
        (false, true) => session.select_none().await,
        _ => bail!("Specify exactly one of --all or --none"),
    }

    print_devices(session, ctx);
    Ok(())
}

pub(crate) fn print_devices(session: &SessionController, ctx: &OutputContext) {
    let rows: Vec<DeviceRow> = session
        .devices()
        .iter()
        .map(|d| device_row(d, session.is_selected(&d.id)))
        .collect();

    ctx.print(&rows);

    let selected = session.selected_ids().len();
    if selected == 0 {
        ctx.info("No devices selected; a simulation will include all devices");
    } else {
        ctx.info(&format!("{} of {} device(s) selected", selected, rows.len()));
    }
}

fn device_row(device: &Device, selected: bool) -> DeviceRow {
    DeviceRow {
        selected: if selected { "*" } else { "" }.to_string(),
        id: device.id.clone(),
        name: device.name.clone(),
        device_id: device.external_device_id.clone(),
        device_type: or_dash(device.device_type.as_deref()),
        location: or_dash(device.location.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use axum::extract::Path;
    use axum::routing::get;
    use axum::{Json, Router};
    use iotsim_client::testing::TestServer;
    use serde_json::{json, Value};

    async fn profiles() -> Json<Value> {
        Json(json!([{"id": "p1", "email": "a@x.com"}]))
    }

    async fn person_devices(Path(person): Path<String>) -> Json<Value> {
        if person != "p1" {
            return Json(json!([]));
        }
        Json(json!([{"id": "d1", "deviceName": "Watch", "deviceId": "WT001"}]))
    }

    #[tokio::test]
    async fn test_backend_devices_resolves_person() {
        let router = Router::new()
            .route("/profiles", get(profiles))
            .route("/devices/{person}", get(person_devices));
        let server = TestServer::start(router).await.unwrap();
        let ctx = OutputContext::new(OutputFormat::Json, true, true);

        backend_devices(&server.client, &server.directory, "a@x.com", &ctx)
            .await
            .unwrap();
        assert!(
            backend_devices(&server.client, &server.directory, "z@x.com", &ctx)
                .await
                .is_err()
        );
    }

    #[test]
    fn test_device_row_marks_selection() {
        let device: Device = serde_json::from_value(json!({
            "id": "d1", "deviceName": "Watch", "deviceId": "WT001", "location": "hall"
        }))
        .unwrap();

        let row = device_row(&device, true);
        assert_eq!(row.selected, "*");
        assert_eq!(row.device_id, "WT001");
        assert_eq!(row.device_type, "-");
        assert_eq!(row.location, "hall");
        assert_eq!(device_row(&device, false).selected, "");
    }
}
