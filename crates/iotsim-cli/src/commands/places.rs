//! Places command - geofence places of a person

use anyhow::Result;
use iotsim_client::{DirectoryClient, SimulatorClient};

use super::find_person;
use crate::output::{or_dash, OutputContext, PlaceRow};

/// List the geofence places used for location generation
pub async fn places(
    client: &SimulatorClient,
    directory: &DirectoryClient,
    email: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let person = find_person(directory, email).await?;
    let places = client.list_geofence_places(&person.id).await?;

    let rows: Vec<PlaceRow> = places
        .into_iter()
        .map(|p| PlaceRow {
            name: p.name,
            place_type: or_dash(p.place_type),
            latitude: format!("{:.6}", p.latitude),
            longitude: format!("{:.6}", p.longitude),
            radius: p.radius_meters.to_string(),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
