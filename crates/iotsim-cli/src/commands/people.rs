//! People command - list monitored persons

use anyhow::Result;
use iotsim_client::DirectoryClient;

use crate::output::{OutputContext, PersonRow};

/// List all persons known to the directory
pub async fn people(directory: &DirectoryClient, ctx: &OutputContext) -> Result<()> {
    let people = directory.list_people().await?;

    let rows: Vec<PersonRow> = people
        .into_iter()
        .map(|p| PersonRow {
            name: p.display_name.clone().unwrap_or_default(),
            id: p.id,
            email: p.email,
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
