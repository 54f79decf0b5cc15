//! Types command - data types of the single selected device

use anyhow::{bail, Result};
use iotsim_session::{SessionController, SessionError};

use super::activate;
use crate::output::{or_dash, DataTypeRow, OutputContext};

/// List the data types supported by the single selected device
pub async fn types(session: &mut SessionController, email: &str, ctx: &OutputContext) -> Result<()> {
    activate(session, email).await?;

    let Some(device) = session.single_selected_device() else {
        bail!(SessionError::NoSingleDevice);
    };
    ctx.info(&format!("Data types of {} ({})", device.name, device.id));

    let rows: Vec<DataTypeRow> = session
        .catalog()
        .iter()
        .map(|entry| DataTypeRow {
            data_type: entry.data_type.clone(),
            name: entry.display_name.clone(),
            unit: entry.unit.clone(),
            min: or_dash(entry.min()),
            max: or_dash(entry.max()),
            frequency: or_dash(entry.frequency_per_day),
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}
