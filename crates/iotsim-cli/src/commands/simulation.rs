//! Raw simulation status and stop commands

use anyhow::Result;
use iotsim_client::{SimulationResponse, SimulatorClient};

use crate::output::{or_dash, OutputContext};

/// Show the server-side status of a simulation
pub async fn status(client: &SimulatorClient, simulation_id: &str, ctx: &OutputContext) -> Result<()> {
    let response = client.simulation_status(simulation_id).await?;
    print_response(&response, ctx);
    Ok(())
}

/// Stop a simulation by id
pub async fn stop(client: &SimulatorClient, simulation_id: &str, ctx: &OutputContext) -> Result<()> {
    let response = client.stop_simulation(simulation_id).await?;
    if response.is_running() {
        ctx.warn(&format!("Simulation {} is still running", simulation_id));
    } else {
        ctx.success("Simulation stopped successfully");
    }
    print_response(&response, ctx);
    Ok(())
}

fn print_response(response: &SimulationResponse, ctx: &OutputContext) {
    ctx.print_kv(&[
        ("Simulation", or_dash(response.simulation_id.as_deref())),
        ("Status", response.status.clone()),
        ("Person", or_dash(response.elderly_person_id.as_deref())),
        ("Devices", or_dash(response.device_count)),
        ("Data types", or_dash(response.data_type_count)),
        ("Message", response.message.clone()),
    ]);
}
