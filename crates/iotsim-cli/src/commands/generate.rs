//! Generate command - one-off sensor data point

use anyhow::Result;
use iotsim_session::SessionController;

use super::activate;
use crate::output::OutputContext;

/// Generate one data point of `data_type` for the single selected device
pub async fn generate(
    session: &mut SessionController,
    email: &str,
    data_type: &str,
    ctx: &OutputContext,
) -> Result<()> {
    activate(session, email).await?;

    if !session.catalog().is_empty() && !session.catalog().iter().any(|e| e.data_type == data_type)
    {
        ctx.warn(&format!(
            "{} is not in the catalog of the selected device",
            data_type
        ));
    }

    let outcome = session.generate(data_type).await?;
    if outcome.success {
        ctx.success(&outcome.message);
    } else {
        ctx.error(&outcome.message);
    }
    Ok(())
}
