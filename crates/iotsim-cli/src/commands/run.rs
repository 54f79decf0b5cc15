//! Run command - start a simulation and follow its statistics

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use iotsim_client::StatisticsSnapshot;
use iotsim_session::{SessionController, SimulationStatus};
use tokio::time::Instant;

use super::activate;
use crate::output::{DeviceStatsRow, OutputContext, OutputFormat};

/// Status is re-checked with the server every this many statistics ticks
const STATUS_CHECK_EVERY: u32 = 5;

/// Start a simulation for the selected devices of `email` and print
/// statistics until Ctrl+C or until `duration` has passed
pub async fn run(
    session: &mut SessionController,
    email: &str,
    duration: Option<u64>,
    poll_interval: Duration,
    ctx: &OutputContext,
) -> Result<()> {
    activate(session, email).await?;

    let message = session.start_simulation().await?;
    ctx.success(&message);
    ctx.info("Press Ctrl+C to stop");

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut ticker = tokio::time::interval(poll_interval);
    let mut last: Option<StatisticsSnapshot> = None;
    let mut ticks: u32 = 0;

    // For CSV, print header once
    if ctx.format == OutputFormat::Csv {
        println!("elapsed_seconds,generated,successful,failed,success_rate,per_minute");
    }

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            _ = ticker.tick() => {
                ticks += 1;
                if let Some(stats) = session.statistics() {
                    if last.as_ref() != Some(&stats) {
                        print_progress(&stats, ctx);
                        last = Some(stats);
                    }
                }

                if ticks % STATUS_CHECK_EVERY == 0 {
                    match session.refresh_status().await {
                        Ok(SimulationStatus::Idle) => {
                            ctx.warn("Simulation is no longer running on the server");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => ctx.warn(&format!("Status check failed: {}", e)),
                    }
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                // Check running flag periodically
                if !running.load(Ordering::SeqCst) {
                    break;
                }
            }
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
    }

    if let Some(stats) = session.statistics().or(last) {
        print_summary(&stats, ctx);
    }

    if session.is_simulating() {
        ctx.info("\nStopping simulation...");
        match session.stop_simulation().await {
            Ok(message) => ctx.success(&message),
            Err(e) => ctx.error(&format!("Error stopping simulation: {}", e)),
        }
    }

    let failures = session.poll_failures();
    if failures > 0 {
        ctx.warn(&format!("{} statistics fetch(es) failed", failures));
    }
    Ok(())
}

fn print_progress(stats: &StatisticsSnapshot, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Table => ctx.info(&format!(
            "[{}s] generated {} ({} ok, {} failed), {:.1}% success, {:.1}/min",
            stats.elapsed_seconds,
            stats.total_generated,
            stats.total_successful,
            stats.total_failed,
            stats.success_rate,
            stats.rate_per_minute
        )),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(stats) {
                println!("{}", json);
            }
        }
        OutputFormat::Csv => println!(
            "{},{},{},{},{:.2},{:.2}",
            stats.elapsed_seconds,
            stats.total_generated,
            stats.total_successful,
            stats.total_failed,
            stats.success_rate,
            stats.rate_per_minute
        ),
    }
}

fn print_summary(stats: &StatisticsSnapshot, ctx: &OutputContext) {
    if ctx.quiet {
        return;
    }
    if ctx.format == OutputFormat::Json {
        ctx.print_value(stats);
        return;
    }

    println!();
    ctx.print_kv(&[
        ("Simulation", stats.simulation_id.clone()),
        ("Started", format_millis(stats.start_time)),
        ("Last update", format_millis(stats.last_updated_time)),
        ("Elapsed", format!("{}s", stats.elapsed_seconds)),
        ("Generated", stats.total_generated.to_string()),
        ("Successful", stats.total_successful.to_string()),
        ("Failed", stats.total_failed.to_string()),
        ("Success rate", format!("{:.1}%", stats.success_rate)),
        ("Rate", format!("{:.1}/min", stats.rate_per_minute)),
    ]);

    if let Some(per_device) = &stats.per_device {
        let rows: Vec<DeviceStatsRow> = per_device
            .values()
            .map(|d| DeviceStatsRow {
                device: if d.device_name.is_empty() {
                    d.device_id.clone()
                } else {
                    d.device_name.clone()
                },
                success: d.success_count,
                failed: d.failure_count,
                total: d.total_count,
            })
            .collect();
        println!();
        ctx.print(&rows);
    }
}

fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis_absent() {
        assert_eq!(format_millis(None), "-");
    }

    #[test]
    fn test_format_millis_present() {
        let formatted = format_millis(Some(1_700_000_000_000));
        assert_eq!(formatted.len(), "2023-11-14 22:13:20".len());
        assert!(formatted.starts_with("2023-11-1"));
    }
}
