use anyhow::Result;
use tokio::signal;

mod sim_logic;
use sim_logic::{config, page};

const APP_NAME: &str = "splash_sim";

#[tokio::main]
async fn main() -> Result<()> {
    let sim = config::load_config();

    if sim.print_config {
        let splash = sim.splash_config()?;
        println!("{}", serde_json::to_string_pretty(&splash)?);
        return Ok(());
    }

    let (_log_guard, splash) = config::start(&sim, APP_NAME)?;

    tokio::select! {
        report = page::simulate(&sim, &splash) => {
            let report = report?;
            tracing::info!(
                reason = ?report.reason,
                theme = ?report.theme,
                redirected_to = ?report.redirected_to,
                currencies = ?report.currencies,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "page load finished"
            );
            tracing::debug!(history = ?report.status_history, "status text history");
        }
        _ = signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, abandoning page load.");
        }
    }

    Ok(())
}
