mod bootstrap;
mod report;

use anyhow::{Context, Result};
use dashboard_core::settings::Settings;
use dashboard_data::analysis::build_dashboard;
use dashboard_data::reader::{load_payments, load_trips};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Driver Dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let selection = settings.to_selection()?;

    let trips = load_trips(&settings.trips, &settings.trip_schema())
        .with_context(|| format!("loading trips from {}", settings.trips.display()))?;
    let payments = load_payments(&settings.payments, &settings.payment_schema())
        .with_context(|| format!("loading payments from {}", settings.payments.display()))?;

    tracing::info!(
        "Loaded {} trips and {} payments",
        trips.len(),
        payments.len()
    );

    let dashboard = build_dashboard(&trips, &payments, &selection)?;

    match settings.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&dashboard)?),
        _ => print!("{}", report::render_text(&dashboard)),
    }

    Ok(())
}
