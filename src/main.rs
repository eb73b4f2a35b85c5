// Food Affordability Dashboard - terminal UI
// Loads the four CSV tables once, audits the frozen captions, then runs the TUI

use anyhow::{Context, Result};
use food_afford::annotations;
use food_afford::ui;
use food_afford::{DashboardConfig, Dataset};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // The TUI owns the terminal; keep logging quiet unless asked for.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    println!("🖥️  Loading Food Affordability Dashboard...\n");

    let config = DashboardConfig::from_executable();
    println!("📂 Data directory: {}", config.data_dir.display());

    let dataset = Dataset::load(&config)
        .with_context(|| format!("Failed to load dashboard data from {}", config.data_dir.display()))?;

    println!("✓ Loaded {} affordability rows", dataset.affordability.len());
    println!("✓ Loaded {} food price rows", dataset.food_prices.len());

    let entries = annotations::audit(&dataset);
    annotations::log_audit(&entries);
    println!("✓ {}\n", annotations::summary(&entries));
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(dataset);
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");

    Ok(())
}
