// Food Affordability Dashboard - Web Server
// Serves the dashboard as HTML plus a JSON API with Axum

use anyhow::{Context, Result};
use food_afford::annotations;
use food_afford::server::{router, AppState};
use food_afford::{DashboardConfig, Dataset};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 Food Affordability Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = DashboardConfig::from_executable();
    let dataset = Dataset::load(&config)
        .with_context(|| format!("Failed to load dashboard data from {}", config.data_dir.display()))?;
    println!("✓ Data loaded from {}", config.data_dir.display());

    let state = AppState::new(dataset);
    annotations::log_audit(state.audit());
    println!("✓ {}", annotations::summary(state.audit()));

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Listening");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/page?view=affordability");
    println!("   UI:  http://localhost:3000");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
