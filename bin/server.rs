// rankr - Web Server
// REST API with Axum over the SQLite ranking store

use anyhow::{Context, Result};
use rankr::api::{router, AppState};
use rankr::{open_database, verify_count, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    println!("🌐 rankr - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = &config.database_path;
    if !db_path.exists() {
        eprintln!("❌ Database not found at {}", db_path.display());
        eprintln!("   Run: rankr import <files...>");
        eprintln!("   to import rankings first.");
        std::process::exit(1);
    }

    let conn = open_database(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let records = verify_count(&conn)?;
    info!(path = %db_path.display(), records, "database opened");

    let app = router(AppState::new(conn));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/ranking?year=2024&category=engineering", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
