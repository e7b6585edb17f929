use encore::{
    config::{database, settings, users},
    core::{dashboard, roster, users as accounts},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Makes sure the directory of a file-backed `SQLite` URL exists.
fn ensure_database_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .split('?')
        .next()
        .unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    match std::path::Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables can also be set externally
    dotenv().ok();

    // 3. Load academy settings
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load academy settings: {}", e))?;

    // 4. Connect and create tables
    ensure_database_dir(&database::get_database_url())?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the instrument catalog and the first administrator
    let seeded = roster::seed_instruments(&db, &settings.instruments).await?;
    if !seeded.is_empty() {
        info!("Seeded {} instruments", seeded.len());
    }
    match users::get_bootstrap_admin() {
        Some(admin) => {
            if let Some(created) = accounts::bootstrap_admin(&db, &admin).await? {
                info!("Created administrator {}", created.email);
            }
        }
        None => warn!("ADMIN_NAME and ADMIN_EMAIL are not set; no administrator bootstrapped"),
    }

    // 6. Report today's dashboard
    let today = chrono::Local::now().date_naive();
    let board = dashboard::dashboard(&db, today, &settings).await?;
    info!("{}: {}", today, dashboard::format_metrics(&board.metrics));
    for occurrence in &board.todays_classes {
        info!("  {}", dashboard::format_occurrence(occurrence));
    }
    for alert in &board.credit_alerts {
        warn!(
            "Low credits: {} ({} with {}) has {} left",
            alert.student_name, alert.instrument_name, alert.teacher_name, alert.current_balance
        );
    }
    for alert in &board.inventory_alerts {
        warn!("Inventory alert: {:?}", alert);
    }

    Ok(())
}
