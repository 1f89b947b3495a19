use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod export;
mod models;
mod repositories;
mod routes;
mod settings;
mod state;
mod validation;

use attendance::curriculum::StaticCurriculum;
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;

use crate::{settings::Settings, state::AppState};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const BUNDLED_CURRICULUM: &str = include_str!("../config/curriculum.json");

fn load_curriculum(settings: &Settings) -> Result<StaticCurriculum> {
    let json = match &settings.curriculum_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read curriculum file {path}"))?,
        None => BUNDLED_CURRICULUM.to_string(),
    };

    let curriculum = StaticCurriculum::from_json(&json).context("Invalid curriculum document")?;
    if curriculum.is_empty() {
        warn!("Curriculum is empty; every analytics request will be rejected");
    }
    Ok(curriculum)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting attendance API service");

    let settings = Settings::load().context("Failed to load settings")?;
    let curriculum = load_curriculum(&settings)?;
    info!("Loaded curriculum with {} entries", curriculum.len());

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &MIGRATOR).await?;

    let app_state = AppState::new(pool, curriculum, settings.attendance.clone());

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    info!("API service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
