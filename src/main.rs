use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use trials_core::{CoreConfig, TrialsService};

/// Main entry point for the trials backend
///
/// Resolves configuration once, builds the registry-backed service and serves the REST API
/// (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `TRIALS_REST_ADDR`: REST server address (default: "0.0.0.0:3001")
/// - `CTGOV_BASE_URL`, `CTGOV_PAGE_SIZE`, `CTGOV_MAX_PAGES`, `CTGOV_TIMEOUT_SECS`: registry client
/// - `ASSESSMENT_TTL_SECS`, `ASSESSMENT_CAPACITY`: assessment store bounds
/// - `ASSESSMENT_CANDIDATE_LIMIT`, `CATALOGUE_WINDOW`: how many trials are scored or aggregated
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid, the address cannot be bound, or the
///   server fails while running
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trials=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("TRIALS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    tracing::info!(registry = cfg.ctgov_base_url(), "++ Using ClinicalTrials.gov registry");
    let service = TrialsService::from_config(cfg)?;

    tracing::info!("++ Starting trials REST on {}", addr);

    let app = router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
