use api_rest::{build_router, AppState};
use api_shared::auth::auth_config_from_env_values;
use casebook_core::config::core_config_from_env_values;
use casebook_core::{CaseDirectory, CaseStore, StorageEnv};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the casebook server
///
/// Resolves configuration once, builds the case store and serves the REST API until
/// interrupted.
///
/// # Environment Variables
/// - `CASEBOOK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CASES_BACKEND`: `local` (default) or `github`
/// - `CASES_DIR`: Directory holding case files for the local backend (default: "data/cases")
/// - `CASES_GITHUB_OWNER`, `CASES_GITHUB_REPO`, `CASES_GITHUB_PATH`, `CASES_GITHUB_BRANCH`,
///   `CASES_GITHUB_API`, `GITHUB_TOKEN`: Repository coordinates for the github backend
/// - `CASES_LISTING_POLICY`: `abort` or `skip` when a stored case cannot be read
/// - `ADMIN_PASSWORD`, `SESSION_SECRET`: Admin login (both required)
/// - `SESSION_TTL_HOURS` (default 24), `SECURE_COOKIES` (default false)
///
/// # Errors
/// Returns an error if configuration is missing or invalid, the storage backend cannot be
/// opened, or the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("casebook_run=info".parse()?)
                .add_directive("casebook_core=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CASEBOOK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let storage_env = StorageEnv::from_lookup(|key| std::env::var(key).ok());
    let cfg = core_config_from_env_values(storage_env)?;
    let auth = auth_config_from_env_values(
        std::env::var("ADMIN_PASSWORD").ok(),
        std::env::var("SESSION_SECRET").ok(),
        std::env::var("SESSION_TTL_HOURS").ok(),
        std::env::var("SECURE_COOKIES").ok(),
    )?;

    let store = CaseStore::from_config(&cfg)?;
    tracing::info!(
        "listing policy: {:?}, storage: {}",
        store.listing_policy(),
        store.describe()
    );

    let app = build_router(AppState::new(CaseDirectory::new(store), auth));

    tracing::info!("++ Starting casebook REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("casebook stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
