use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::{ClinicStore, CoreConfig};

/// Main entry point for the clinic application
///
/// Starts the REST server with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `CLINIC_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory for the embedded database (default: "/clinic_data")
/// - `CLINIC_TOKEN_SECRET`: Secret used to sign access tokens (required)
/// - `CLINIC_DEFAULT_DURATION_MINUTES`: Default appointment length (default: 30)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| "/clinic_data".into());
    let token_secret = std::env::var("CLINIC_TOKEN_SECRET")
        .map_err(|_| anyhow::anyhow!("CLINIC_TOKEN_SECRET must be set"))?;
    let default_duration: u32 = std::env::var("CLINIC_DEFAULT_DURATION_MINUTES")
        .ok()
        .map(|v| v.parse())
        .transpose()?
        .unwrap_or(30);

    let cfg = Arc::new(CoreConfig::new(data_dir.into(), default_duration)?);
    let store = Arc::new(ClinicStore::open(&cfg)?);

    tracing::info!("++ Starting clinic REST on {}", addr);
    tracing::info!("++ Data directory: {}", cfg.data_dir().display());

    let app = router(AppState::new(store, cfg, &token_secret));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
