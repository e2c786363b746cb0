use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use records_api_rest::{ApiDoc, AppState, router};
use records_core::config::path_from_env_value;
use records_core::{CoreConfig, FileStore};

/// Main entry point for the patient records server
///
/// Serves the patient details screen over REST, with Swagger UI at `/swagger-ui`.
///
/// # Environment Variables
/// - `RECORDS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: Directory for patient data storage (default: "patient_data")
/// - `RECORDS_PREFERENCES_FILE`: Preferences file (default: `<PATIENT_DATA_DIR>/preferences.json`)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("records=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RECORDS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let patient_data_dir = std::env::var("PATIENT_DATA_DIR")
        .unwrap_or_else(|_| records_core::DEFAULT_PATIENT_DATA_DIR.into());
    let cfg = CoreConfig::new(
        PathBuf::from(patient_data_dir),
        path_from_env_value(std::env::var("RECORDS_PREFERENCES_FILE").ok()),
    )?;

    let store = FileStore::from_config(&cfg);
    tracing::info!("++ Serving patient records from {}", store.root().display());
    tracing::info!("++ Starting patient records REST on {}", rest_addr);

    let app = router(AppState::new(Arc::new(store)))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
