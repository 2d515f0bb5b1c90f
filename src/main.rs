//! Main entry point for the CIMA Watch application.
//!
//! Serves the configuration REST API (with Swagger UI). The daily shortage
//! check itself is triggered externally via `cimawatch check`; this process
//! only owns the configuration surface.
//!
//! # Environment Variables
//! - `CIMAWATCH_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
//! - `CIMAWATCH_DATA_DIR`: store root directory (default: "cimawatch_data")

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cimawatch_store::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cimawatch=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CIMAWATCH_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir =
        std::env::var("CIMAWATCH_DATA_DIR").unwrap_or_else(|_| "cimawatch_data".into());

    tracing::info!("++ Starting CIMA Watch REST on {rest_addr}");
    tracing::info!("++ Using data dir {data_dir}");

    let store = Arc::new(FileStore::open(&data_dir)?);
    let app = cimawatch_api_rest::router(store);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
