//! Standalone configuration API server binary.
//!
//! Runs the REST API on its own, which is handy for development. The
//! workspace's main `cimawatch-run` binary serves the same router.
//!
//! # Environment Variables
//! - `CIMAWATCH_REST_ADDR`: listen address (default: "0.0.0.0:3000")
//! - `CIMAWATCH_DATA_DIR`: store root (default: "cimawatch_data")

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

    let addr = std::env::var("CIMAWATCH_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir =
        std::env::var("CIMAWATCH_DATA_DIR").unwrap_or_else(|_| "cimawatch_data".into());

    let store = Arc::new(FileStore::open(&data_dir)?);
    tracing::info!("++ Starting CIMA Watch REST on {addr} (data dir: {data_dir})");

    let app = cimawatch_api_rest::router(store);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
