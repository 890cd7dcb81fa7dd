//! Entry point for the License Engine binary.
//!
//! Running this binary starts an HTTP server exposing the cost engine.
//! The engine is configured from `LICENSE_ENGINE_*` environment
//! variables (see [`license_engine::config`]); the bind address comes
//! from `LICENSE_ENGINE_BIND_ADDR` and defaults to `127.0.0.1:3000`.

use anyhow::Result;
use license_engine::config::EngineConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("license_engine=info".parse()?))
        .json()
        .init();

    let config = EngineConfig::from_env()?;
    let addr = std::env::var("LICENSE_ENGINE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    tracing::info!(
        usd_to_jpy_rate = config.usd_to_jpy_rate,
        "Starting license engine server"
    );
    license_engine::api::serve(&addr, &config).await
}
