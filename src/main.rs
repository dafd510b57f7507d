use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::{io::ErrorKind, net::SocketAddr, path::Path};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

/// Cap on upload bodies (multipart and text), matching what the demo
/// console realistically sends.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting protocol-gateway with config: {:?}", cfg);
    tracing::info!("Expecting SOAP todo service at {}", cfg.soap_url);
    tracing::info!("Expecting object store at {}", cfg.minio_endpoint_url());
    tracing::info!("Expecting socket server at {}", cfg.socket_addr());

    if !Path::new(&cfg.static_dir).exists() {
        tracing::warn!(
            "Static assets directory {} does not exist; the console UI will 404",
            cfg.static_dir
        );
    }

    // --- Initialize the three adapters ---
    let state = services::AppState::new(&cfg);

    // --- Build router ---
    let app: Router = routes::routes::routes()
        .with_state(state)
        .fallback_service(ServeDir::new(&cfg.static_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
