//! Web server setup and routing

use anyhow::Result;
use axum::{
    http::Method,
    routing::{get, options},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::info;

use crate::api;
use crate::config::TlsConfig;
use crate::state::AppState;
use crate::vera_poll::VeraPoller;

/// Base path of the device management API
pub const API_CONTEXT: &str = "/api/devices";

/// Build the router for the device management API
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            API_CONTEXT,
            get(api::list_devices)
                .post(api::create_device)
                .options(api::preflight),
        )
        .route(
            &format!("{API_CONTEXT}/{{id}}"),
            get(api::get_device)
                .put(api::update_device)
                .delete(api::delete_device)
                .options(api::preflight),
        )
        .route(&format!("{API_CONTEXT}/habridge/version"), get(api::get_version))
        .route(&format!("{API_CONTEXT}/vera/devices"), get(api::vera_devices))
        .route(&format!("{API_CONTEXT}/vera/scenes"), get(api::vera_scenes))
        .route(
            &format!("{API_CONTEXT}/harmony/activities"),
            get(api::harmony_activities),
        )
        .route(&format!("{API_CONTEXT}/harmony/show"), get(api::harmony_show))
        .route(
            &format!("{API_CONTEXT}/harmony/devices"),
            get(api::harmony_devices),
        )
        // CORS: echo the caller's origin and requested headers
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(AllowHeaders::mirror_request()),
        )
        .with_state(state)
}

/// Run the web server (HTTP or HTTPS depending on config)
pub async fn run(state: Arc<AppState>, bind: &str, tls: Option<&TlsConfig>) -> Result<()> {
    // Start Vera polling in background
    if let Some(address) = &state.config.vera.address {
        let poller = VeraPoller::new(address, &state.config.vera, state.vera.clone())?;
        tokio::spawn(poller.run());
    } else {
        info!("No Vera address configured, Vera snapshots unavailable");
    }

    let app = router(state);
    info!("HA Bridge device management service started");

    if let Some(tls_config) = tls {
        run_https(app, bind, tls_config).await
    } else {
        run_http(app, bind).await
    }
}

/// Run plain HTTP server
async fn run_http(app: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run HTTPS server with TLS
async fn run_https(app: Router, bind: &str, tls: &TlsConfig) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::path::PathBuf;

    let cert_path = PathBuf::from(&tls.cert);
    let key_path = PathBuf::from(&tls.key);

    if !cert_path.exists() {
        anyhow::bail!("TLS certificate file not found: {}", tls.cert);
    }
    if !key_path.exists() {
        anyhow::bail!("TLS key file not found: {}", tls.key);
    }

    let rustls_config = RustlsConfig::from_pem_file(&cert_path, &key_path).await?;

    let addr: std::net::SocketAddr = bind.parse()?;
    info!(address = %bind, protocol = "HTTPS", cert = %tls.cert, "Starting web server with TLS");

    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
