use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use olt_snmp_api::config::AppConfig;
use olt_snmp_api::handlers::AppState;
use olt_snmp_api::ont::OntService;
use olt_snmp_api::routes::create_router;
use olt_snmp_api::snmp::UdpConnector;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Arc::new(AppConfig::load()?);
    let listen = config.settings.server.listen.clone();
    info!(
        profiles = config.profiles.len(),
        default_profile = %config.settings.default_profile,
        port = config.settings.connection.port,
        timeout_ms = config.settings.connection.timeout_ms,
        retries = config.settings.connection.retries,
        "configuration loaded"
    );

    let state = AppState::new(OntService::new(UdpConnector, config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Не удалось занять адрес {listen}"))?;
    info!(addr = %listen, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP сервер завершился с ошибкой")?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            // Без обработчика сигнала просто работаем до kill
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
