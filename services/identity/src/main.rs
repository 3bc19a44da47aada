//! bhada-identity server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bhada_config::AppConfig;
use bhada_identity::api::http::router;
use bhada_identity::bootstrap::{Services, Storage, build_notifier, init_runtime, shutdown_signal};
use bhada_identity::infrastructure::cleanup::CleanupTask;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config_dir = std::env::var("BHADA_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir)?;

    init_runtime(&config);

    let metrics = if config.telemetry.metrics_enabled {
        Some(bhada_telemetry::init_metrics()?)
    } else {
        None
    };

    let storage = Storage::connect(&config).await?;
    let notifier = build_notifier(&config)?;
    let services = Services::from_config(&config, &storage, notifier);

    let shutdown = CancellationToken::new();
    let cleanup_handle = if config.cleanup.interval_secs > 0 {
        let task = Arc::new(CleanupTask::new(
            services.otp.clone(),
            Duration::from_secs(config.cleanup.interval_secs),
        ));
        Some(task.start(shutdown.clone()))
    } else {
        warn!("Expired OTP cleanup disabled");
        None
    };

    let app = router(
        services.state(&storage, metrics),
        &config.server.cors_allowed_origins,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, backend = storage.probe.backend(), "HTTP server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Some(handle) = cleanup_handle {
        let _ = handle.await;
    }

    info!("Service stopped");
    Ok(())
}
