use mod_catalog::config::Config;
use mod_catalog::health;
use mod_catalog::observability::{Logger, metrics::Metrics};
use mod_catalog::router::{self, AppState};
use mod_catalog::store;
use serde_json::json;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load Config
    let config = Config::from_env()?;

    // 2. Initialize Logger
    let logger = Logger::new(config.service_id.clone());

    logger.info("Mod catalog starting up", Some(&json!({
        "database_url": config.database_url,
        "store_backend": format!("{:?}", config.store_backend),
        "api_bind": config.api_bind,
        "health_bind": config.health_bind,
        "legacy_pagination": config.legacy_pagination,
    })));

    // 3. Start Health Server
    let metrics = Arc::new(Metrics::new()?);
    let readiness = Arc::new(AtomicBool::new(false));
    let draining = Arc::new(AtomicBool::new(false));
    {
        let health_bind = config.health_bind.clone();
        let health_logger = logger.clone();
        let state = health::HealthState {
            readiness: readiness.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            metrics: metrics.clone(),
            draining: draining.clone(),
        };
        tokio::spawn(async move {
            health_logger.info(&format!("Health server listening on {}", health_bind), None);
            if let Err(e) = health::start_server(health_bind, state).await {
                health_logger.error(&format!("Health server crashed: {}", e), None);
                std::process::exit(1);
            }
        });
    }

    // 4. Connect to the store; any failure here is fatal
    let store = match store::open(&config).await {
        Ok(s) => s,
        Err(e) => {
            logger.error("Store connectivity check failed", Some(&json!({
                "database_url": config.database_url,
                "error": e.to_string(),
            })));
            return Err(e.into());
        }
    };
    logger.info("Store ready", Some(&json!({"backend": store.backend()})));
    readiness.store(true, Ordering::SeqCst);

    // 5. Serve the API until a shutdown signal arrives
    let state = AppState::new(store.clone(), logger.clone(), metrics.clone(), config.legacy_pagination);
    let app = router::build_router(state);
    let listener = TcpListener::bind(&config.api_bind).await?;
    logger.info(&format!("API listening on {}", config.api_bind), None);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(logger.clone(), readiness.clone(), draining.clone()))
        .await?;

    store.close().await;
    logger.info("Mod catalog stopped", None);

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM after flipping the service to draining.
async fn shutdown_signal(logger: Logger, readiness: Arc<AtomicBool>, draining: Arc<AtomicBool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger.error(&format!("Failed to install Ctrl-C handler: {}", e), None);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => { s.recv().await; }
            Err(e) => logger.error(&format!("Failed to install SIGTERM handler: {}", e), None),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    readiness.store(false, Ordering::SeqCst);
    draining.store(true, Ordering::SeqCst);
    logger.info("Shutdown signal received, draining in-flight requests", None);
}
