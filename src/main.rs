#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use steeple_push::adapters::database::devotional_repo::DevotionalRepository;
use steeple_push::adapters::database::user_repo::UserRepository;
use steeple_push::adapters::push::expo::ExpoPushGateway;
use steeple_push::api::{AppState, app_router};
use steeple_push::config::Config;
use steeple_push::services::dispatcher::NotificationDispatcher;
use steeple_push::services::store::{DevotionalStore, UserStore};
use steeple_push::services::token_cleanup::TokenCleanup;
use steeple_push::workers::DevotionalWorker;
use steeple_push::{adapters, telemetry};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    // Phase 1: Infrastructure
    let pool = adapters::database::init_pool(&config.database).await?;
    steeple_push::run_migrations(&pool).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    steeple_push::spawn_signal_handler(shutdown_tx.clone());

    // Phase 2: Component wiring
    let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
    let devotionals: Arc<dyn DevotionalStore> = Arc::new(DevotionalRepository::new(pool));
    let gateway = Arc::new(ExpoPushGateway::new(&config.gateway)?);
    let dispatcher = Arc::new(NotificationDispatcher::new(gateway, config.gateway.batch_size));
    let cleanup = TokenCleanup::new(Arc::clone(&users));

    let worker = DevotionalWorker::new(
        Arc::clone(&users),
        devotionals,
        Arc::clone(&dispatcher),
        cleanup,
        config.devotional.clone(),
    );
    let worker_task = tokio::spawn(worker.run(shutdown_rx.clone()));

    // Phase 3: HTTP relay
    let state = AppState { dispatcher, users };
    let router = app_router(state, Duration::from_secs(config.server.request_timeout_secs));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "listening");

    let mut serve_rx = shutdown_rx;
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = serve_rx.wait_for(|&stopping| stopping).await;
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "Server error");
    }

    // Phase 4: Graceful shutdown
    let _ = shutdown_tx.send(true);
    tokio::select! {
        _ = worker_task => {
            tracing::info!("Background tasks finished.");
        }
        () = tokio::time::sleep(Duration::from_secs(config.server.shutdown_timeout_secs)) => {
            tracing::warn!("Timeout waiting for background tasks to finish.");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
