use std::sync::Arc;

use devjourney_backend::config::Config;
use devjourney_backend::db::{self, InMemoryRepository, PgRepository, Repository};
use devjourney_backend::logging::{init_tracing, LogOutput};
use devjourney_backend::state::AppState;
use devjourney_backend::workers::WorkerManager;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Arc::new(Config::from_env());
    let _log_guard = init_tracing(&config.log_level, &LogOutput::from_env());

    let db_proxy = match db::DatabaseProxy::from_env().await {
        Ok(proxy) => Some(proxy),
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized, using in-memory storage");
            None
        }
    };

    let repo: Arc<dyn Repository> = match db_proxy {
        Some(ref proxy) => Arc::new(PgRepository::new(Arc::clone(proxy))),
        None => Arc::new(InMemoryRepository::new()),
    };

    let pipeline = AppState::create_pipeline(&config, Arc::clone(&repo));

    let worker_manager =
        match WorkerManager::new(Arc::clone(&pipeline), config.learning_style.clone()).await {
            Ok(manager) => {
                if let Err(e) = manager.start().await {
                    tracing::error!(error = %e, "failed to start workers");
                }
                Some(manager)
            }
            Err(e) => {
                tracing::warn!(error = %e, "worker manager not initialized");
                None
            }
        };

    let state = AppState::new(Arc::clone(&config), repo, pipeline, db_proxy.clone());
    let app = devjourney_backend::create_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "bind listener failed");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "devjourney-backend listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped, initiating graceful shutdown sequence");

    if let Some(ref manager) = worker_manager {
        manager.stop().await;
    }

    if let Some(proxy) = db_proxy {
        proxy.close().await;
    }

    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
