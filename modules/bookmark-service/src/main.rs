//! Bookmark Service — remembers where playback of each media item stopped.
//!
//! Bookmarks live in memory and are written to disk by a background flusher,
//! only when something changed.
//! Default: http://0.0.0.0:35248/

mod config;
mod flusher;
mod form;
mod persist;
mod routes;
mod store;

use config::Config;
use flusher::Flusher;
use persist::FileSink;
use routes::AppState;
use std::sync::Arc;
use std::time::Instant;
use store::BookmarkStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store = Arc::new(BookmarkStore::new());
    persist::hydrate(&store, &config.storage_path);

    let last_flush_at: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let shutdown = CancellationToken::new();

    let sink = FileSink::new(&config.storage_path);
    log::info!("Persisting bookmarks to: {}", sink.path().display());
    let flusher = Flusher::new(
        store.clone(),
        Arc::new(sink),
        config.flush_interval,
        last_flush_at.clone(),
    );
    let flusher_handle = tokio::spawn(flusher.run(shutdown.clone()));

    let state = Arc::new(AppState {
        store,
        start_time: Instant::now(),
        flush_interval: config.flush_interval,
        last_flush_at,
    });
    let app = routes::router(state);

    let addr = config.bind_addr();
    log::info!("Bookmark Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        log::error!("Server error: {}", e);
    }

    shutdown.cancel();
    if let Err(e) = flusher_handle.await {
        log::error!("Flusher task failed: {}", e);
    }
    log::info!("Bookmark Service stopped");
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    log::info!("Shutdown signal received");
}
