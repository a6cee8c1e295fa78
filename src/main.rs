use anyhow::Context;
use clap::Parser; // for cli
use guide_relay::{
    broadcast::Broadcaster, cache::CacheStore, config::Args, handlers, relay::Relay,
    state::AppState, telemetry,
};
use std::sync::Arc;
use tracing::{error, info};

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();
    telemetry::init(args.log_level, args.log_format)?;

    let cache = CacheStore::open(&args.database_url, args.max_connections)
        .await
        .with_context(|| format!("failed to open guide cache at {}", args.database_url))?;
    let relay = Relay::new(&args.upstream, args.connect_timeout())?;
    let broadcaster = Arc::new(Broadcaster::new());

    info!(
        upstream = %relay.default_upstream(),
        database = %args.database_url,
        connect_timeout_secs = args.connect_timeout,
        keepalive_secs = args.keepalive_interval,
        "configuration loaded"
    );

    // creating shared state
    let state = Arc::new(AppState {
        relay,
        cache,
        broadcaster: Arc::clone(&broadcaster),
        keepalive_interval: args.keepalive_interval(),
    });

    let app = handlers::router(state);

    let addr = args.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "relay listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(broadcaster))
        .await
        .context("server error")?;

    info!("relay stopped");
    Ok(())
}

// Waits for Ctrl-C or SIGTERM, then ends every open event stream so shutdown can finish
async fn shutdown_signal(broadcaster: Arc<Broadcaster>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
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

    let closed = broadcaster.close_all();
    info!(closed, "shutdown requested, event streams closed");
}
