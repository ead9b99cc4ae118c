use mcp_workbench::{
    config::CONFIG,
    db::{self, DbActorArgs},
    server::router::{WorkbenchState, workbench_router},
};
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `.env` feeds provider env keys such as OPENAI_API_KEY.
    dotenvy::dotenv().ok();

    let cfg = &*CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let configured_providers: Vec<&str> = cfg.providers.entries.keys().map(String::as_str).collect();
    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        proxy = %cfg.providers.defaults.proxy.as_ref().map_or("<none>", |u| u.as_str()),
        providers = ?configured_providers,
        registry = %cfg.registry.url.as_ref().map_or("<builtin>", |u| u.as_str()),
        cache_enabled = cfg.cache.enabled,
        terminal = cfg.dev.enable_terminal,
        notebook = cfg.dev.enable_notebook,
    );
    if cfg.dev.enable_terminal {
        warn!("terminal execution is enabled; anyone holding the workbench key can run shell commands");
    }

    let db = db::spawn(DbActorArgs {
        database_url: cfg.basic.database_url.clone(),
        pool: cfg.database.clone(),
    })
    .await?;

    let state = WorkbenchState::new(db, cfg)?;
    let app = workbench_router(state);

    let addr = SocketAddr::from((cfg.basic.listen_addr, cfg.basic.listen_port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Ctrl+C received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}
