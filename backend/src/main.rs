//! Minimart backend server.

use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use minimart::{
    config::{Config, ConfigOverrides},
    create_app_with_router,
    mcp::{build_router, McpServer, TransportMode},
    state::AppState,
};

/// Minimart - MCP tool server for minimarket data and todos
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Session handling for /mcp: stateful or stateless
    #[arg(long, env = "MCP_TRANSPORT_MODE")]
    mode: Option<TransportMode>,

    /// Directory for the todos file
    #[arg(long, env = "MINIMART_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to the todos JSON file (overrides --data-dir)
    #[arg(long, env = "MINIMART_TODOS_PATH")]
    todos_path: Option<PathBuf>,

    /// PostgreSQL connection string; todos are stored there when set
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Keep todos in memory only
    #[arg(long)]
    in_memory: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_figment(ConfigOverrides {
        port: args.port,
        mode: args.mode,
        data_dir: args.data_dir,
        todos_path: args.todos_path,
        database_url: args.database_url,
        in_memory: args.in_memory,
        log_level: args.log_level,
    })?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config)?;

    info!("Starting Minimart server...");

    let storage = config.storage.open().await?;
    let state = AppState::with_storage(storage, config.llm.clone());
    if !state.prompt().is_configured() {
        info!("No LLM API key configured, POST /prompt will fail until one is set");
    }

    let mcp_router = build_router(config.mode, McpServer::new(state.clone()));
    let app = create_app_with_router(state, mcp_router.clone(), config.cors_allowed_origins);

    // Bind to 0.0.0.0 to be accessible from all interfaces
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    info!("MCP endpoint: http://localhost:{}/mcp", config.port);

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
        // Open push streams would otherwise keep connections from draining
        mcp_router.shutdown();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Install the global subscriber: stdout always, plus a non-blocking file
/// writer when `log_file` is configured.
fn init_logging(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match config.log_level {
        Some(ref level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_timer(UtcTime::new(Rfc3339))
        .compact();

    let (file_layer, guard) = match config.log_file {
        Some(ref path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_timer(UtcTime::new(Rfc3339))
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(ref path) = config.log_file {
        info!("Logging to file: {}", path.display());
    }
    Ok(guard)
}

fn open_log_file(path: &Path) -> anyhow::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(file)
}
