// Main entry point for the Lifusic account service

use lifusic_account::api::{create_router, AppState};
use lifusic_account::auth::password::BcryptPasswordEncoder;
use lifusic_account::auth::user_store::DbUserStore;
use lifusic_account::config::Config;
use lifusic_account::state::redis_store::RedisStore;

use sqlx::mysql::MySqlPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and validate configuration first (before any logging)
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing subscriber with config values
    init_tracing(&config)?;

    info!("Starting Lifusic account service");
    info!(
        bind_address = %config.bind_address,
        port = config.port,
        "Configuration loaded"
    );

    // 3. Initialize Redis token store
    let token_store = Arc::new(
        RedisStore::new(&config.redis_url, CONNECT_TIMEOUT)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to initialize Redis store");
                e
            })?,
    );

    info!("Redis store initialized");

    // 4. Initialize database pool and schema
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to database");
            e
        })?;

    let user_store = Arc::new(DbUserStore::new(
        db_pool,
        Duration::from_secs(config.user_cache_ttl_secs),
    ));
    user_store.ensure_schema().await?;

    info!("User store initialized");

    // 5. Password encoder
    let password_encoder = Arc::new(BcryptPasswordEncoder::new(config.bcrypt_cost));

    // 6. Create AppState
    let app_state = AppState::new(config.clone(), user_store, token_store, password_encoder)?;

    // 7. Create router
    let router = create_router(app_state);

    info!("Router created");

    // 8. Start HTTP server
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %addr, "Failed to bind to address");
            e
        })?;

    info!(addr = %addr, "Server listening on {}", addr);

    // ConnectInfo supplies the client address to the auth filter
    let make_service = router.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            e
        })?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL`.
fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    let installed = if config.log_format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| e as Box<dyn std::error::Error>)?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
