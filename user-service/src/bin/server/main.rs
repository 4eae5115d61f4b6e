use std::sync::Arc;

use auth::Authenticator;
use auth::TokenSettings;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::ConnectOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use user_service::config::Config;
use user_service::inbound::http::cookies::RefreshCookie;
use user_service::inbound::http::router::create_router;
use user_service::repositories::PostgresUserRepository;
use user_service::AuthService;
use user_service::UserService;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::load()?;

    // Statement logging stays on outside production
    let default_filter = if config.environment.is_production() {
        "user_service=info,tower_http=info"
    } else {
        "user_service=debug,tower_http=debug,sqlx=debug"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "user-service",
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Service starting"
    );

    tracing::info!(
        database_host = %config.database.host,
        database_name = %config.database.name,
        http_port = config.server.http_port,
        access_ttl_seconds = config.tokens.access_ttl_seconds,
        refresh_ttl_seconds = config.tokens.refresh_ttl_seconds,
        "Configuration loaded"
    );

    let mut connect_options = PgConnectOptions::new()
        .host(&config.database.host)
        .port(config.database.port)
        .username(&config.database.user)
        .password(&config.database.password)
        .database(&config.database.name);
    if config.environment.is_production() {
        connect_options = connect_options.disable_statement_logging();
    }

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(connect_options)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(
        TokenSettings {
            secret: config.tokens.access_secret.as_bytes(),
            ttl: chrono::Duration::seconds(config.tokens.access_ttl_seconds),
        },
        TokenSettings {
            secret: config.tokens.refresh_secret.as_bytes(),
            ttl: chrono::Duration::seconds(config.tokens.refresh_ttl_seconds),
        },
    )?);

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let user_service = Arc::new(UserService::new(user_repository));
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_service),
        Arc::clone(&authenticator),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        user_service,
        auth_service,
        authenticator,
        RefreshCookie::new(
            config.tokens.refresh_ttl_seconds,
            config.environment.is_production(),
        ),
    );

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Gracefully shutting down");
        })
        .await?;

    Ok(())
}
