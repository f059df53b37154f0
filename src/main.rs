use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use token_authority::auth::{spawn_revocation_sweeper, PgCredentialStore, TokenAuthority};
use token_authority::configuration::get_configuration;
use token_authority::session::SessionManager;
use token_authority::startup::run;
use token_authority::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let authority = match TokenAuthority::new(&configuration.token) {
        Ok(authority) => Arc::new(authority),
        Err(e) => {
            tracing::error!("Invalid token settings: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Token configuration error",
            ));
        }
    };

    let _sweeper = spawn_revocation_sweeper(
        authority.revocations(),
        authority.clock(),
        Duration::from_secs(configuration.token.prune_interval_seconds),
    );
    tracing::info!(
        max_age_seconds = authority.max_age(),
        prune_interval_seconds = configuration.token.prune_interval_seconds,
        "Token authority ready"
    );

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;
    tracing::info!("Database connection pool created successfully");

    let session = SessionManager::new(
        authority,
        Arc::new(PgCredentialStore::new(pool)),
        configuration.cookie.name.clone(),
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, session, configuration.cookie)?;
    server.await
}
