use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use tournament_backend::config::settings::{get_config, Settings};
use tournament_backend::db::{MemoryGateway, PersistenceGateway, PgGateway};
use tournament_backend::run;
use tournament_backend::services::MinIOService;
use tournament_backend::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> io::Result<()> {
    let Settings { database, application, jwt, admin, storage } =
        get_config().map_err(|e| io::Error::other(format!("Failed to read the config: {e}")))?;

    let subscriber = get_subscriber(
        "tournament-backend".into(),
        application.log_level.clone(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    if !admin.login_enabled() {
        tracing::warn!("No admin password hash configured, the admin console is locked");
    }

    let gateway: Arc<dyn PersistenceGateway> = if database.in_memory {
        tracing::warn!("Serving from the in-memory store, nothing will be persisted");
        Arc::new(MemoryGateway::new())
    } else {
        // Only try to establish connection when actually used
        let connection_pool = PgPoolOptions::new()
            .max_connections(16)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect_lazy(database.connection_string().expose_secret())
            .map_err(|e| io::Error::other(format!("Failed to create Postgres connection pool: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&connection_pool)
            .await
            .map_err(|e| io::Error::other(format!("Failed to migrate the database: {e}")))?;

        Arc::new(PgGateway::new(connection_pool))
    };

    let minio_service = match storage {
        Some(storage) => match MinIOService::new(storage).await {
            Ok(service) => Some(service),
            Err(e) => {
                tracing::error!("Logo storage unavailable, uploads disabled: {}", e);
                None
            }
        },
        None => {
            tracing::info!("No storage configured, logo uploads disabled");
            None
        }
    };

    let address = format!("{}:{}", application.host, application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Listening on {}", address);

    run(
        listener,
        gateway,
        jwt,
        admin,
        minio_service,
        application.allowed_origins,
    )?
    .await
}
