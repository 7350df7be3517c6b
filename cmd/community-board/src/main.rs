//! # Community Board Binary
//!
//! Assembles the application: configuration, tracing, storage, services and
//! the HTTP router.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, CookieSettings, Metrics};
use auth_adapters::{Argon2PasswordHasher, JwtSessionCodec};
use configs::{DatabaseSettings, LogFormat, LoggingSettings, Settings, StorageBackend};
use domains::{
    AccountRepository, BoardRepository, CommentRepository, UserRepository, VisitRepository,
};
use secrecy::ExposeSecret;
use services::{AuthService, BoardService, CommentService};
use storage_adapters::MemoryStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Every port, backed by one store.
struct Repositories {
    users: Arc<dyn UserRepository>,
    accounts: Arc<dyn AccountRepository>,
    boards: Arc<dyn BoardRepository>,
    comments: Arc<dyn CommentRepository>,
    visits: Arc<dyn VisitRepository>,
}

impl Repositories {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + AccountRepository
            + BoardRepository
            + CommentRepository
            + VisitRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            accounts: store.clone(),
            boards: store.clone(),
            comments: store.clone(),
            visits: store,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.logging);

    let repos = open_storage(&settings.database).await?;

    let ttl = chrono::Duration::hours(settings.auth.session_ttl_hours);
    let sessions = Arc::new(JwtSessionCodec::new(
        settings.auth.session_secret.expose_secret().as_bytes(),
        ttl,
    ));
    let auth = AuthService::new(
        repos.users.clone(),
        repos.accounts.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        sessions,
    );

    let state = AppState {
        auth: Arc::new(auth),
        boards: Arc::new(BoardService::new(repos.boards.clone())),
        comments: Arc::new(CommentService::new(repos.boards.clone(), repos.comments.clone())),
        visits: repos.visits.clone(),
        metrics: Arc::new(Metrics::new()),
        cookies: CookieSettings { secure: settings.auth.secure_cookies },
    };

    let addr = settings.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "community board listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

/// `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

async fn open_storage(database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    match database.backend {
        StorageBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
        }
        StorageBackend::Postgres => open_postgres(database).await,
    }
}

#[cfg(feature = "db-postgres")]
async fn open_postgres(database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    use storage_adapters::{PgOptions, PgStore};

    let url = database
        .url
        .as_ref()
        .context("database.url is required for the postgres backend")?;
    let store = PgStore::connect(&PgOptions {
        url: url.expose_secret().to_owned(),
        max_connections: database.max_connections,
        acquire_timeout: database.acquire_timeout(),
    })
    .await
    .context("failed to connect to PostgreSQL")?;

    if database.run_migrations {
        store.migrate().await.context("failed to run migrations")?;
        tracing::info!("migrations applied");
    }
    tracing::info!(max_connections = database.max_connections, "connected to PostgreSQL");
    Ok(Repositories::from_store(Arc::new(store)))
}

#[cfg(not(feature = "db-postgres"))]
async fn open_postgres(_database: &DatabaseSettings) -> anyhow::Result<Repositories> {
    anyhow::bail!("this build has no PostgreSQL support; enable the `db-postgres` feature")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
