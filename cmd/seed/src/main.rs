//! Fills a PostgreSQL database with demo users, boards and a comment thread.
//! Reads the same configuration as the server. Re-running skips users that
//! already exist but adds a fresh set of boards.

use std::sync::Arc;

use anyhow::{bail, Context};
use auth_adapters::{Argon2PasswordHasher, JwtSessionCodec};
use configs::{Settings, StorageBackend};
use domains::{DomainError, Session};
use secrecy::ExposeSecret;
use services::{AuthService, BoardService, CommentService};
use storage_adapters::{PgOptions, PgStore};
use tracing_subscriber::EnvFilter;

const PASSWORD: &str = "password1234";
const USERS: [(&str, &str); 3] = [
    ("alice", "alice@example.com"),
    ("bob", "bob@example.com"),
    ("carol", "carol@example.com"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load().context("failed to load configuration")?;
    if settings.database.backend != StorageBackend::Postgres {
        bail!("seeding needs database.backend = \"postgres\"");
    }
    let url = settings.database.url.as_ref().context("database.url is not set")?;

    let store = Arc::new(
        PgStore::connect(&PgOptions {
            url: url.expose_secret().to_owned(),
            max_connections: 2,
            acquire_timeout: settings.database.acquire_timeout(),
        })
        .await
        .context("failed to connect to PostgreSQL")?,
    );
    store.migrate().await.context("failed to run migrations")?;

    let auth = AuthService::new(
        store.clone(),
        store.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(JwtSessionCodec::new(
            settings.auth.session_secret.expose_secret().as_bytes(),
            chrono::Duration::hours(settings.auth.session_ttl_hours),
        )),
    );
    let boards = BoardService::new(store.clone());
    let comments = CommentService::new(store.clone(), store.clone());

    let mut sessions = Vec::with_capacity(USERS.len());
    for (username, email) in USERS {
        match auth.register(username, email, PASSWORD).await {
            Ok(user) => tracing::info!(user_id = %user.id, username, "user created"),
            Err(DomainError::Conflict(_)) => tracing::info!(username, "user exists, skipping"),
            Err(e) => return Err(e).context("failed to register user"),
        }
        let login = auth.login(email, PASSWORD).await.context("failed to log in")?;
        sessions.push(login.session);
    }

    seed_boards(&boards, &comments, &sessions).await?;
    tracing::info!(password = PASSWORD, "seed complete");
    Ok(())
}

async fn seed_boards(
    boards: &BoardService,
    comments: &CommentService,
    sessions: &[Session],
) -> anyhow::Result<()> {
    for (i, author) in sessions.iter().cycle().take(15).enumerate() {
        let title = format!("Demo post #{}", i + 1);
        let content = format!("Written by {} for local testing.", author.username);
        boards.create_board(author, &title, &content).await?;
    }

    let Some((first, rest)) = sessions.split_first() else {
        return Ok(());
    };
    let board = boards.create_board(first, "Welcome thread", "Say hello below.").await?;
    for (n, member) in rest.iter().enumerate() {
        let top = comments
            .create_comment(board.id, member, &format!("Hello from {}", member.username), None)
            .await?;
        let reply = format!("Welcome aboard, {} (#{})", member.username, n + 1);
        comments.create_comment(board.id, first, &reply, Some(top.comment.id)).await?;
    }
    Ok(())
}
