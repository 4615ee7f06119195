use std::sync::Arc;

use anyhow::Context;

use imovia::auth;
use imovia::config::{AppConfig, SessionBackend};
use imovia::entities::User;
use imovia::session::{MemorySessionStore, PostgresSessionStore, SessionStore, SqliteSessionStore};
use imovia::state::AppState;
use imovia::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imovia=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "starting imovia ({:?}, storage={:?})",
        config.environment,
        config.storage.backend
    );

    let storage = Arc::new(
        Storage::from_config(&config.storage)
            .await
            .context("failed to initialize storage")?,
    );
    let sessions = build_session_store(&config, &storage)
        .await
        .context("failed to initialize session store")?;
    bootstrap_admin(&config, &storage).await?;

    let port = config.http.port;
    let state = AppState {
        config: Arc::new(config),
        storage,
        sessions,
    };
    let app = imovia::router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn build_session_store(
    config: &AppConfig,
    storage: &Arc<Storage>,
) -> anyhow::Result<Arc<dyn SessionStore>> {
    match config.session.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        SessionBackend::Sql => match storage.as_ref() {
            Storage::Sqlite(s) => Ok(Arc::new(SqliteSessionStore::new(s.pool().clone()).await?)),
            Storage::Postgres(s) => {
                Ok(Arc::new(PostgresSessionStore::new(s.pool().clone()).await?))
            }
            Storage::Memory(_) => {
                tracing::warn!(
                    "sql session store needs a sql storage backend, using memory sessions"
                );
                Ok(Arc::new(MemorySessionStore::new()))
            }
        },
    }
}

/// Create the initial operator account when credentials are configured and
/// no account with that email exists yet.
async fn bootstrap_admin(config: &AppConfig, storage: &Storage) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin.email, &config.admin.password) else {
        tracing::info!("admin bootstrap credentials not configured, skipping");
        return Ok(());
    };

    if storage.find_user_by_email(email).await?.is_some() {
        return Ok(());
    }

    let hash = auth::hash_password(password)?;
    let user = User::new(email.clone(), "Administrator", hash);
    storage.insert(&user).await?;
    tracing::info!("created bootstrap admin account {}", email);
    Ok(())
}
