use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::{AppConfig, StoreKind};
use crate::users::{
    memory::InMemoryUserStore,
    password::{Argon2Hasher, PasswordHasher},
    repo::{PgUserStore, UserStore},
};

/// Creates the `users` table and its unique email index. Startup must not
/// continue without them.
pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match (config.store, &config.database) {
            (StoreKind::Postgres, Some(database)) => {
                let db = PgPoolOptions::new()
                    .max_connections(database.max_connections)
                    .connect(&database.url)
                    .await
                    .context("connect to database")?;

                run_migrations(&db).await?;

                Arc::new(PgUserStore::new(db))
            }
            (StoreKind::Postgres, None) => {
                anyhow::bail!("postgres store selected without database settings")
            }
            (StoreKind::Memory, _) => {
                tracing::warn!("using in-memory user store; data is lost on shutdown");
                Arc::new(InMemoryUserStore::new())
            }
        };

        Ok(Self::from_parts(store, Arc::new(Argon2Hasher), Arc::new(config)))
    }

    pub fn from_parts(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            hasher,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(true)
    }

    #[cfg(test)]
    pub fn fake_with(expose_password_hash: bool) -> Self {
        let config = AppConfig {
            store: StoreKind::Memory,
            database: None,
            host: "127.0.0.1".into(),
            port: 0,
            expose_password_hash,
        };
        Self::from_parts(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(Argon2Hasher),
            Arc::new(config),
        )
    }
}
