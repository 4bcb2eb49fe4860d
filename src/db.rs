use std::sync::Arc;
use std::time::Duration;

use rocket_db_pools::Database;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::repository::{
    PersistenceError, PersistenceResult, PgCommentRepository, PgOfferRepository, PgUserRepository,
    Repositories,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Database)]
#[database("offers_db")]
pub struct OffersDb(PgPool);

pub async fn run_migrations(pool: &PgPool) -> PersistenceResult<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Build Postgres-backed repositories sharing one pool.
pub fn pg_repositories(pool: PgPool) -> Repositories {
    Repositories {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        offers: Arc::new(PgOfferRepository::new(pool.clone())),
        comments: Arc::new(PgCommentRepository::new(pool)),
    }
}

/// Connection lifecycle used by the bulk importer.
#[rocket::async_trait]
pub trait DatabaseClient: Send + Sync {
    async fn connect(&mut self, uri: &str) -> PersistenceResult<()>;
    async fn disconnect(&mut self) -> PersistenceResult<()>;
    /// Fails with [`PersistenceError::NotConnected`] before `connect`.
    fn repositories(&self) -> PersistenceResult<Repositories>;
}

#[derive(Debug, Default)]
pub struct PgDatabaseClient {
    pool: Option<PgPool>,
    max_connections: u32,
}

impl PgDatabaseClient {
    pub fn new() -> Self {
        Self {
            pool: None,
            max_connections: 2,
        }
    }
}

#[rocket::async_trait]
impl DatabaseClient for PgDatabaseClient {
    async fn connect(&mut self, uri: &str) -> PersistenceResult<()> {
        log::info!("trying to connect to the database");

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect(uri)
            .await
            .map_err(|err| PersistenceError::Unavailable(err.to_string()))?;

        run_migrations(&pool).await?;
        self.pool = Some(pool);

        log::info!("database connection established");
        Ok(())
    }

    async fn disconnect(&mut self) -> PersistenceResult<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            log::info!("database connection closed");
        }
        Ok(())
    }

    fn repositories(&self) -> PersistenceResult<Repositories> {
        self.pool
            .clone()
            .map(pg_repositories)
            .ok_or(PersistenceError::NotConnected)
    }
}
