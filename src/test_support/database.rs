//! Ephemeral Postgres databases for repository tests.
//!
//! `TEST_DATABASE_URL` points at a server the tests may create databases on.
//! With `TEST_DATABASE_CONTAINER=1` a disposable Postgres container is started
//! instead. Without either, [`TestDatabaseError::MissingUrl`] is returned and
//! callers skip.

use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::{
    ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
};
use thiserror::Error;
use tokio::runtime::Handle;
use uuid::Uuid;

use crate::db::run_migrations;
use crate::repository::PersistenceError;

#[derive(Debug, Error)]
pub enum TestDatabaseError {
    #[error("TEST_DATABASE_URL not set")]
    MissingUrl,
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] PersistenceError),
    #[error("container error: {0}")]
    Container(#[from] TestcontainersError),
}

pub struct TestDatabase {
    pool: Option<PgPool>,
    admin_options: PgConnectOptions,
    database_name: String,
    container: Option<ContainerAsync<Postgres>>,
}

impl TestDatabase {
    pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
        if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
            return Self::provision(&url, None).await;
        }

        let use_container = std::env::var("TEST_DATABASE_CONTAINER")
            .map(|value| value == "1")
            .unwrap_or(false);
        if !use_container {
            return Err(TestDatabaseError::MissingUrl);
        }

        let container = Postgres::default().start().await?;
        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;
        let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
        Self::provision(&url, Some(container)).await
    }

    async fn provision(
        admin_url: &str,
        container: Option<ContainerAsync<Postgres>>,
    ) -> Result<Self, TestDatabaseError> {
        let base_options: PgConnectOptions = admin_url.parse()?;
        let base_options = base_options.log_statements(LevelFilter::Off);
        let admin_options = base_options.clone().database("postgres");

        let admin_pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(admin_options.clone())
            .await?;

        let database_name = format!("offers_test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!(
            "CREATE DATABASE \"{}\" TEMPLATE template0",
            database_name
        ))
        .execute(&admin_pool)
        .await?;
        admin_pool.close().await;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(base_options.database(&database_name))
            .await?;
        run_migrations(&pool).await?;

        Ok(Self {
            pool: Some(pool),
            admin_options,
            database_name,
            container,
        })
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref().expect("test database pool is available")
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool().clone()
    }

    /// Close pool connections and drop the ephemeral database.
    pub async fn close(mut self) -> Result<(), TestDatabaseError> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }

        drop_database_with_fallback(self.admin_options.clone(), &self.database_name).await?;

        if let Some(container) = self.container.take() {
            drop(container);
        }
        Ok(())
    }
}

async fn drop_database_with_fallback(
    admin_options: PgConnectOptions,
    database_name: &str,
) -> Result<(), sqlx::Error> {
    let admin_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(admin_options)
        .await?;

    let drop_force = format!("DROP DATABASE \"{}\" WITH (FORCE)", database_name);
    match sqlx::query(&drop_force).execute(&admin_pool).await {
        Ok(_) => Ok(()),
        Err(err) if force_drop_unsupported(&err) => {
            let drop_sql = format!("DROP DATABASE \"{}\"", database_name);
            sqlx::query(&drop_sql).execute(&admin_pool).await?;
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn force_drop_unsupported(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err
                .code()
                .map(|code| code == "42601" || code == "0A000")
                .unwrap_or(false)
    )
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let admin_options = self.admin_options.clone();
            let database_name = self.database_name.clone();
            if let Ok(handle) = Handle::try_current() {
                handle.spawn(async move {
                    pool.close().await;
                    let _ = drop_database_with_fallback(admin_options, &database_name).await;
                });
            }
        }
    }
}
