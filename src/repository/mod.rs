//! Persistence seams for users, offers and comments.
//!
//! Services only ever talk to the traits defined here. The Postgres
//! implementations live in [`postgres`]; an in-memory implementation used by
//! tests lives in `crate::test_support`.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{Comment, NewComment, NewOffer, NewUser, Offer, User};

pub mod postgres;

pub use postgres::{PgCommentRepository, PgOfferRepository, PgUserRepository};

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("not connected to the database")]
    NotConnected,
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("stored record is invalid: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|code| code.into_owned());
                match code.as_deref() {
                    // unique, foreign key and check violations
                    Some("23505" | "23503" | "23514") => {
                        PersistenceError::Rejected(db_err.message().to_string())
                    }
                    _ => PersistenceError::Sqlx(sqlx::Error::Database(db_err)),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                PersistenceError::Unavailable(err.to_string())
            }
            other => PersistenceError::Sqlx(other),
        }
    }
}

#[rocket::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> PersistenceResult<Option<User>>;
    async fn find_by_id(&self, id: i32) -> PersistenceResult<Option<User>>;
    async fn insert(&self, user: NewUser) -> PersistenceResult<User>;
}

#[rocket::async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert(&self, offer: NewOffer) -> PersistenceResult<Offer>;
    async fn find_by_id(&self, id: i32) -> PersistenceResult<Option<Offer>>;
    /// Offers ordered by post date, newest first.
    async fn list(&self, limit: i64, offset: i64) -> PersistenceResult<Vec<Offer>>;
    async fn count(&self) -> PersistenceResult<i64>;
    /// Returns `true` when a row was removed.
    async fn delete(&self, id: i32) -> PersistenceResult<bool>;
}

#[rocket::async_trait]
pub trait CommentRepository: Send + Sync {
    /// Stores the comment and bumps the offer's comment count.
    async fn insert(&self, comment: NewComment) -> PersistenceResult<Comment>;
    async fn list_for_offer(&self, offer_id: i32, limit: i64) -> PersistenceResult<Vec<Comment>>;
}

/// Handles to every repository backed by one connection.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub offers: Arc<dyn OfferRepository>,
    pub comments: Arc<dyn CommentRepository>,
}
