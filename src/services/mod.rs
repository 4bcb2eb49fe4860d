//! Domain services sitting between the HTTP/CLI surfaces and the
//! repositories. Validation happens here, before any entity is built.

use rocket::http::Status;
use thiserror::Error;

use crate::repository::PersistenceError;
use crate::validation::ValidationErrors;

pub mod comments;
pub mod offers;
pub mod users;

pub use comments::CommentService;
pub use offers::OfferService;
pub use users::UserService;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl ServiceError {
    pub fn status(&self) -> Status {
        match self {
            ServiceError::Validation(_) => Status::BadRequest,
            ServiceError::NotFound(_) => Status::NotFound,
            ServiceError::Conflict(_) => Status::Conflict,
            ServiceError::Forbidden(_) => Status::Forbidden,
            ServiceError::Persistence(PersistenceError::Rejected(_)) => Status::Conflict,
            ServiceError::Persistence(PersistenceError::Unavailable(_))
            | ServiceError::Persistence(PersistenceError::NotConnected) => {
                Status::ServiceUnavailable
            }
            ServiceError::Persistence(_) => Status::InternalServerError,
        }
    }
}
