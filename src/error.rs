use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use schemars::JsonSchema;
use serde::Serialize;
use std::io::Cursor;

use crate::auth::AuthError;
use crate::repository::PersistenceError;
use crate::services::ServiceError;
use crate::validation::FieldError;

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldError>),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Unavailable(String),
    InternalError(String),
}

#[derive(Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub details: Vec<FieldError>,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::Unavailable(_) => Status::ServiceUnavailable,
            ApiError::InternalError(_) => Status::InternalServerError,
        }
    }

    fn into_body(self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::Validation(details) => {
                log::debug!("validation failed: {} field(s)", details.len());
                ("ValidationError", "Validation error".to_string(), details)
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                ("NotFound", msg, Vec::new())
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                ("BadRequest", msg, Vec::new())
            }
            ApiError::Unauthorized(msg) => {
                log::debug!("unauthorized: {}", msg);
                ("Unauthorized", msg, Vec::new())
            }
            ApiError::Forbidden(msg) => {
                log::debug!("forbidden: {}", msg);
                ("Forbidden", msg, Vec::new())
            }
            ApiError::Conflict(msg) => {
                log::debug!("conflict: {}", msg);
                ("Conflict", msg, Vec::new())
            }
            ApiError::Unavailable(msg) => {
                log::error!("service unavailable: {}", msg);
                ("ServiceUnavailable", msg, Vec::new())
            }
            ApiError::InternalError(msg) => {
                log::error!("internal error: {}", msg);
                ("InternalError", msg, Vec::new())
            }
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let body = self.into_body();

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"errorType":"SerializationError","message":"Failed to serialize error","details":[]}"#
                .to_string()
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        for (code, description) in [
            ("400", "Malformed request or field validation failure."),
            ("401", "Missing, invalid or expired bearer token."),
            ("403", "The caller may not modify this resource."),
            ("404", "Resource not found."),
            ("409", "Resource already exists."),
            ("500", "Unexpected server error."),
            ("503", "Database unavailable."),
        ] {
            responses.responses.insert(
                code.to_owned(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_owned(),
                    ..Default::default()
                }),
            );
        }
        Ok(responses)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Unavailable(msg) => ApiError::Unavailable(msg),
            PersistenceError::NotConnected => {
                ApiError::Unavailable("database not connected".to_string())
            }
            PersistenceError::Rejected(msg) => ApiError::Conflict(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => ApiError::Validation(errors.into_fields()),
            ServiceError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::Persistence(err) => err.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            AuthError::Service(err) => err.into(),
            AuthError::Config(_) | AuthError::Jwt(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrors;

    #[test]
    fn service_errors_keep_their_status() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "short", "title too short");
        let api: ApiError = ServiceError::Validation(errors).into();
        assert_eq!(api.status(), Status::BadRequest);

        let api: ApiError = ServiceError::Persistence(PersistenceError::NotConnected).into();
        assert_eq!(api.status(), Status::ServiceUnavailable);

        let api: ApiError = AuthError::TokenExpired.into();
        assert_eq!(api.status(), Status::Unauthorized);
    }

    #[test]
    fn validation_body_carries_field_details() {
        let mut errors = ValidationErrors::new();
        errors.add("rating", 9, "rating must be between 1 and 5");
        let body = ApiError::Validation(errors.into_fields()).into_body();

        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["errorType"], "ValidationError");
        assert_eq!(json["details"][0]["property"], "rating");
        assert_eq!(json["details"][0]["value"], 9);
    }
}
