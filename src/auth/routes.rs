use rocket::State;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{get, post};
use rocket_okapi::openapi;

use crate::auth::{AuthError, AuthState, AuthUser};
use crate::error::ApiError;
use crate::models::{CreateUser, LoginRequest, LoginResponse, User};
use crate::services::UserService;

#[openapi(tag = "Users")]
#[post("/users/register", data = "<payload>")]
pub async fn register(
    users: &State<UserService>,
    auth: &State<AuthState>,
    payload: Json<CreateUser>,
) -> Result<status::Custom<Json<User>>, ApiError> {
    let user = users
        .register(payload.into_inner(), auth.password_service.salt())
        .await?;
    Ok(status::Custom(Status::Created, Json(user)))
}

/// Exchange email and password for a bearer token.
#[openapi(tag = "Users")]
#[post("/users/login", data = "<payload>")]
pub async fn login(
    users: &State<UserService>,
    auth: &State<AuthState>,
    payload: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim();
    // passwords are hashed as given at registration, so they are not trimmed
    let password = payload.password.as_str();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = users
        .verify(email, password, &auth.password_service)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let token = auth.jwt_service.issue_access_token(&user)?;
    log::info!("user {} logged in", user.id);

    Ok(Json(LoginResponse {
        token: token.token,
        expires_at: token.expires_at,
        user,
    }))
}

/// The user owning the presented token.
#[openapi(tag = "Users")]
#[get("/users/login")]
pub async fn check_auth(user: AuthUser) -> Json<User> {
    Json(user.0)
}
