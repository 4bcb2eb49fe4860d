//! Authentication: salted password hashing, token minting, the request
//! guard, and the user-facing login/registration routes.

use std::sync::Arc;

pub mod error;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod routes;

pub use error::{AuthError, AuthResult};
pub use guards::AuthUser;
pub use jwt::JwtService;
pub use passwords::{PasswordService, create_sha256};

#[derive(Clone)]
pub struct AuthState {
    pub password_service: Arc<PasswordService>,
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(password_service: PasswordService, jwt_service: JwtService) -> Self {
        Self {
            password_service: Arc::new(password_service),
            jwt_service: Arc::new(jwt_service),
        }
    }
}
