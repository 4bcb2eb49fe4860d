//! HTTP route handlers grouped by resource.
//!
//! Handlers are annotated with `#[openapi]` so `rocket_okapi` can derive the
//! OpenAPI document. User registration and login live in
//! [`crate::auth::routes`].

pub mod comments;
pub mod health;
pub mod offers;
pub mod params;
