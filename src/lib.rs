#[macro_use]
extern crate rocket;

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod repository;
pub mod request_logger;
pub mod routes;
pub mod services;
pub mod validation;

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support;

use crate::auth::{AuthState, JwtService, PasswordService};
use crate::config::AppConfig;
use crate::db::OffersDb;
use crate::error::ApiError;
use crate::repository::Repositories;
use crate::request_logger::RequestLogger;
use crate::services::{CommentService, OfferService, UserService};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::{Method, Status};
use rocket::{Build, Catcher, Request, Rocket, Route};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// All `/api/v1` routes plus the generated `openapi.json`.
pub fn api_routes() -> Vec<Route> {
    openapi_get_routes![
        // Health
        routes::health::health_check,
        // Users
        auth::routes::register,
        auth::routes::login,
        auth::routes::check_auth,
        // Offers
        routes::offers::list_offers,
        routes::offers::get_offer,
        routes::offers::create_offer,
        routes::offers::delete_offer,
        // Comments
        routes::comments::list_comments,
        routes::comments::create_comment,
    ]
}

#[catch(400)]
fn bad_request() -> ApiError {
    ApiError::BadRequest("Malformed request".to_string())
}

#[catch(401)]
fn unauthorized() -> ApiError {
    ApiError::Unauthorized("Missing or invalid bearer token".to_string())
}

#[catch(404)]
fn not_found(request: &Request<'_>) -> ApiError {
    ApiError::NotFound(format!("no route for {}", request.uri()))
}

#[catch(422)]
fn unprocessable() -> ApiError {
    ApiError::BadRequest("Request body does not match the expected shape".to_string())
}

#[catch(default)]
fn fallback(status: Status, _request: &Request<'_>) -> ApiError {
    match status.code {
        403 => ApiError::Forbidden("Forbidden".to_string()),
        503 => ApiError::Unavailable("Database unavailable".to_string()),
        _ => ApiError::InternalError(status.to_string()),
    }
}

/// JSON error catchers so guard failures share the handler error shape.
pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, unauthorized, not_found, unprocessable, fallback]
}

/// Put the domain services for `repositories` into Rocket state.
pub fn manage_services(rocket: Rocket<Build>, repositories: Repositories) -> Rocket<Build> {
    let Repositories {
        users,
        offers,
        comments,
    } = repositories;

    rocket
        .manage(UserService::new(users))
        .manage(CommentService::new(comments, offers.clone()))
        .manage(OfferService::new(offers))
}

pub fn rocket(config: AppConfig) -> Result<Rocket<Build>, rocket_cors::Error> {
    init_logger();

    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("databases.offers_db.url", config.database.uri()));

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()?;

    let auth = AuthState::new(
        PasswordService::new(config.salt.clone()),
        JwtService::new(&config.jwt_secret, config.jwt_ttl_secs),
    );

    Ok(rocket::custom(figment)
        .attach(RequestLogger)
        .attach(OffersDb::init())
        .attach(cors)
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite("Run Migrations", |rocket| async move {
            match OffersDb::fetch(&rocket) {
                Some(db) => match db::run_migrations(&**db).await {
                    Ok(_) => {
                        log::info!("database migrations successful");
                        Ok(rocket)
                    }
                    Err(e) => {
                        log::error!("database migrations failed: {}", e);
                        Err(rocket)
                    }
                },
                None => {
                    log::error!("database pool not available for migrations");
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite("Manage Services", |rocket| async move {
            match OffersDb::fetch(&rocket) {
                Some(db) => {
                    let repositories = db::pg_repositories((**db).clone());
                    Ok(manage_services(rocket, repositories))
                }
                None => Err(rocket),
            }
        }))
        .manage(auth)
        .register("/", catchers())
        .mount("/api/v1", api_routes())
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Offers API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        ))
}
