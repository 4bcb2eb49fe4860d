//! Helpers shared by unit tests and the `tests/` integration suite.

use rocket::config::LogLevel;
use rocket::figment::Figment;
use rocket::local::asynchronous::Client as AsyncClient;
use rocket::local::blocking::Client;
use rocket::{Build, Rocket, Route};

use crate::auth::{AuthState, JwtService, PasswordService};
use crate::repository::Repositories;

pub mod database;
pub mod fixtures;
pub mod memory;

pub use database::{TestDatabase, TestDatabaseError};
pub use fixtures::{sample_offer, sample_tsv_line, sample_user, tsv_fixture};
pub use memory::{MemoryDatabaseClient, MemoryStore};

pub const TEST_SALT: &str = "test-salt";
pub const TEST_JWT_SECRET: &str = "super-secret-test-key";

/// Builder for constructing Rocket instances tailored for integration tests.
#[derive(Default)]
pub struct TestRocketBuilder {
    figment: Figment,
    mounts: Vec<(String, Vec<Route>)>,
    repositories: Option<Repositories>,
    auth: Option<AuthState>,
}

impl TestRocketBuilder {
    /// Start a builder with sensible defaults: random port, logging disabled.
    pub fn new() -> Self {
        let figment = rocket::Config::figment()
            .merge(("port", 0))
            .merge(("log_level", LogLevel::Off))
            .merge(("cli_colors", false));

        Self {
            figment,
            ..Default::default()
        }
    }

    /// Mount routes under `/api/v1`.
    pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
        self.mounts.push(("/api/v1".to_string(), routes));
        self
    }

    /// Manage services backed by `repositories`, with the test salt and JWT secret.
    pub fn manage_repositories(mut self, repositories: Repositories) -> Self {
        self.repositories = Some(repositories);
        self.auth = Some(AuthState::new(
            PasswordService::new(TEST_SALT),
            JwtService::new(TEST_JWT_SECRET, 3600),
        ));
        self
    }

    pub fn manage_memory_store(self, store: &MemoryStore) -> Self {
        self.manage_repositories(store.repositories())
    }

    /// Finish building the Rocket instance.
    pub fn build(self) -> Rocket<Build> {
        let mut rocket = rocket::custom(self.figment).register("/", crate::catchers());

        for (base, routes) in self.mounts {
            rocket = rocket.mount(base, routes);
        }

        if let Some(repositories) = self.repositories {
            rocket = crate::manage_services(rocket, repositories);
        }
        if let Some(auth) = self.auth {
            rocket = rocket.manage(auth);
        }

        rocket
    }

    /// Convenience helper to produce a blocking local client.
    pub fn blocking_client(self) -> Client {
        Client::tracked(self.build()).expect("valid Rocket instance")
    }

    /// Convenience helper to produce an asynchronous local client.
    pub async fn async_client(self) -> AsyncClient {
        AsyncClient::tracked(self.build())
            .await
            .expect("valid Rocket instance")
    }
}
