//! The `--import` command: stream a TSV file into the offers database.

use std::fmt;
use std::path::Path;
use std::str::Utf8Error;

use thiserror::Error;

use crate::config::DatabaseCredentials;
use crate::db::DatabaseClient;
use crate::import::parser::{ParseError, parse_offer};
use crate::import::reader::{FileReadError, ReadEvent, TsvFileReader};
use crate::import::stats::ImportStats;
use crate::models::Offer;
use crate::repository::PersistenceError;
use crate::services::{OfferService, ServiceError, UserService};

pub const DEFAULT_USER_PASSWORD: &str = "123456";

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub credentials: DatabaseCredentials,
    pub salt: String,
    /// Password given to authors created by the import.
    pub default_password: String,
}

impl ImportConfig {
    pub fn new(credentials: DatabaseCredentials, salt: impl Into<String>) -> Self {
        Self {
            credentials,
            salt: salt.into(),
            default_password: DEFAULT_USER_PASSWORD.to_string(),
        }
    }

    pub fn with_default_password(mut self, password: impl Into<String>) -> Self {
        self.default_password = password.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Failed,
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImportState::Idle => "idle",
            ImportState::Connecting => "connecting",
            ImportState::Streaming => "streaming",
            ImportState::Completed => "completed",
            ImportState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Errors that abort the whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not connect to the database: {0}")]
    Connection(#[source] PersistenceError),
    #[error(transparent)]
    FileRead(#[from] FileReadError),
}

/// Errors that only skip the current line.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("invalid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

pub struct ImportCommand<C: DatabaseClient> {
    client: C,
    config: ImportConfig,
    state: ImportState,
}

impl<C: DatabaseClient> ImportCommand<C> {
    pub fn new(client: C, config: ImportConfig) -> Self {
        Self {
            client,
            config,
            state: ImportState::Idle,
        }
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn transition(&mut self, next: ImportState) {
        log::debug!("import state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run the import for `path`.
    ///
    /// Malformed or rejected lines are logged and skipped. Only connection
    /// and file errors fail the run.
    pub async fn execute(&mut self, path: &Path) -> Result<ImportStats, ImportError> {
        self.transition(ImportState::Connecting);
        let uri = self.config.credentials.uri();
        if let Err(err) = self.client.connect(&uri).await {
            log::error!("database connection failed: {}", err);
            self.transition(ImportState::Failed);
            return Err(ImportError::Connection(err));
        }

        let result = self.stream(path).await;
        match &result {
            Ok(stats) => {
                log::info!("{} rows imported.", stats.imported);
                if stats.skipped > 0 {
                    log::info!("{} of {} lines skipped", stats.skipped, stats.lines);
                }
                self.transition(ImportState::Completed);
            }
            Err(err) => {
                log::error!("import aborted: {}", err);
                self.transition(ImportState::Failed);
            }
        }

        if let Err(err) = self.client.disconnect().await {
            log::error!("failed to close database connection: {}", err);
        }
        result
    }

    async fn stream(&mut self, path: &Path) -> Result<ImportStats, ImportError> {
        let repositories = self.client.repositories().map_err(ImportError::Connection)?;
        let users = UserService::new(repositories.users);
        let offers = OfferService::new(repositories.offers);

        let mut lines = TsvFileReader::new(path).open().await?;
        self.transition(ImportState::Streaming);
        log::info!("importing offers from {}", path.display());

        let mut stats = ImportStats::default();
        loop {
            match lines.next_event().await? {
                ReadEvent::Line { number, content } => {
                    match self.import_line(&users, &offers, &content).await {
                        Ok(offer) => {
                            log::debug!("line {}: imported offer {}", number, offer.id);
                            stats.record_imported();
                        }
                        Err(err) => {
                            log::error!("line {} skipped ({}): {}", number, err, content);
                            stats.record_skipped();
                        }
                    }
                }
                ReadEvent::Undecodable { number, error } => {
                    log::error!("line {} skipped ({})", number, LineError::from(error));
                    stats.record_skipped();
                }
                ReadEvent::End { lines } => {
                    log::debug!("reached end of {} after {} lines", path.display(), lines);
                    break;
                }
            }
        }
        Ok(stats)
    }

    async fn import_line(
        &self,
        users: &UserService,
        offers: &OfferService,
        line: &str,
    ) -> Result<Offer, LineError> {
        let record = parse_offer(line)?;
        let author = users
            .find_or_create(
                record.author_payload(&self.config.default_password),
                &self.config.salt,
            )
            .await?;
        Ok(offers.create(record.offer_payload(), author.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_sha256;
    use crate::test_support::{MemoryDatabaseClient, MemoryStore, sample_tsv_line, tsv_fixture};

    fn config() -> ImportConfig {
        ImportConfig::new(
            DatabaseCredentials {
                user: "admin".into(),
                password: "test".into(),
                host: "127.0.0.1".into(),
                port: 5432,
                name: "six-cities".into(),
            },
            "s1",
        )
    }

    #[tokio::test]
    async fn imports_every_line_with_a_shared_author() {
        let store = MemoryStore::new();
        let line = sample_tsv_line("keks@example.com");
        let fixture = tsv_fixture(&[line.as_str(), line.as_str(), line.as_str()]);

        let mut command = ImportCommand::new(MemoryDatabaseClient::new(store.clone()), config());
        assert_eq!(command.state(), ImportState::Idle);

        let stats = command.execute(fixture.path()).await.expect("import");

        assert_eq!(stats.imported, 3);
        assert_eq!(stats.skipped, 0);
        assert_eq!(store.offer_count(), 3);
        assert_eq!(store.user_count(), 1);
        assert_eq!(command.state(), ImportState::Completed);
        assert!(!command.client().is_connected());
        assert_eq!(command.client().disconnect_calls(), 1);
    }

    #[tokio::test]
    async fn imported_authors_get_the_default_password() {
        let store = MemoryStore::new();
        let line = sample_tsv_line("keks@example.com");
        let fixture = tsv_fixture(&[line.as_str()]);

        let mut command = ImportCommand::new(
            MemoryDatabaseClient::new(store.clone()),
            config().with_default_password("secret1"),
        );
        command.execute(fixture.path()).await.expect("import");

        let user = store.users_snapshot().pop().expect("user");
        assert_eq!(user.password_hash, create_sha256("secret1", "s1"));
    }

    #[tokio::test]
    async fn malformed_line_is_skipped() {
        let store = MemoryStore::new();
        let good = sample_tsv_line("keks@example.com");
        let bad = good.replacen("\t4.8\t", "\tgreat\t", 1);
        let other = sample_tsv_line("other@example.com");
        let fixture = tsv_fixture(&[good.as_str(), bad.as_str(), "", other.as_str()]);

        let mut command = ImportCommand::new(MemoryDatabaseClient::new(store.clone()), config());
        let stats = command.execute(fixture.path()).await.expect("import");

        assert_eq!(
            stats,
            ImportStats {
                lines: 3,
                imported: 2,
                skipped: 1
            }
        );
        assert_eq!(store.offer_count(), 2);
        assert_eq!(store.user_count(), 2);
        assert_eq!(command.state(), ImportState::Completed);
    }

    #[tokio::test]
    async fn line_failing_validation_is_skipped() {
        let store = MemoryStore::new();
        let line = sample_tsv_line("keks@example.com").replacen("\t320\t", "\t5\t", 1);
        let fixture = tsv_fixture(&[line.as_str()]);

        let mut command = ImportCommand::new(MemoryDatabaseClient::new(store.clone()), config());
        let stats = command.execute(fixture.path()).await.expect("import");

        assert_eq!(stats.imported, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.offer_count(), 0);
    }

    #[tokio::test]
    async fn undecodable_line_is_skipped() {
        use std::io::Write;

        let store = MemoryStore::new();
        let good = sample_tsv_line("keks@example.com");
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(good.as_bytes()).expect("write");
        file.write_all(b"\nbad\xff\xferow\n").expect("write");
        file.write_all(good.as_bytes()).expect("write");

        let mut command = ImportCommand::new(MemoryDatabaseClient::new(store.clone()), config());
        let stats = command.execute(file.path()).await.expect("import");

        assert_eq!(
            stats,
            ImportStats {
                lines: 3,
                imported: 2,
                skipped: 1
            }
        );
        assert_eq!(store.offer_count(), 2);
        assert_eq!(command.state(), ImportState::Completed);
    }

    #[tokio::test]
    async fn failed_write_skips_only_that_line() {
        let store = MemoryStore::new();
        store.fail_offer_insert(2);
        let first = sample_tsv_line("keks@example.com");
        let second = sample_tsv_line("other@example.com");
        let third = sample_tsv_line("third@example.com");
        let fixture = tsv_fixture(&[first.as_str(), second.as_str(), third.as_str()]);

        let mut command = ImportCommand::new(MemoryDatabaseClient::new(store.clone()), config());
        let stats = command.execute(fixture.path()).await.expect("import");

        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.offer_count(), 2);
        assert_eq!(command.state(), ImportState::Completed);
        assert_eq!(command.client().disconnect_calls(), 1);

        let authors: Vec<i32> = store.offers_snapshot().iter().map(|o| o.user_id).collect();
        let third_author = store
            .users_snapshot()
            .into_iter()
            .find(|u| u.email == "third@example.com")
            .expect("third author");
        assert_eq!(authors.last(), Some(&third_author.id));
    }

    #[tokio::test]
    async fn missing_file_fails_without_creating_entities() {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().expect("tempdir");

        let mut command = ImportCommand::new(MemoryDatabaseClient::new(store.clone()), config());
        let err = command.execute(&dir.path().join("a.tsv")).await.unwrap_err();

        assert!(matches!(err, ImportError::FileRead(_)));
        assert_eq!(command.state(), ImportState::Failed);
        assert_eq!(store.offer_count(), 0);
        assert_eq!(store.user_count(), 0);
        assert!(!command.client().is_connected());
    }

    #[tokio::test]
    async fn unreachable_database_is_fatal() {
        let store = MemoryStore::new();
        let line = sample_tsv_line("keks@example.com");
        let fixture = tsv_fixture(&[line.as_str()]);

        let mut command =
            ImportCommand::new(MemoryDatabaseClient::unreachable(store.clone()), config());
        let err = command.execute(fixture.path()).await.unwrap_err();

        assert!(matches!(err, ImportError::Connection(_)));
        assert_eq!(command.state(), ImportState::Failed);
        assert_eq!(store.offer_count(), 0);
        assert_eq!(command.client().disconnect_calls(), 0);
    }
}
