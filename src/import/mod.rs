//! Bulk offer import from TSV files.
//!
//! The pipeline has four parts:
//!
//! 1. **Line source** (`reader`) - pulls one non-blank line at a time from disk
//! 2. **Record parser** (`parser`) - turns a line into an [`OfferRecord`]
//! 3. **Entity upsert** - find-or-create the author, then create the offer
//!    (delegated to [`crate::services`])
//! 4. **Orchestration** (`command`) - connection lifecycle, per-line error
//!    recovery and the final summary
//!
//! Lines are processed strictly in file order; the next line is not read until
//! the previous one has been written.
//!
//! ```rust,ignore
//! let config = ImportConfig::new(credentials, salt);
//! let mut command = ImportCommand::new(PgDatabaseClient::new(), config);
//! let stats = command.execute(Path::new("mocks/offers.tsv")).await?;
//! println!("{} rows imported.", stats.imported);
//! ```

pub mod command;
pub mod parser;
pub mod reader;
pub mod stats;

pub use command::{
    DEFAULT_USER_PASSWORD, ImportCommand, ImportConfig, ImportError, ImportState, LineError,
};
pub use parser::{AuthorRecord, OfferRecord, ParseError, parse_offer};
pub use reader::{FileReadError, ReadEvent, TsvFileReader, TsvLines};
pub use stats::ImportStats;
