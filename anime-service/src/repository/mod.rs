//! Anime persistence
//!
//! - [`AnimeRepository`]: the store abstraction the service is written against
//! - [`InMemoryAnimeRepository`]: process-local store, used when no database is configured
//! - `PgAnimeRepository`: PostgreSQL store (requires the `database` feature)

mod error;
mod memory;
#[cfg(feature = "database")]
mod postgres;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::InMemoryAnimeRepository;
#[cfg(feature = "database")]
pub use postgres::PgAnimeRepository;
pub use traits::{records_from, AnimeRepository, RecordStream, RepositoryResult};
