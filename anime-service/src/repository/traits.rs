//! Repository trait definitions
//!
//! Single-record operations use RPITIT (Return Position Impl Trait In Traits).
//! Multi-record operations return a boxed [`RecordStream`] so callers can
//! consume results lazily and stop early.

use std::future::{ready, Future};

use futures::stream::{self, BoxStream, StreamExt};

use super::error::RepositoryError;
use crate::model::Anime;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Lazy, possibly empty sequence of records
///
/// An `Err` item is terminal; stores never yield records after one.
pub type RecordStream = BoxStream<'static, RepositoryResult<Anime>>;

/// Persistent store for [`Anime`] records
///
/// # Example
///
/// ```rust,ignore
/// use anime_service::repository::{AnimeRepository, InMemoryAnimeRepository};
///
/// let repo = InMemoryAnimeRepository::new();
/// let saved = repo.save(Anime::new("Monster")).await?;
/// assert!(saved.id.is_some());
/// ```
pub trait AnimeRepository: Send + Sync + 'static {
    /// Find a record by its identifier
    ///
    /// Returns `Ok(None)` when no record has that id.
    fn find_by_id(&self, id: i32) -> impl Future<Output = RepositoryResult<Option<Anime>>> + Send;

    /// Stream every stored record
    fn find_all(&self) -> RecordStream;

    /// Insert or update a record
    ///
    /// A record whose id is absent or `0` is inserted and receives a fresh id.
    /// Any other id updates the existing row, failing when none exists.
    fn save(&self, anime: Anime) -> impl Future<Output = RepositoryResult<Anime>> + Send;

    /// Save every record, yielding them in input order with ids assigned
    fn save_all(&self, animes: Vec<Anime>) -> RecordStream;

    /// Delete a record by its id
    fn delete(&self, anime: Anime) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Check that the backing store is reachable
    fn ping(&self) -> impl Future<Output = RepositoryResult<()>> + Send {
        ready(Ok(()))
    }
}

/// Turn a future resolving to a batch of records into a [`RecordStream`]
///
/// The future is not polled until the stream is.
pub fn records_from<F>(batch: F) -> RecordStream
where
    F: Future<Output = RepositoryResult<Vec<Anime>>> + Send + 'static,
{
    stream::once(batch)
        .map(|result| match result {
            Ok(records) => stream::iter(records.into_iter().map(Ok)).left_stream(),
            Err(err) => stream::once(ready(Err(err))).right_stream(),
        })
        .flatten()
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    struct EmptyRepository;

    impl AnimeRepository for EmptyRepository {
        async fn find_by_id(&self, _id: i32) -> RepositoryResult<Option<Anime>> {
            Ok(None)
        }

        fn find_all(&self) -> RecordStream {
            stream::empty().boxed()
        }

        async fn save(&self, anime: Anime) -> RepositoryResult<Anime> {
            Ok(anime)
        }

        fn save_all(&self, animes: Vec<Anime>) -> RecordStream {
            records_from(async move { Ok(animes) })
        }

        async fn delete(&self, _anime: Anime) -> RepositoryResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_ping_succeeds() {
        assert!(EmptyRepository.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_records_from_preserves_order() {
        let records = vec![Anime::with_id(2, "b"), Anime::with_id(1, "a")];
        let collected: Vec<Anime> = EmptyRepository
            .save_all(records.clone())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(collected, records);
    }

    #[tokio::test]
    async fn test_records_from_yields_single_error() {
        let items: Vec<_> = records_from(async {
            Err(RepositoryError::connection_failed("refused"))
        })
        .collect()
        .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[tokio::test]
    async fn test_records_from_is_lazy() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let stream = records_from(async move {
            flag.store(true, Ordering::SeqCst);
            Ok(vec![])
        });
        assert!(!polled.load(Ordering::SeqCst));
        drop(stream);
        assert!(!polled.load(Ordering::SeqCst));
    }
}
