//! In-process anime store
//!
//! Used when no database is configured and in tests. Records live in a
//! `BTreeMap` so `find_all` yields them in id order, like the SQL store.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{records_from, AnimeRepository, RecordStream, RepositoryResult};
use crate::model::Anime;

#[derive(Debug)]
struct Table {
    rows: BTreeMap<i32, Anime>,
    next_id: i32,
}

impl Table {
    fn write(&mut self, mut anime: Anime) -> RepositoryResult<Anime> {
        match anime.id {
            Some(id) if !anime.is_new() => {
                let row = self.rows.get_mut(&id).ok_or_else(|| {
                    RepositoryError::not_found("Anime", id.to_string())
                })?;
                *row = anime.clone();
            }
            _ => {
                let id = self.next_id;
                self.next_id += 1;
                anime.id = Some(id);
                self.rows.insert(id, anime.clone());
            }
        }
        Ok(anime)
    }
}

/// Anime store backed by process memory
#[derive(Debug, Clone)]
pub struct InMemoryAnimeRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryAnimeRepository {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Seed the store with records that already carry ids
    ///
    /// Records without an id are assigned one as if saved.
    pub fn with_records(records: impl IntoIterator<Item = Anime>) -> Self {
        let mut rows = BTreeMap::new();
        let mut pending = Vec::new();
        for anime in records {
            match anime.id {
                Some(id) if !anime.is_new() => {
                    rows.insert(id, anime);
                }
                _ => pending.push(anime),
            }
        }
        let next_id = rows.keys().next_back().map_or(1, |max| max + 1);
        let mut table = Table { rows, next_id };
        for anime in pending {
            // New records never fail to insert.
            let _ = table.write(anime);
        }
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryAnimeRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimeRepository for InMemoryAnimeRepository {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Anime>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    fn find_all(&self) -> RecordStream {
        let table = self.table.clone();
        records_from(async move { Ok(table.read().await.rows.values().cloned().collect()) })
    }

    async fn save(&self, anime: Anime) -> RepositoryResult<Anime> {
        self.table.write().await.write(anime)
    }

    fn save_all(&self, animes: Vec<Anime>) -> RecordStream {
        let table = self.table.clone();
        records_from(async move {
            let mut guard = table.write().await;
            let snapshot = (guard.rows.clone(), guard.next_id);
            let mut saved = Vec::with_capacity(animes.len());
            for anime in animes {
                match guard.write(anime) {
                    Ok(anime) => saved.push(anime),
                    Err(err) => {
                        let (rows, next_id) = snapshot;
                        guard.rows = rows;
                        guard.next_id = next_id;
                        return Err(err.with_operation(RepositoryOperation::SaveAll));
                    }
                }
            }
            Ok(saved)
        })
    }

    async fn delete(&self, anime: Anime) -> RepositoryResult<()> {
        if let Some(id) = anime.id {
            self.table.write().await.rows.remove(&id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryErrorKind;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = InMemoryAnimeRepository::new();
        let first = repo.save(Anime::new("Naruto")).await.unwrap();
        let second = repo.save(Anime::with_id(0, "Bleach")).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_save_existing_replaces() {
        let repo = InMemoryAnimeRepository::with_records([Anime::with_id(5, "Old")]);
        repo.save(Anime::with_id(5, "New")).await.unwrap();

        let found = repo.find_by_id(5).await.unwrap();
        assert_eq!(found, Some(Anime::with_id(5, "New")));
    }

    #[tokio::test]
    async fn test_save_missing_id_fails() {
        let repo = InMemoryAnimeRepository::new();
        let err = repo.save(Anime::with_id(42, "Ghost")).await.unwrap_err();

        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_all_in_id_order() {
        let repo = InMemoryAnimeRepository::with_records([
            Anime::with_id(3, "c"),
            Anime::with_id(1, "a"),
            Anime::new("d"),
        ]);
        let all: Vec<Anime> = repo.find_all().try_collect().await.unwrap();
        let ids: Vec<_> = all.iter().filter_map(|a| a.id).collect();

        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[tokio::test]
    async fn test_save_all_is_all_or_nothing() {
        let repo = InMemoryAnimeRepository::with_records([Anime::with_id(1, "a")]);
        let result: RepositoryResult<Vec<Anime>> = repo
            .save_all(vec![Anime::new("b"), Anime::with_id(99, "missing")])
            .try_collect()
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::SaveAll);
        assert_eq!(repo.len().await, 1);

        let next = repo.save(Anime::new("c")).await.unwrap();
        assert_eq!(next.id, Some(2));
    }

    #[tokio::test]
    async fn test_save_all_keeps_input_order() {
        let repo = InMemoryAnimeRepository::new();
        let saved: Vec<Anime> = repo
            .save_all(vec![Anime::new("x"), Anime::new("y")])
            .try_collect()
            .await
            .unwrap();

        assert_eq!(saved, vec![Anime::with_id(1, "x"), Anime::with_id(2, "y")]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let repo = InMemoryAnimeRepository::with_records([Anime::with_id(1, "a")]);
        repo.delete(Anime::with_id(2, "b")).await.unwrap();
        repo.delete(Anime::with_id(1, "a")).await.unwrap();

        assert!(repo.is_empty().await);
    }
}
