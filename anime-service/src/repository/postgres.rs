//! PostgreSQL anime store
//!
//! Backs onto the `anime` table created by [`crate::database::ensure_schema`].

use sqlx::{PgExecutor, PgPool};

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{records_from, AnimeRepository, RecordStream, RepositoryResult};
use crate::model::Anime;

const SELECT_BY_ID: &str = "SELECT id, name FROM anime WHERE id = $1";
const SELECT_ALL: &str = "SELECT id, name FROM anime ORDER BY id";
const INSERT: &str = "INSERT INTO anime (name) VALUES ($1) RETURNING id, name";
const UPDATE: &str = "UPDATE anime SET name = $2 WHERE id = $1 RETURNING id, name";
const DELETE: &str = "DELETE FROM anime WHERE id = $1";

/// Anime store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgAnimeRepository {
    pool: PgPool,
}

impl PgAnimeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Insert or update one record on any executor (pool or open transaction)
async fn write<'e, E>(executor: E, anime: Anime) -> RepositoryResult<Anime>
where
    E: PgExecutor<'e>,
{
    match anime.id {
        Some(id) if !anime.is_new() => sqlx::query_as::<_, Anime>(UPDATE)
            .bind(id)
            .bind(&anime.name)
            .fetch_optional(executor)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Save))?
            .ok_or_else(|| RepositoryError::not_found("Anime", id.to_string())),
        _ => sqlx::query_as::<_, Anime>(INSERT)
            .bind(&anime.name)
            .fetch_one(executor)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Save)),
    }
}

impl AnimeRepository for PgAnimeRepository {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Anime>> {
        sqlx::query_as::<_, Anime>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::FindById))
    }

    fn find_all(&self) -> RecordStream {
        let pool = self.pool.clone();
        records_from(async move {
            sqlx::query_as::<_, Anime>(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::FindAll))
        })
    }

    async fn save(&self, anime: Anime) -> RepositoryResult<Anime> {
        write(&self.pool, anime).await
    }

    fn save_all(&self, animes: Vec<Anime>) -> RecordStream {
        let pool = self.pool.clone();
        records_from(async move {
            let to_repo = |e: sqlx::Error| {
                RepositoryError::from(e).with_operation(RepositoryOperation::SaveAll)
            };
            let mut tx = pool.begin().await.map_err(to_repo)?;
            let mut saved = Vec::with_capacity(animes.len());
            for anime in animes {
                let anime = write(&mut *tx, anime)
                    .await
                    .map_err(|e| e.with_operation(RepositoryOperation::SaveAll))?;
                saved.push(anime);
            }
            tx.commit().await.map_err(to_repo)?;
            Ok(saved)
        })
    }

    async fn delete(&self, anime: Anime) -> RepositoryResult<()> {
        let Some(id) = anime.id else {
            return Ok(());
        };
        sqlx::query(DELETE)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Delete))?;
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Ping))?;
        Ok(())
    }
}
