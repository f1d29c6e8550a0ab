//! Anime business operations
//!
//! Wraps an [`AnimeRepository`] with existence checks, not-found
//! translation and batch validation.

use std::future::ready;
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt, TryStreamExt};

use crate::error::{Error, Result};
use crate::model::Anime;
use crate::repository::AnimeRepository;

/// Message of the error raised when an id has no record
pub const ANIME_NOT_FOUND: &str = "Anime not found";

/// Message of the error raised when a batch item has an empty name
pub const INVALID_NAME: &str = "Invalid Name";

/// Stream of records produced by the service
pub type AnimeStream = BoxStream<'static, Result<Anime>>;

/// Anime operations over a shared store
pub struct AnimeService<R> {
    repository: Arc<R>,
}

impl<R> Clone for AnimeService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R: AnimeRepository> AnimeService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Stream every stored record in store order
    pub fn find_all(&self) -> AnimeStream {
        self.repository.find_all().map_err(Error::from).boxed()
    }

    /// Fetch one record, failing with `NotFound` when absent
    pub async fn find_by_id(&self, id: i32) -> Result<Anime> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(ANIME_NOT_FOUND.to_string()))
    }

    pub async fn save(&self, anime: Anime) -> Result<Anime> {
        let saved = self.repository.save(anime).await?;
        tracing::debug!(anime_id = ?saved.id, "Anime saved");
        Ok(saved)
    }

    /// Persist every record, then check each stored record's name
    ///
    /// Records are validated as the store emits them. Those emitted before
    /// the first empty name reach the caller; the stream then yields
    /// `BadRequest` and ends.
    pub fn save_all(&self, animes: Vec<Anime>) -> AnimeStream {
        tracing::debug!(count = animes.len(), "Saving anime batch");
        self.repository
            .save_all(animes)
            .map_err(Error::from)
            .and_then(|anime| ready(require_name(anime)))
            .scan(false, |failed, item| {
                if *failed {
                    return ready(None);
                }
                *failed = item.is_err();
                ready(Some(item))
            })
            .boxed()
    }

    /// Replace a stored record in full
    pub async fn update(&self, anime: Anime) -> Result<()> {
        let id = anime
            .id
            .ok_or_else(|| Error::NotFound(ANIME_NOT_FOUND.to_string()))?;
        self.find_by_id(id).await?;
        self.repository.save(anime).await?;
        tracing::debug!(anime_id = id, "Anime updated");
        Ok(())
    }

    /// Delete the record with the given id
    pub async fn delete(&self, id: i32) -> Result<()> {
        let found = self.find_by_id(id).await?;
        self.repository.delete(found).await?;
        tracing::debug!(anime_id = id, "Anime deleted");
        Ok(())
    }
}

fn require_name(anime: Anime) -> Result<Anime> {
    if anime.has_name() {
        Ok(anime)
    } else {
        tracing::warn!(anime_id = ?anime.id, "Stored anime has an empty name");
        Err(Error::BadRequest(INVALID_NAME.to_string()))
    }
}
