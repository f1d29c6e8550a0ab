//! Business operations

mod anime;

pub use anime::{AnimeService, AnimeStream, ANIME_NOT_FOUND, INVALID_NAME};
