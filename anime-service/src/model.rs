//! Domain model

use serde::{Deserialize, Serialize};

/// An anime record
///
/// `id` is assigned by the store on first save. Records arriving over HTTP may
/// omit either field; validation of `name` happens at the handler and service
/// boundaries rather than during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Anime {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub name: String,
}

impl Anime {
    /// Create an unsaved record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Create a record with a known identifier
    pub fn with_id(id: i32, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    /// Whether saving this record inserts a new row
    ///
    /// An id of `0` is treated the same as a missing id.
    pub fn is_new(&self) -> bool {
        matches!(self.id, None | Some(0))
    }

    /// Whether the name is non-empty
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}
