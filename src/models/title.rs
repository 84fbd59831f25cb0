use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Kind of title a progress record belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// A movie or TV show as known to the catalog service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    /// IMDB ID (e.g., "tt0944947")
    pub imdb_id: String,
    pub media_type: MediaType,
}

impl Title {
    /// Creates a title, rejecting an empty IMDB ID
    pub fn new(imdb_id: impl Into<String>, media_type: MediaType) -> AppResult<Self> {
        let imdb_id = imdb_id.into();
        if imdb_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "IMDB ID cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            imdb_id,
            media_type,
        })
    }

    pub fn tv(imdb_id: impl Into<String>) -> AppResult<Self> {
        Self::new(imdb_id, MediaType::Tv)
    }

    pub fn movie(imdb_id: impl Into<String>) -> AppResult<Self> {
        Self::new(imdb_id, MediaType::Movie)
    }

    pub fn is_tv(&self) -> bool {
        self.media_type == MediaType::Tv
    }
}

impl Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.imdb_id)
    }
}

/// Coordinate of one episode within a show
///
/// Field order gives the derived `Ord` season-major ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    pub season_number: u32,
    pub episode_number: u32,
}

impl EpisodeRef {
    pub const fn new(season_number: u32, episode_number: u32) -> Self {
        Self {
            season_number,
            episode_number,
        }
    }

    /// Creates a coordinate from user input, both numbers must be 1 or greater
    pub fn try_new(season_number: u32, episode_number: u32) -> AppResult<Self> {
        if season_number == 0 || episode_number == 0 {
            return Err(AppError::InvalidInput(format!(
                "Episode coordinates start at 1, got season {} episode {}",
                season_number, episode_number
            )));
        }
        Ok(Self::new(season_number, episode_number))
    }

    /// Key used by the optimistic cache, `"{season}-{episode}"`
    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.season_number, self.episode_number)
    }
}

impl Display for EpisodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}E{}", self.season_number, self.episode_number)
    }
}
