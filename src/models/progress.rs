use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EpisodeRef;

/// Server record of one episode's watched state
///
/// A missing record is equivalent to `is_watched = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeProgress {
    pub imdb_id: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub is_watched: bool,
}

impl EpisodeProgress {
    pub fn new(imdb_id: impl Into<String>, episode: EpisodeRef, is_watched: bool) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            season_number: episode.season_number,
            episode_number: episode.episode_number,
            is_watched,
        }
    }

    pub fn episode(&self) -> EpisodeRef {
        EpisodeRef::new(self.season_number, self.episode_number)
    }
}

/// Server record of a movie's watched state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovieProgress {
    pub imdb_id: String,
    pub is_watched: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Server-side aggregate for one show, as listed on the home and liked screens
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TvShowProgress {
    #[serde(default)]
    pub imdb_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub watched_episodes: u32,
    #[serde(default)]
    pub total_episodes: u32,
    #[serde(default)]
    pub total_seasons: Option<u32>,
    #[serde(default)]
    pub last_watched_season: Option<u32>,
    #[serde(default)]
    pub last_watched_episode: Option<u32>,
    #[serde(default)]
    pub is_fully_watched: bool,
    /// Episode count per season, index 0 is season 1
    #[serde(default)]
    pub episodes_per_season: Vec<u32>,
}

impl TvShowProgress {
    /// In progress means started but not finished
    pub fn is_in_progress(&self) -> bool {
        self.watched_episodes > 0 && !self.is_fully_watched
    }
}

/// Response of `GET /api/v1/progress/tv`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TvProgress {
    #[serde(default)]
    pub episodes: Vec<EpisodeProgress>,
    #[serde(default)]
    pub tv_show_progress: Option<TvShowProgress>,
}

impl TvProgress {
    pub fn episodes_per_season(&self) -> &[u32] {
        self.tv_show_progress
            .as_ref()
            .map(|p| p.episodes_per_season.as_slice())
            .unwrap_or(&[])
    }
}

/// Response of `GET /api/v1/progress/all`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOverview {
    #[serde(default)]
    pub movies: Vec<MovieProgress>,
    #[serde(default)]
    pub tv_shows: Vec<TvShowProgress>,
    #[serde(default)]
    pub episodes: Vec<EpisodeProgress>,
}

/// Derived progress of one season
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonProgressSummary {
    pub season_number: u32,
    pub total_episodes: u32,
    pub watched_episodes: u32,
    /// Fraction in `[0, 1]`
    pub progress: f64,
    pub is_watched: bool,
}

/// Derived progress of a whole show
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShowProgressSummary {
    pub total_seasons: u32,
    pub total_episodes: u32,
    pub watched_episodes: u32,
    pub last_watched: Option<EpisodeRef>,
    pub is_fully_watched: bool,
}

// ============================================================================
// Progress Store request bodies
// ============================================================================

/// Body of `PUT /api/v1/progress/episode`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeWriteRequest {
    pub imdb_id: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub is_watched: bool,
}

/// Body of `POST /api/v1/progress/mark-all-tv`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodesBatchWriteRequest {
    pub imdb_id: String,
    pub episodes: Vec<EpisodeRef>,
    pub is_watched: bool,
}

/// Body of `PUT /api/v1/progress/movie`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieWriteRequest {
    pub imdb_id: String,
    pub is_watched: bool,
}
