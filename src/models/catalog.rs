use serde::{Deserialize, Serialize};

/// One season listed by the catalog service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonEntry {
    pub season_number: u32,
}

/// One episode listed by the catalog service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeEntry {
    pub episode_number: u32,
}

// ============================================================================
// Catalog API Types
// ============================================================================

/// Raw response from GET /api/v1/media/getTitleSeasons
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTitleSeasonsResponse {
    #[serde(default)]
    pub title: Option<ApiSeasonsTitle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSeasonsTitle {
    #[serde(default)]
    pub episodes: Option<ApiSeasonsContainer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSeasonsContainer {
    #[serde(default)]
    pub seasons: Vec<ApiSeason>,
}

/// Season label as returned by the catalog, e.g. `"1"` or `"Unknown"`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSeason {
    pub value: String,
}

impl ApiTitleSeasonsResponse {
    /// Numbered seasons in ascending order; non-numeric and zero labels are skipped
    pub fn into_seasons(self) -> Vec<SeasonEntry> {
        let mut numbers: Vec<u32> = self
            .title
            .and_then(|t| t.episodes)
            .map(|e| e.seasons)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.value.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
            .into_iter()
            .map(|season_number| SeasonEntry { season_number })
            .collect()
    }
}

/// Raw response from GET /api/v1/media/getTitleEpisodes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTitleEpisodesResponse {
    #[serde(default)]
    pub title: Option<ApiEpisodesTitle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEpisodesTitle {
    #[serde(default)]
    pub episodes: Option<ApiEpisodesOuter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEpisodesOuter {
    #[serde(default)]
    pub episodes: Option<ApiEpisodeConnection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEpisodeConnection {
    #[serde(default)]
    pub edges: Vec<Option<ApiEpisodeEdge>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEpisodeEdge {
    pub position: u32,
}

impl ApiTitleEpisodesResponse {
    /// Episode numbers in ascending order, null edges and position 0 dropped
    pub fn into_episodes(self) -> Vec<EpisodeEntry> {
        let mut numbers: Vec<u32> = self
            .title
            .and_then(|t| t.episodes)
            .and_then(|e| e.episodes)
            .map(|c| c.edges)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|edge| edge.position)
            .filter(|n| *n > 0)
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
            .into_iter()
            .map(|episode_number| EpisodeEntry { episode_number })
            .collect()
    }
}
