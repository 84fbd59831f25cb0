use std::sync::Arc;

use crate::{models::EpisodeRef, services::catalog::CatalogService};

/// Result of enumerating a show, including which seasons could not be listed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowEpisodes {
    /// Season-major, ascending episode numbers within each season
    pub episodes: Vec<EpisodeRef>,
    /// Every season the catalog listed, ascending
    pub seasons: Vec<u32>,
    /// Seasons whose episode listing failed and contributed nothing
    pub failed_seasons: Vec<u32>,
}

impl ShowEpisodes {
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

/// Resolves the full episode list of a show from the catalog service
///
/// One "list seasons" call, then one "list episodes" call per season issued
/// concurrently. Never touches the Progress Store.
#[derive(Clone)]
pub struct EpisodeEnumerator {
    catalog: Arc<dyn CatalogService>,
}

impl EpisodeEnumerator {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    /// Every known episode of the show, plus which seasons were degraded
    ///
    /// A failed season listing yields an empty result. A failed episode
    /// listing only drops that season.
    pub async fn enumerate(&self, imdb_id: &str) -> ShowEpisodes {
        if imdb_id.trim().is_empty() {
            tracing::warn!("Enumeration requested for an empty IMDB ID");
            return ShowEpisodes::default();
        }

        let seasons = match self.catalog.list_seasons(imdb_id).await {
            Ok(seasons) => seasons,
            Err(e) => {
                tracing::warn!(imdb_id = %imdb_id, error = %e, "Season listing failed");
                return ShowEpisodes::default();
            }
        };

        let mut season_numbers: Vec<u32> = seasons
            .into_iter()
            .map(|s| s.season_number)
            .filter(|n| *n > 0)
            .collect();
        season_numbers.sort_unstable();
        season_numbers.dedup();

        if season_numbers.is_empty() {
            tracing::info!(imdb_id = %imdb_id, "Catalog lists no seasons");
            return ShowEpisodes::default();
        }

        let mut tasks = Vec::new();

        for season_number in season_numbers.iter().copied() {
            let catalog = Arc::clone(&self.catalog);
            let imdb_id = imdb_id.to_string();
            let task =
                tokio::spawn(async move { catalog.list_episodes(&imdb_id, season_number).await });
            tasks.push((season_number, task));
        }

        let mut episodes = Vec::new();
        let mut failed_seasons = Vec::new();

        // Awaiting in spawn order keeps the output season-major
        for (season_number, task) in tasks {
            match task.await {
                Ok(Ok(entries)) => {
                    let mut numbers: Vec<u32> = entries
                        .into_iter()
                        .map(|e| e.episode_number)
                        .filter(|n| *n > 0)
                        .collect();
                    numbers.sort_unstable();
                    numbers.dedup();
                    episodes.extend(
                        numbers
                            .into_iter()
                            .map(|n| EpisodeRef::new(season_number, n)),
                    );
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        imdb_id = %imdb_id,
                        season = season_number,
                        error = %e,
                        "Episode listing failed for season"
                    );
                    failed_seasons.push(season_number);
                }
                Err(e) => {
                    tracing::error!(season = season_number, error = %e, "Task join error");
                    failed_seasons.push(season_number);
                }
            }
        }

        if !failed_seasons.is_empty() {
            tracing::warn!(
                imdb_id = %imdb_id,
                failed = ?failed_seasons,
                listed = season_numbers.len(),
                "Partial episode enumeration"
            );
        }

        tracing::info!(
            imdb_id = %imdb_id,
            seasons = season_numbers.len(),
            episodes = episodes.len(),
            "Episodes enumerated"
        );

        ShowEpisodes {
            episodes,
            seasons: season_numbers,
            failed_seasons,
        }
    }
}
