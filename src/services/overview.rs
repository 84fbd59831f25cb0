use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{MovieProgress, ProgressOverview, TvShowProgress},
    services::progress_store::ProgressStore,
};

/// Latest server-side progress aggregate shared by the list screens
///
/// Title views call [`refetch`](Self::refetch) after each confirmed mutation
/// so home and liked lists see updated counts.
#[derive(Clone)]
pub struct OverviewRepository {
    store: Arc<dyn ProgressStore>,
    latest: Arc<RwLock<Option<ProgressOverview>>>,
}

impl OverviewRepository {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self {
            store,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Reads the aggregate from the server and replaces the held copy
    ///
    /// On failure the previous copy is kept.
    pub async fn refetch(&self) -> AppResult<ProgressOverview> {
        let overview = self.store.read_all().await?;
        *self.latest.write().await = Some(overview.clone());

        tracing::debug!(
            movies = overview.movies.len(),
            tv_shows = overview.tv_shows.len(),
            "Progress overview refreshed"
        );

        Ok(overview)
    }

    pub async fn tv_show(&self, imdb_id: &str) -> Option<TvShowProgress> {
        self.latest
            .read()
            .await
            .as_ref()
            .and_then(|o| o.tv_shows.iter().find(|s| s.imdb_id == imdb_id).cloned())
    }

    pub async fn movie(&self, imdb_id: &str) -> Option<MovieProgress> {
        self.latest
            .read()
            .await
            .as_ref()
            .and_then(|o| o.movies.iter().find(|m| m.imdb_id == imdb_id).cloned())
    }

    /// Shows that are started but not finished, the "continue watching" rail
    pub async fn in_progress_shows(&self) -> Vec<TvShowProgress> {
        self.latest
            .read()
            .await
            .as_ref()
            .map(|o| {
                o.tv_shows
                    .iter()
                    .filter(|s| s.is_in_progress())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
